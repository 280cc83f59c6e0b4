// std
use std::net::TcpListener;
// crates.io
use httpmock::prelude::*;
// self
use coinbase_lib::{
	_preludet::*,
	error::TransportError,
	reqwest::Method as HttpMethod,
	session::{Session, SessionConfig},
};

fn fast_retries(retries: u32) -> SessionConfig {
	SessionConfig::default().with_retries(retries, 0.)
}

#[tokio::test]
async fn retry_after_statuses_are_retried_and_resigned() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/products").header_exists("cb-access-sign");
			then.status(503).header("retry-after", "0").body("busy");
		})
		.await;
	let signer = FixedClockSigner::new(1_700_000_000.);
	let session = test_session(fast_retries(2), server.address()).with_signer(signer.clone());
	let err = session.get(["products"]).await.expect_err("Persistent 503s should surface.");

	mock.assert_calls_async(3).await;

	assert_eq!(err.status(), Some(503));
	assert_eq!(signer.calls(), 3);
}

#[tokio::test]
async fn rate_limits_without_retry_after_are_not_retried() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/products");
			then.status(429).body("slow down");
		})
		.await;
	let session = test_session(fast_retries(3), server.address());
	let err = session.get(["products"]).await.expect_err("429 should surface.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::HttpStatus { status: 429, ref body, .. } if body == "slow down"));
}

#[tokio::test]
async fn zero_retries_sends_once() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/time");
			then.status(503).header("retry-after", "0");
		})
		.await;
	let session = test_session(fast_retries(0), server.address());
	let request =
		session.request(HttpMethod::GET, ["time"]).expect("Mock URL should parse.");
	let response =
		session.execute(request).await.expect("Raw execution returns non-success responses.");

	mock.assert_calls_async(1).await;

	assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn connection_failures_are_retried_with_fresh_signatures() {
	let address = {
		let listener =
			TcpListener::bind("127.0.0.1:0").expect("Ephemeral port should be available.");

		listener.local_addr().expect("Bound listener should report its address.")
	};
	let signer = FixedClockSigner::new(1_700_000_000.);
	let session = Session::with_http_client(fast_retries(2), test_reqwest_client())
		.expect("Session should build.")
		.with_base_url(mock_base_url(&address))
		.with_signer(signer.clone());
	let err = session
		.post(["orders"], &serde_json::json!({ "size": "0.01" }))
		.await
		.expect_err("Closed ports should fail.");

	assert!(matches!(err, Error::Transport(TransportError::Connect { .. })));
	assert_eq!(signer.calls(), 3);
}
