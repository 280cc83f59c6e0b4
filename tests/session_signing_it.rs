// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use coinbase_lib::{
	_preludet::*,
	auth::{SignatureStyle, Timestamp, pre_hash, sign_message},
	session::SessionConfig,
};

const EPOCH: f64 = 1_700_000_000.;

#[tokio::test]
async fn fixed_clock_get_carries_known_answer_headers() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/accounts")
				.header("cb-access-key", TEST_KEY)
				.header("cb-access-passphrase", TEST_PASSPHRASE)
				.header("cb-access-timestamp", "1700000000.0")
				.header("cb-access-sign", "Re+7KCJB1yv1gCR8YRx/b8suTEblDzeOALtekeBzSjA=")
				.header("accept", "application/json")
				.header("accept-charset", "UTF-8");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let signer = FixedClockSigner::new(EPOCH);
	let session =
		test_session(SessionConfig::default(), server.address()).with_signer(signer.clone());
	let response = session.get(["accounts"]).await.expect("Signed GET should succeed.");

	mock.assert_async().await;

	assert_eq!(response.text(), "[]");
	assert_eq!(signer.calls(), 1);
}

#[tokio::test]
async fn query_strings_are_part_of_the_signed_path() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/accounts")
				.query_param("limit", "5")
				.header("cb-access-sign", "J5oVnqszbwFlgCKyWNNJ1DtINWOx0c2VA7GKD1DiAx8=");
			then.status(200).body("[]");
		})
		.await;
	let session = test_session(SessionConfig::default(), server.address())
		.with_signer(FixedClockSigner::new(EPOCH));

	session
		.get_with_query(["accounts"], [("limit", 5)])
		.await
		.expect("Signed GET with query should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn post_bodies_are_signed_verbatim() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/orders")
				.header("content-type", "application/json")
				.header("cb-access-timestamp", "1700000000.5")
				.header("cb-access-sign", "XLN1QC7Jb51IzubQwfgQ/wQIeI3LJyYy98jpX8b1y54=")
				.body(r#"{"size":"0.01"}"#);
			then.status(200).body(r#"{"id":"order-1"}"#);
		})
		.await;
	let session = test_session(SessionConfig::default(), server.address())
		.with_signer(FixedClockSigner::new(1_700_000_000.5));
	let response = session
		.post(["orders"], &json!({ "size": "0.01" }))
		.await
		.expect("Signed POST should succeed.");
	let order: serde_json::Value = response.json().expect("Order payload should decode.");

	mock.assert_async().await;

	assert_eq!(order["id"], "order-1");
}

#[tokio::test]
async fn wall_clock_signatures_verify_against_their_timestamp() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/orders/order-1")
				.header_exists("cb-access-sign")
				.header_exists("cb-access-timestamp")
				.header("cb-access-key", TEST_KEY);
			then.status(200).body("[\"order-1\"]");
		})
		.await;
	let recorder = RecordingSink::default();
	let session = test_signed_session(SessionConfig::default().with_debug(true), server.address())
		.with_debug_sink(recorder.clone());

	session.delete(["orders", "order-1"]).await.expect("Signed DELETE should succeed.");
	mock.assert_async().await;

	let dumps = recorder.dumps();
	let (name, dump) = dumps.first().expect("Debug sessions should record a dump.");
	let timestamp = dump
		.lines()
		.find_map(|line| line.strip_prefix("< cb-access-timestamp: "))
		.expect("Dump should include the signing timestamp.");
	let credentials = test_credentials();
	let message = pre_hash(timestamp, "DELETE", "/orders/order-1", None)
		.expect("Fixture request should encode.");
	let expected = sign_message(credentials.secret(), message.as_bytes());
	let resigned = credentials
		.sign_at(
			SignatureStyle::Rest,
			Timestamp::from_secs(timestamp.parse().expect("Timestamp header should be numeric.")),
			"DELETE",
			"/orders/order-1",
			None,
		)
		.expect("Fixture request should sign.");

	assert_eq!(name, "coinbase-lib");
	assert_eq!(resigned.signature, expected);
	assert!(dump.contains("< cb-access-sign: <redacted>"));
	assert!(!dump.contains(&expected));
}
