//! Demonstrates a public (unsigned) session with a file-backed response cache: the second
//! request is answered from `<root>/cache/exchange.json` without touching the network.

// std
use std::env;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
// self
use coinbase_lib::{
	cache::CacheConfig,
	endpoint::ApiUrl,
	session::{Session, SessionConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let ticker_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/BTC-USD/ticker");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"price":"37000.01","volume":"1234.5"}"#);
		})
		.await;
	let root = env::temp_dir().join("coinbase-lib-demo");
	let cache = CacheConfig::exchange_default(&root).with_expire(Duration::seconds(30));
	let config = SessionConfig::default().with_cache(cache.clone()).with_retries(2, 0.5);
	let session = Session::new(config)?
		.with_base_url(ApiUrl::new(server.host()).with_protocol("http").with_port(server.port()));

	for round in 1..=2 {
		let response = session.get(["products", "BTC-USD", "ticker"]).await?;

		println!("Round {round}: {} (cached: {}).", response.text(), response.from_cache());
	}

	if let Some(store) = session.cache() {
		store.clear().await?;
	}

	println!("Snapshot lived at {}.", cache.file_path().display());

	ticker_mock.assert_calls_async(1).await;

	Ok(())
}
