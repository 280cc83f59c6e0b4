//! Demonstrates an authenticated REST session: every request carries freshly signed
//! `CB-ACCESS-*` headers, and a debug sink prints the redacted wire dump.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use coinbase_lib::{
	auth::Credentials,
	endpoint::ApiUrl,
	exchange::AuthSession,
	obs::DebugSink,
	session::SessionConfig,
};

struct StdoutSink;
impl DebugSink for StdoutSink {
	fn record(&self, session: &str, dump: &str) {
		println!("[{session}]\n{dump}");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let accounts_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/accounts")
				.header("cb-access-key", "demo-key")
				.header_exists("cb-access-sign")
				.header_exists("cb-access-timestamp")
				.header("cb-access-passphrase", "demo-passphrase");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"currency":"BTC","balance":"0.5"}]"#);
		})
		.await;
	let credentials = Credentials::new("demo-key", "demo-passphrase", "c3VwZXJzZWNyZXQ=")?;
	let base_url = ApiUrl::new(server.host()).with_protocol("http").with_port(server.port());
	let config = SessionConfig::default().with_name("signed-demo").with_debug(true);
	let session =
		AuthSession::with_base_url(base_url, credentials, config)?.with_debug_sink(StdoutSink);
	let accounts: serde_json::Value = session.get(["accounts"]).await?.json()?;

	println!("Accounts: {accounts}.");

	accounts_mock.assert_async().await;
	session.close();

	Ok(())
}
