//! Demonstrates authenticating a feed subscription message for the sandbox WebSocket feed.

// crates.io
use color_eyre::Result;
use serde_json::json;
// self
use coinbase_lib::{
	auth::Credentials,
	exchange::{AuthSession, Environment},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let credentials = Credentials::new("demo-key", "demo-passphrase", "c3VwZXJzZWNyZXQ=")?;
	let auth = AuthSession::websocket(credentials);
	let mut message = json!({
		"type": "subscribe",
		"product_ids": ["BTC-USD"],
		"channels": ["user"],
	})
	.as_object()
	.cloned()
	.unwrap_or_default();

	auth.authenticate(&mut message)?;

	println!("Connect to {} and send:", Environment::Sandbox.websocket_url());
	println!("{}", serde_json::to_string_pretty(&message)?);

	Ok(())
}
