//! Coinbase Exchange environments and the authenticated session constructor.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, SessionAuth, WsAuth},
	endpoint::ApiUrl,
	session::{Session, SessionConfig},
};

/// Deployment targeted by a session or feed connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	/// Live exchange.
	#[default]
	Production,
	/// Public sandbox.
	Sandbox,
}
impl Environment {
	/// REST API host name.
	pub const fn rest_host(self) -> &'static str {
		match self {
			Environment::Production => "api.exchange.coinbase.com",
			Environment::Sandbox => "api-public.sandbox.exchange.coinbase.com",
		}
	}

	/// WebSocket feed host name.
	pub const fn websocket_host(self) -> &'static str {
		match self {
			Environment::Production => "ws-feed.exchange.coinbase.com",
			Environment::Sandbox => "ws-feed-public.sandbox.exchange.coinbase.com",
		}
	}

	/// REST base URL.
	pub fn rest_url(self) -> ApiUrl {
		ApiUrl::new(self.rest_host())
	}

	/// WebSocket feed URL.
	pub fn websocket_url(self) -> ApiUrl {
		ApiUrl::new(self.websocket_host()).with_protocol("wss")
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Production => "production",
			Environment::Sandbox => "sandbox",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Constructors for sessions that sign every request with exchange credentials.
#[derive(Clone, Copy, Debug)]
pub struct AuthSession;
impl AuthSession {
	/// Builds a session bound to `environment`'s REST URL with [`SessionAuth`] attached.
	#[allow(clippy::new_ret_no_self)]
	pub fn new(
		environment: Environment,
		credentials: impl Into<Arc<Credentials>>,
		config: SessionConfig,
	) -> Result<Session> {
		Self::with_base_url(environment.rest_url(), credentials, config)
	}

	/// Builds an authenticated session against an arbitrary base URL.
	pub fn with_base_url(
		base_url: ApiUrl,
		credentials: impl Into<Arc<Credentials>>,
		config: SessionConfig,
	) -> Result<Session> {
		Ok(Session::new(config)?.with_base_url(base_url).with_signer(SessionAuth::new(credentials)))
	}

	/// WebSocket auth helper sharing the same credentials.
	pub fn websocket(credentials: impl Into<Arc<Credentials>>) -> WsAuth {
		WsAuth::new(credentials)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn environments_map_to_exchange_hosts() {
		assert_eq!(Environment::default(), Environment::Production);
		assert_eq!(Environment::Production.rest_url().base(), "https://api.exchange.coinbase.com");
		assert_eq!(
			Environment::Sandbox.rest_url().base(),
			"https://api-public.sandbox.exchange.coinbase.com"
		);
		assert_eq!(
			Environment::Production.websocket_url().base(),
			"wss://ws-feed.exchange.coinbase.com"
		);
		assert_eq!(
			Environment::Sandbox.websocket_url().base(),
			"wss://ws-feed-public.sandbox.exchange.coinbase.com"
		);
	}

	#[test]
	fn environment_deserializes_from_lowercase() {
		let environment: Environment =
			serde_json::from_str("\"sandbox\"").expect("Environment label should deserialize.");

		assert_eq!(environment, Environment::Sandbox);
		assert_eq!(environment.to_string(), "sandbox");
	}

	#[test]
	fn auth_session_binds_environment_and_signer() {
		let credentials = Credentials::new("abc", "xyz", "c3VwZXJzZWNyZXQ=")
			.expect("Fixture credentials should be valid.");
		let session =
			AuthSession::new(Environment::Sandbox, credentials, SessionConfig::default())
				.expect("Authenticated session should build.");

		assert_eq!(session.base_url(), Some(&Environment::Sandbox.rest_url()));
		assert!(format!("{session:?}").contains("signed: true"));
	}
}
