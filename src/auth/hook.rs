//! Transport-facing wrappers that apply the signing core with a fixed output shape.

// crates.io
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, SignatureHeaders, SignatureStyle},
	error::EncodingError,
	ext::RequestSigner,
};

/// REST authentication hook attaching `CB-ACCESS-*` headers to every request.
#[derive(Clone, Debug)]
pub struct SessionAuth(Arc<Credentials>);
impl SessionAuth {
	/// Wraps shared credentials.
	pub fn new(credentials: impl Into<Arc<Credentials>>) -> Self {
		Self(credentials.into())
	}

	/// Underlying credentials.
	pub fn credentials(&self) -> &Credentials {
		&self.0
	}

	/// Signs a REST request with a fresh timestamp.
	pub fn signature(
		&self,
		method: &str,
		path: &str,
		body: Option<&[u8]>,
	) -> Result<SignatureHeaders, EncodingError> {
		self.0.sign(SignatureStyle::Rest, method, path, body)
	}
}
impl RequestSigner for SessionAuth {
	fn sign_request(&self, method: &str, path: &str, body: Option<&[u8]>) -> Result<HeaderMap> {
		Ok(self.signature(method, path, body)?.to_header_map()?)
	}
}

/// WebSocket authentication helper producing lowercase auth parameters.
///
/// WebSocket auth never signs a body; only the method and path enter the pre-hash string.
#[derive(Clone, Debug)]
pub struct WsAuth(Arc<Credentials>);
impl WsAuth {
	/// Method signed by the exchange feed when authenticating a subscription.
	pub const VERIFY_METHOD: &'static str = "GET";
	/// Path signed by the exchange feed when authenticating a subscription.
	pub const VERIFY_PATH: &'static str = "/users/self/verify";

	/// Wraps shared credentials.
	pub fn new(credentials: impl Into<Arc<Credentials>>) -> Self {
		Self(credentials.into())
	}

	/// Underlying credentials.
	pub fn credentials(&self) -> &Credentials {
		&self.0
	}

	/// Returns the auth parameters for `method` and `path` with a fresh timestamp.
	pub fn signature(&self, method: &str, path: &str) -> Result<SignatureHeaders, EncodingError> {
		self.0.sign(SignatureStyle::WebSocket, method, path, None)
	}

	/// Signs `method` and `path` and merges the auth parameters into `params`.
	pub fn sign(
		&self,
		method: &str,
		path: &str,
		params: &mut Map<String, Value>,
	) -> Result<(), EncodingError> {
		self.signature(method, path)?.merge_into(params);

		Ok(())
	}

	/// Authenticates a feed subscription message in place.
	pub fn authenticate(&self, params: &mut Map<String, Value>) -> Result<(), EncodingError> {
		self.sign(Self::VERIFY_METHOD, Self::VERIFY_PATH, params)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::auth::{Timestamp, pre_hash, sign_message};

	fn credentials() -> Arc<Credentials> {
		Arc::new(
			Credentials::new("abc", "xyz", "c3VwZXJzZWNyZXQ=")
				.expect("Fixture credentials should be valid."),
		)
	}

	#[test]
	fn rest_hook_emits_verifiable_headers() {
		let auth = SessionAuth::new(credentials());
		let headers = auth
			.sign_request("get", "/accounts?limit=5", None)
			.expect("Signing a bodiless request should succeed.");
		let timestamp = headers["CB-ACCESS-TIMESTAMP"]
			.to_str()
			.expect("Timestamp header should be ASCII.")
			.to_owned();
		let message = pre_hash(&timestamp, "GET", "/accounts?limit=5", None)
			.expect("Fixture should encode.");

		assert_eq!(headers["CB-ACCESS-KEY"], "abc");
		assert_eq!(headers["CB-ACCESS-PASSPHRASE"], "xyz");
		assert_eq!(
			headers["CB-ACCESS-SIGN"],
			sign_message(auth.credentials().secret(), message.as_bytes()).as_str()
		);
	}

	#[test]
	fn rest_hook_surfaces_encoding_errors() {
		let auth = SessionAuth::new(credentials());
		let err = auth
			.sign_request("POST", "/orders", Some(&[0xc3, 0x28]))
			.expect_err("Non-UTF-8 bodies should fail to sign.");

		assert!(matches!(err, Error::Encoding(EncodingError::NonUtf8Body(_))));
	}

	#[test]
	fn websocket_sign_merges_lowercase_fields() {
		let auth = WsAuth::new(credentials());
		let mut params = json!({
			"type": "subscribe",
			"channels": ["user"],
		})
		.as_object()
		.cloned()
		.expect("Fixture should be a JSON object.");

		auth.authenticate(&mut params).expect("WebSocket signing should succeed.");

		let timestamp = params["timestamp"].as_str().expect("Timestamp should be a string.");
		let message = pre_hash(timestamp, "GET", "/users/self/verify", None)
			.expect("Fixture should encode.");

		assert_eq!(params["key"], "abc");
		assert_eq!(params["passphrase"], "xyz");
		assert_eq!(
			params["signature"],
			sign_message(auth.credentials().secret(), message.as_bytes())
		);
		assert_eq!(params["type"], "subscribe");
		assert!(!params.contains_key("CB-ACCESS-SIGN"));
	}

	#[test]
	fn fresh_timestamps_are_parsable() {
		let auth = WsAuth::new(credentials());
		let signature =
			auth.signature("GET", "/users/self/verify").expect("Signing should succeed.");
		let secs: f64 = signature.timestamp.parse().expect("Timestamp text should parse as f64.");

		assert!(secs >= Timestamp::from_secs(1_700_000_000.).as_secs());
	}
}
