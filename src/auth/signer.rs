//! HMAC-SHA256 signing core shared by REST and WebSocket authentication.
//!
//! Both transports sign the same pre-hash string,
//! `timestamp + METHOD + path [+ body]`, with the decoded API secret. They only differ in
//! the field names used to deliver the result, which [`SignatureStyle`] captures.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{ApiSecret, Credentials, Timestamp},
	error::EncodingError,
};

type HmacSha256 = Hmac<Sha256>;

/// Output shape for a computed signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureStyle {
	/// `CB-ACCESS-*` HTTP headers attached to REST requests.
	Rest,
	/// Lowercase parameters merged into a WebSocket subscribe message.
	WebSocket,
}
impl SignatureStyle {
	/// Field names in `[key, signature, timestamp, passphrase]` order.
	pub const fn field_names(self) -> [&'static str; 4] {
		match self {
			SignatureStyle::Rest => [
				"CB-ACCESS-KEY",
				"CB-ACCESS-SIGN",
				"CB-ACCESS-TIMESTAMP",
				"CB-ACCESS-PASSPHRASE",
			],
			SignatureStyle::WebSocket => ["key", "signature", "timestamp", "passphrase"],
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureStyle::Rest => "rest",
			SignatureStyle::WebSocket => "websocket",
		}
	}
}
impl Display for SignatureStyle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// The four authentication fields produced for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
	/// Output shape controlling field names.
	pub style: SignatureStyle,
	/// API key.
	pub key: String,
	/// Base64 HMAC-SHA256 signature.
	pub signature: String,
	/// Timestamp text used in the pre-hash string.
	pub timestamp: String,
	/// API passphrase.
	pub passphrase: String,
}
impl SignatureHeaders {
	/// Yields `(field_name, value)` pairs in key, signature, timestamp, passphrase order.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		let [key, signature, timestamp, passphrase] = self.style.field_names();

		[
			(key, self.key.as_str()),
			(signature, self.signature.as_str()),
			(timestamp, self.timestamp.as_str()),
			(passphrase, self.passphrase.as_str()),
		]
		.into_iter()
	}

	/// Looks up a value by its styled field name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.iter().find(|(field, _)| field.eq_ignore_ascii_case(name)).map(|(_, value)| value)
	}

	/// Converts the fields into HTTP headers.
	pub fn to_header_map(&self) -> Result<HeaderMap, EncodingError> {
		let mut headers = HeaderMap::with_capacity(4);

		for (field, value) in self.iter() {
			let value = HeaderValue::from_str(value)
				.map_err(|_| EncodingError::HeaderValue { field })?;
			let name = HeaderName::from_bytes(field.as_bytes())
				.map_err(|_| EncodingError::HeaderValue { field })?;

			headers.insert(name, value);
		}

		Ok(headers)
	}

	/// Merges the fields into a JSON parameter map, replacing existing entries.
	pub fn merge_into(&self, params: &mut Map<String, Value>) {
		for (field, value) in self.iter() {
			params.insert(field.to_owned(), Value::String(value.to_owned()));
		}
	}
}
impl Debug for SignatureHeaders {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignatureHeaders")
			.field("style", &self.style)
			.field("key", &self.key)
			.field("signature", &self.signature)
			.field("timestamp", &self.timestamp)
			.field("passphrase", &"<redacted>")
			.finish()
	}
}

/// Builds the exact text that gets signed.
///
/// The method is uppercased, the path is used verbatim (leading slash and query included),
/// and the body is appended only when present. An empty body and a missing body produce
/// identical text.
pub fn pre_hash(
	timestamp: &str,
	method: &str,
	path: &str,
	body: Option<&[u8]>,
) -> Result<String, EncodingError> {
	let body = match body {
		Some(bytes) => std::str::from_utf8(bytes)?,
		None => "",
	};
	let mut message =
		String::with_capacity(timestamp.len() + method.len() + path.len() + body.len());

	message.push_str(timestamp);
	message.push_str(&method.to_ascii_uppercase());
	message.push_str(path);
	message.push_str(body);

	Ok(message)
}

/// Computes `base64(HMAC-SHA256(secret, message))`.
pub fn sign_message(secret: &ApiSecret, message: &[u8]) -> String {
	let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.expose())
		.unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length."));

	mac.update(message);

	STANDARD.encode(mac.finalize().into_bytes())
}

impl Credentials {
	/// Signs a request with a fresh timestamp taken from the wall clock.
	pub fn sign(
		&self,
		style: SignatureStyle,
		method: &str,
		path: &str,
		body: Option<&[u8]>,
	) -> Result<SignatureHeaders, EncodingError> {
		self.sign_at(style, Timestamp::now(), method, path, body)
	}

	/// Signs a request at a caller-supplied timestamp.
	pub fn sign_at(
		&self,
		style: SignatureStyle,
		timestamp: Timestamp,
		method: &str,
		path: &str,
		body: Option<&[u8]>,
	) -> Result<SignatureHeaders, EncodingError> {
		let timestamp = timestamp.to_string();
		let message = pre_hash(&timestamp, method, path, body)?;
		let signature = sign_message(self.secret(), message.as_bytes());

		Ok(SignatureHeaders {
			style,
			key: self.key().to_owned(),
			signature,
			timestamp,
			passphrase: self.passphrase().to_owned(),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const SECRET: &str = "c3VwZXJzZWNyZXQ=";
	const ACCOUNTS_SIGNATURE: &str = "Re+7KCJB1yv1gCR8YRx/b8suTEblDzeOALtekeBzSjA=";

	fn credentials() -> Credentials {
		Credentials::new("abc", "xyz", SECRET).expect("Fixture credentials should be valid.")
	}

	#[test]
	fn pre_hash_concatenates_without_separators() {
		let message = pre_hash("1700000000.0", "get", "/accounts", None)
			.expect("ASCII inputs should always encode.");

		assert_eq!(message, "1700000000.0GET/accounts");

		let message = pre_hash(
			"1700000000.5",
			"post",
			"/orders?client=1",
			Some(br#"{"size":"0.01"}"#),
		)
		.expect("UTF-8 bodies should encode.");

		assert_eq!(message, r#"1700000000.5POST/orders?client=1{"size":"0.01"}"#);
	}

	#[test]
	fn empty_and_missing_bodies_hash_identically() {
		let missing = pre_hash("1.5", "GET", "/time", None).expect("Missing body should encode.");
		let empty = pre_hash("1.5", "GET", "/time", Some(b"")).expect("Empty body should encode.");

		assert_eq!(missing, empty);
	}

	#[test]
	fn non_utf8_bodies_are_rejected() {
		let err = pre_hash("1.0", "POST", "/orders", Some(&[0xff, 0xfe]))
			.expect_err("Invalid UTF-8 cannot be signed.");

		assert!(matches!(err, EncodingError::NonUtf8Body(_)));
	}

	#[test]
	fn known_answer_signature() {
		let headers = credentials()
			.sign_at(
				SignatureStyle::Rest,
				Timestamp::from_secs(1_700_000_000.),
				"GET",
				"/accounts",
				None,
			)
			.expect("Signing the fixture should succeed.");

		assert_eq!(headers.timestamp, "1700000000.0");
		assert_eq!(headers.signature, ACCOUNTS_SIGNATURE);
		assert_eq!(headers.key, "abc");
		assert_eq!(headers.passphrase, "xyz");
	}

	#[test]
	fn known_answer_signature_with_body() {
		let headers = credentials()
			.sign_at(
				SignatureStyle::Rest,
				Timestamp::from_secs(1_700_000_000.5),
				"POST",
				"/orders",
				Some(br#"{"size":"0.01"}"#),
			)
			.expect("Signing the fixture should succeed.");

		assert_eq!(headers.signature, "XLN1QC7Jb51IzubQwfgQ/wQIeI3LJyYy98jpX8b1y54=");
	}

	#[test]
	fn styles_share_signature_but_not_field_names() {
		let credentials = credentials();
		let timestamp = Timestamp::from_secs(1_700_000_000.123456);
		let rest = credentials
			.sign_at(SignatureStyle::Rest, timestamp, "GET", "/users/self/verify", None)
			.expect("REST signing should succeed.");
		let ws = credentials
			.sign_at(SignatureStyle::WebSocket, timestamp, "GET", "/users/self/verify", None)
			.expect("WebSocket signing should succeed.");

		assert_eq!(rest.signature, ws.signature);
		assert_eq!(rest.signature, "7c5EHLWV153MZ6JfDlXySj/CHkLhF9EeWHQC4BK+UHc=");
		assert_eq!(rest.get("CB-ACCESS-SIGN"), Some(rest.signature.as_str()));
		assert_eq!(ws.get("signature"), Some(ws.signature.as_str()));
		assert_eq!(rest.get("signature"), None);
		assert_eq!(ws.get("CB-ACCESS-SIGN"), None);
	}

	#[test]
	fn header_map_carries_all_rest_fields() {
		let headers = credentials()
			.sign_at(
				SignatureStyle::Rest,
				Timestamp::from_secs(1_700_000_000.),
				"GET",
				"/accounts",
				None,
			)
			.expect("Signing the fixture should succeed.")
			.to_header_map()
			.expect("Fixture values are valid header text.");

		assert_eq!(headers.len(), 4);
		assert_eq!(headers["CB-ACCESS-KEY"], "abc");
		assert_eq!(headers["CB-ACCESS-SIGN"], ACCOUNTS_SIGNATURE);
		assert_eq!(headers["CB-ACCESS-TIMESTAMP"], "1700000000.0");
		assert_eq!(headers["CB-ACCESS-PASSPHRASE"], "xyz");
	}

	#[test]
	fn merge_replaces_existing_params() {
		let mut params = Map::new();

		params.insert("type".into(), Value::String("subscribe".into()));
		params.insert("signature".into(), Value::String("stale".into()));
		credentials()
			.sign_at(
				SignatureStyle::WebSocket,
				Timestamp::from_secs(1_700_000_000.),
				"GET",
				"/accounts",
				None,
			)
			.expect("Signing the fixture should succeed.")
			.merge_into(&mut params);

		assert_eq!(params.len(), 5);
		assert_eq!(params["signature"], ACCOUNTS_SIGNATURE);
		assert_eq!(params["timestamp"], "1700000000.0");
		assert_eq!(params["type"], "subscribe");
	}

	#[test]
	fn secrets_longer_than_a_block_still_sign() {
		let secret = ApiSecret::from_base64(STANDARD.encode([7_u8; 200]))
			.expect("Long fixture secret should decode.");
		let signature = sign_message(&secret, b"1700000000.0GET/accounts");
		let digest = STANDARD.decode(&signature).expect("Signature should be base64.");

		assert_eq!(digest.len(), 32);
		assert_eq!(signature, sign_message(&secret, b"1700000000.0GET/accounts"));
	}

	#[test]
	fn debug_redacts_passphrase() {
		let headers = credentials()
			.sign_at(SignatureStyle::Rest, Timestamp::from_secs(1.), "GET", "/", None)
			.expect("Signing the fixture should succeed.");

		assert!(!format!("{headers:?}").contains("xyz"));
	}
}
