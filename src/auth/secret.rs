//! Decoded API secret wrapper that redacts key material.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, error::ConfigError};

/// HMAC key decoded from the base64 API secret.
///
/// The secret is decoded exactly once, at construction. Only the raw key bytes are kept.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecret(Arc<[u8]>);
impl ApiSecret {
	/// Decodes a base64 API secret, failing immediately on malformed input.
	pub fn from_base64(encoded: impl AsRef<str>) -> Result<Self, ConfigError> {
		let bytes = STANDARD.decode(encoded.as_ref().trim())?;

		Ok(Self(bytes.into()))
	}

	/// Returns the raw key bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Re-encodes the key bytes as standard padded base64.
	pub fn to_base64(&self) -> String {
		STANDARD.encode(&self.0)
	}
}
impl Debug for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiSecret").field(&"<redacted>").finish()
	}
}
impl Display for ApiSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
