//! Long-lived API credentials used to sign every request.

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{_prelude::*, auth::ApiSecret, error::ConfigError};

/// API key, passphrase, and decoded secret.
///
/// Immutable after construction and safe to share across tasks without locking.
#[derive(Clone)]
pub struct Credentials {
	key: String,
	passphrase: String,
	secret: ApiSecret,
}
impl Credentials {
	/// Validates the key and passphrase and decodes the base64 secret.
	///
	/// Fails with [`ConfigError::InvalidSecret`] on malformed base64 so no signature can ever be
	/// produced from a bad secret.
	pub fn new(
		key: impl Into<String>,
		passphrase: impl Into<String>,
		secret: impl AsRef<str>,
	) -> Result<Self, ConfigError> {
		let key = key.into();
		let passphrase = passphrase.into();

		validate_header_text("key", &key)?;
		validate_header_text("passphrase", &passphrase)?;

		let secret = ApiSecret::from_base64(secret)?;

		Ok(Self { key, passphrase, secret })
	}

	/// API key (safe to log).
	pub fn key(&self) -> &str {
		&self.key
	}

	/// API passphrase. Callers must avoid logging it.
	pub fn passphrase(&self) -> &str {
		&self.passphrase
	}

	/// Decoded HMAC key.
	pub fn secret(&self) -> &ApiSecret {
		&self.secret
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("key", &self.key)
			.field("passphrase", &"<redacted>")
			.field("secret", &self.secret)
			.finish()
	}
}

fn validate_header_text(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if HeaderValue::from_str(value).is_ok() {
		Ok(())
	} else {
		Err(ConfigError::InvalidCredential { field })
	}
}
