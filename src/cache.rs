//! Response cache contracts and built-in TTL cache backends.
//!
//! Sessions consult a [`ResponseCache`] before sending `GET`/`HEAD` requests and store
//! successful (`200`) responses with an expiry derived from [`CacheConfig::expire`].
//! Keys are fingerprints of the method, URL, and body; auth headers never participate,
//! so re-signed retries of the same request share one entry.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// std
use std::path::{Path, PathBuf};
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, session::config::duration_secs};

/// Boxed future returned by [`ResponseCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage backend contract implemented by response caches.
pub trait ResponseCache
where
	Self: Send + Sync,
{
	/// Returns the entry for `key` when it has not expired at `now`.
	fn get<'a>(
		&'a self,
		key: &'a CacheKey,
		now: OffsetDateTime,
	) -> CacheFuture<'a, Option<CachedResponse>>;

	/// Stores or replaces the entry for `key`, evicting entries already expired at the new
	/// entry's `stored_at`.
	fn put(&self, key: CacheKey, response: CachedResponse) -> CacheFuture<'_, ()>;

	/// Drops entries that expired at `now`, returning how many were removed.
	fn purge_expired(&self, now: OffsetDateTime) -> CacheFuture<'_, usize>;

	/// Drops every entry.
	fn clear(&self) -> CacheFuture<'_, ()>;
}

/// Error type produced by [`ResponseCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Storage engine selected by [`CacheConfig`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
	/// Process-local map.
	#[default]
	Memory,
	/// JSON snapshot persisted next to `name`.
	File,
}

/// Response cache settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
	/// Cache name; the file backend stores its snapshot at `<name>.json`.
	pub name: String,
	/// Storage engine.
	#[serde(default)]
	pub backend: CacheBackend,
	/// Lifetime of stored responses.
	#[serde(default = "CacheConfig::default_expire", with = "duration_secs")]
	pub expire: Duration,
}
impl CacheConfig {
	/// Default entry lifetime (180 seconds).
	pub const DEFAULT_EXPIRE: Duration = Duration::seconds(180);

	/// Creates a config for `name` with the memory backend and the default lifetime.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), backend: CacheBackend::Memory, expire: Self::DEFAULT_EXPIRE }
	}

	/// File-backed exchange cache stored under `<root>/cache/exchange`.
	pub fn exchange_default(root: impl AsRef<Path>) -> Self {
		let name = root.as_ref().join("cache").join("exchange");

		Self::new(name.to_string_lossy()).with_backend(CacheBackend::File)
	}

	fn default_expire() -> Duration {
		Self::DEFAULT_EXPIRE
	}

	/// Overrides the storage engine.
	pub fn with_backend(mut self, backend: CacheBackend) -> Self {
		self.backend = backend;

		self
	}

	/// Overrides the entry lifetime.
	pub fn with_expire(mut self, expire: Duration) -> Self {
		self.expire = expire;

		self
	}

	/// Snapshot path used by [`CacheBackend::File`].
	pub fn file_path(&self) -> PathBuf {
		PathBuf::from(format!("{}.json", self.name))
	}

	/// Opens the configured backend.
	pub fn open(&self) -> Result<Arc<dyn ResponseCache>, CacheError> {
		Ok(match self.backend {
			CacheBackend::Memory => Arc::new(MemoryCache::default()),
			CacheBackend::File => Arc::new(FileCache::open(self.file_path())?),
		})
	}
}

/// Fingerprint identifying one cacheable request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);
impl CacheKey {
	/// Builds a key from the method, full URL, and optional body.
	///
	/// The key is a base64 (no padding) SHA-256 digest, so equal requests map to equal keys
	/// regardless of header order or signing time.
	pub fn new(method: &str, url: &Url, body: Option<&[u8]>) -> Self {
		let mut hasher = Sha256::new();

		hasher.update(method.to_ascii_uppercase().as_bytes());
		hasher.update(b" ");
		hasher.update(url.as_str().as_bytes());

		if let Some(body) = body.filter(|body| !body.is_empty()) {
			hasher.update(b"\n");
			hasher.update(body);
		}

		Self(STANDARD_NO_PAD.encode(hasher.finalize()))
	}

	/// Fingerprint text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Stored copy of a successful response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
	/// Final URL of the response.
	pub url: String,
	/// HTTP status code.
	pub status: u16,
	/// Response headers as `(name, value)` pairs.
	pub headers: Vec<(String, String)>,
	/// Response body.
	#[serde(with = "body_base64")]
	pub body: Vec<u8>,
	/// Instant the entry was stored.
	pub stored_at: OffsetDateTime,
	/// Instant after which the entry is ignored.
	pub expires_at: OffsetDateTime,
}
impl CachedResponse {
	/// Returns true once `now` reaches the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

mod body_base64 {
	// crates.io
	use base64::{Engine, engine::general_purpose::STANDARD};
	use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

	pub fn serialize<S>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&STANDARD.encode(body))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = String::deserialize(deserializer)?;

		STANDARD.decode(text).map_err(D::Error::custom)
	}
}
