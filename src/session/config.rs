//! Session-wide policy: timeout, retries, caching, debug dumps, and default headers.

// crates.io
use reqwest::{
	Method, StatusCode,
	header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, cache::CacheConfig, error::ConfigError};

/// Connection-level policy applied by a [`Session`](crate::session::Session).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	/// Name used for spans and debug dumps.
	pub name: String,
	/// Per-attempt timeout.
	#[serde(with = "duration_secs")]
	pub timeout: Duration,
	/// Maximum number of retries after the first attempt.
	pub retries: u32,
	/// Exponential backoff factor in seconds.
	pub backoff: f64,
	/// Optional response cache.
	pub cache: Option<CacheConfig>,
	/// Emits a wire dump of every request chain when enabled.
	pub debug: bool,
	/// Headers sent with every request; auth headers override them.
	pub headers: BTreeMap<String, String>,
}
impl SessionConfig {
	/// Default session name.
	pub const DEFAULT_NAME: &'static str = "coinbase-lib";
	/// Default per-attempt timeout (30 seconds).
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);
	/// Default retry count.
	pub const DEFAULT_RETRIES: u32 = 3;
	/// Default backoff factor.
	pub const DEFAULT_BACKOFF: f64 = 1.;

	/// Overrides the session name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the retry count and backoff factor.
	pub fn with_retries(mut self, retries: u32, backoff: f64) -> Self {
		self.retries = retries;
		self.backoff = backoff;

		self
	}

	/// Enables response caching.
	pub fn with_cache(mut self, cache: CacheConfig) -> Self {
		self.cache = Some(cache);

		self
	}

	/// Toggles debug dumps.
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Adds or replaces a default header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Retry policy derived from `retries` and `backoff`.
	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy { total: self.retries, backoff_factor: self.backoff }
	}

	/// Converts the timeout into the transport's representation.
	pub fn std_timeout(&self) -> Result<std::time::Duration, ConfigError> {
		if !self.timeout.is_positive() {
			return Err(ConfigError::InvalidDuration { field: "timeout" });
		}

		std::time::Duration::try_from(self.timeout)
			.map_err(|_| ConfigError::InvalidDuration { field: "timeout" })
	}

	/// Validates and converts the default headers.
	pub fn header_map(&self) -> Result<HeaderMap, ConfigError> {
		let mut map = HeaderMap::with_capacity(self.headers.len());

		for (name, value) in &self.headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			map.insert(header_name, header_value);
		}

		Ok(map)
	}

	fn default_headers() -> BTreeMap<String, String> {
		[
			("Accept", "application/json"),
			("Accept-Charset", "UTF-8"),
			("Content-Type", "application/json"),
		]
		.into_iter()
		.map(|(name, value)| (name.to_owned(), value.to_owned()))
		.collect()
	}
}
impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			name: Self::DEFAULT_NAME.into(),
			timeout: Self::DEFAULT_TIMEOUT,
			retries: Self::DEFAULT_RETRIES,
			backoff: Self::DEFAULT_BACKOFF,
			cache: None,
			debug: false,
			headers: Self::default_headers(),
		}
	}
}

/// Retry budget with exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
	/// Maximum number of retries; `0` disables retrying.
	pub total: u32,
	/// Backoff factor in seconds.
	pub backoff_factor: f64,
}
impl RetryPolicy {
	/// Upper bound for a computed backoff delay.
	pub const MAX_BACKOFF: Duration = Duration::seconds(120);
	/// Statuses retried when the server supplies `Retry-After`.
	pub const RETRY_AFTER_STATUSES: [StatusCode; 3] = [
		StatusCode::PAYLOAD_TOO_LARGE,
		StatusCode::TOO_MANY_REQUESTS,
		StatusCode::SERVICE_UNAVAILABLE,
	];

	/// Delay before retry number `retry` (1-based).
	///
	/// The first retry is immediate; retry `n` waits `backoff_factor * 2^(n-1)` seconds,
	/// capped at [`MAX_BACKOFF`](Self::MAX_BACKOFF).
	pub fn delay_for(&self, retry: u32) -> Duration {
		if retry <= 1 || !self.backoff_factor.is_finite() || self.backoff_factor <= 0. {
			return Duration::ZERO;
		}

		let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
		let secs = self.backoff_factor * 2_f64.powi(exponent);

		if secs >= Self::MAX_BACKOFF.as_seconds_f64() {
			Self::MAX_BACKOFF
		} else {
			Duration::seconds_f64(secs)
		}
	}

	/// Returns true when `retries_done` still leaves room for another attempt.
	pub fn has_budget(&self, retries_done: u32) -> bool {
		retries_done < self.total
	}

	/// Returns true when a response with `status` and `retry_after` should be retried.
	pub fn retries_status(&self, status: StatusCode, retry_after: Option<Duration>) -> bool {
		retry_after.is_some() && Self::RETRY_AFTER_STATUSES.contains(&status)
	}

	/// Reads a `Retry-After` hint given either as seconds or as an HTTP date.
	pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
		let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

		if let Ok(secs) = raw.parse::<u32>() {
			return Some(Duration::seconds(i64::from(secs)));
		}
		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			return Some(if delta.is_positive() { delta } else { Duration::ZERO });
		}

		None
	}

	/// Returns true for methods safe to resend after a partially delivered attempt.
	pub fn is_idempotent(method: &Method) -> bool {
		matches!(
			*method,
			Method::GET
				| Method::HEAD | Method::PUT
				| Method::DELETE | Method::OPTIONS
				| Method::TRACE
		)
	}
}

/// Serializes [`Duration`] as (possibly fractional) seconds.
pub(crate) mod duration_secs {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
	use time::Duration;

	const MAX_SECS: f64 = 1e12;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		if duration.subsec_nanoseconds() == 0 {
			serializer.serialize_i64(duration.whole_seconds())
		} else {
			serializer.serialize_f64(duration.as_seconds_f64())
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = f64::deserialize(deserializer)?;

		if !secs.is_finite() || !(0. ..MAX_SECS).contains(&secs) {
			return Err(D::Error::custom(format!("{secs} is not a valid number of seconds")));
		}

		Ok(Duration::seconds_f64(secs))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = SessionConfig::default();

		assert_eq!(config.name, "coinbase-lib");
		assert_eq!(config.timeout, Duration::seconds(30));
		assert_eq!(config.retries, 3);
		assert_eq!(config.backoff, 1.);
		assert!(config.cache.is_none());
		assert!(!config.debug);

		let headers = config.header_map().expect("Default headers should be valid.");

		assert_eq!(headers["accept"], "application/json");
		assert_eq!(headers["content-type"], "application/json");
		assert_eq!(headers["accept-charset"], "UTF-8");
	}

	#[test]
	fn partial_config_deserializes_with_defaults() {
		let config: SessionConfig = serde_json::from_str(
			r#"{"timeout":2.5,"retries":0,"cache":{"name":"/tmp/exchange","expire":60}}"#,
		)
		.expect("Partial session config should deserialize.");

		assert_eq!(config.timeout, Duration::milliseconds(2_500));
		assert_eq!(config.retries, 0);
		assert_eq!(config.backoff, 1.);
		assert_eq!(config.cache.map(|cache| cache.expire), Some(Duration::seconds(60)));

		let err = serde_json::from_str::<SessionConfig>(r#"{"timeout":-1}"#)
			.expect_err("Negative timeouts must be rejected.");

		assert!(err.to_string().contains("seconds"));
	}

	#[test]
	fn timeout_and_headers_are_validated() {
		let config = SessionConfig::default().with_timeout(Duration::ZERO);

		assert!(matches!(
			config.std_timeout(),
			Err(ConfigError::InvalidDuration { field: "timeout" })
		));

		let config = SessionConfig::default().with_header("bad header", "x");

		assert!(matches!(config.header_map(), Err(ConfigError::InvalidHeader { .. })));
	}

	#[test]
	fn backoff_grows_exponentially_after_first_retry() {
		let policy = SessionConfig::default().retry_policy();

		assert_eq!(policy.delay_for(1), Duration::ZERO);
		assert_eq!(policy.delay_for(2), Duration::seconds(2));
		assert_eq!(policy.delay_for(3), Duration::seconds(4));
		assert_eq!(policy.delay_for(10), RetryPolicy::MAX_BACKOFF);

		let policy = RetryPolicy { total: 3, backoff_factor: 0. };

		assert_eq!(policy.delay_for(3), Duration::ZERO);
	}

	#[test]
	fn retry_after_statuses_need_the_header() {
		let policy = SessionConfig::default().retry_policy();
		let hint = Some(Duration::seconds(1));

		assert!(policy.retries_status(StatusCode::TOO_MANY_REQUESTS, hint));
		assert!(policy.retries_status(StatusCode::SERVICE_UNAVAILABLE, hint));
		assert!(!policy.retries_status(StatusCode::TOO_MANY_REQUESTS, None));
		assert!(!policy.retries_status(StatusCode::INTERNAL_SERVER_ERROR, hint));
		assert!(policy.has_budget(2));
		assert!(!policy.has_budget(3));
		assert!(RetryPolicy::is_idempotent(&Method::DELETE));
		assert!(!RetryPolicy::is_idempotent(&Method::POST));
	}

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let mut headers = HeaderMap::new();

		assert_eq!(RetryPolicy::retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

		assert_eq!(RetryPolicy::retry_after(&headers), Some(Duration::seconds(7)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(RetryPolicy::retry_after(&headers), Some(Duration::ZERO));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(RetryPolicy::retry_after(&headers), None);
	}
}
