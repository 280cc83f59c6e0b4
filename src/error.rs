//! Crate-level error types shared across signing, sessions, and caches.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Response cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request data could not be encoded for signing.
	#[error(transparent)]
	Encoding(#[from] EncodingError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Server answered with a non-success status code.
	#[error("Request to {url} failed with HTTP status {status}.")]
	HttpStatus {
		/// HTTP status code returned by the server.
		status: u16,
		/// Final URL of the request.
		url: String,
		/// Response body, decoded lossily.
		body: String,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure pointing at the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status code carried by [`Error::HttpStatus`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised at construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// API secret is not valid base64.
	#[error("API secret is not valid base64.")]
	InvalidSecret {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Credential field cannot be sent as an HTTP header value.
	#[error("The {field} credential contains characters that cannot be sent in a header.")]
	InvalidCredential {
		/// Credential field that failed validation.
		field: &'static str,
	},
	/// Rendered URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header name or value supplied through configuration is invalid.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Configured duration cannot be represented by the transport.
	#[error("The {field} duration must be positive.")]
	InvalidDuration {
		/// Configuration field that failed validation.
		field: &'static str,
	},
	/// Session was asked to join path segments without a base URL.
	#[error("Session has no base URL to join path segments onto.")]
	MissingBaseUrl,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<base64::DecodeError> for ConfigError {
	fn from(e: base64::DecodeError) -> Self {
		Self::InvalidSecret { source: e }
	}
}

/// Failures while turning request data into signable text.
#[derive(Debug, ThisError)]
pub enum EncodingError {
	/// Request body is not valid UTF-8.
	#[error("Request body is not valid UTF-8.")]
	NonUtf8Body(#[from] std::str::Utf8Error),
	/// Request payload could not be serialized to JSON.
	#[error("Request payload could not be serialized to JSON.")]
	Json(#[from] serde_json::Error),
	/// Signature header value could not be represented as a header.
	#[error("Signature field `{field}` cannot be sent as a header value.")]
	HeaderValue {
		/// Field name that failed conversion.
		field: &'static str,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Connection could not be established; nothing reached the server.
	#[error("Failed to connect to {url}.")]
	Connect {
		/// Target URL of the failed attempt.
		url: String,
		/// Transport-specific connection error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed attempt.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured timeout.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Target URL of the failed attempt.
		url: String,
	},
	/// Redirect chain exceeded the supported length or named an unusable target.
	#[error("Redirect from {url} could not be followed: {reason}.")]
	Redirect {
		/// URL that issued the redirect.
		url: String,
		/// Human-readable reason.
		reason: &'static str,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		url: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}

	/// Classifies a reqwest failure for the provided URL.
	pub fn from_reqwest(url: &Url, e: ReqwestError) -> Self {
		if e.is_connect() {
			Self::Connect { url: url.to_string(), source: Box::new(e) }
		} else if e.is_timeout() {
			Self::Timeout { url: url.to_string() }
		} else {
			Self::network(url.as_str(), e)
		}
	}

	/// Returns true when another attempt may succeed.
	///
	/// Connection failures are always retryable. Timeouts and mid-flight failures may have
	/// reached the server, so they are retried only for idempotent methods.
	pub fn is_retryable(&self, idempotent: bool) -> bool {
		match self {
			Self::Connect { .. } => true,
			Self::Timeout { .. } | Self::Network { .. } => idempotent,
			Self::Redirect { .. } => false,
		}
	}
}
