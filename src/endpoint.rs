//! Base URL value type and path joining for REST calls.
//!
//! [`ApiUrl`] renders `protocol://hostname[:port][/base_path][/endpoint]` and appends
//! `/`-joined [`PathSegment`]s plus an optional `key=value&...` query. Signing always works
//! on [`request_path`], the request-line portion of the final URL, never on the full text.

// self
use crate::{_prelude::*, error::ConfigError};

/// One path component accepted by [`ApiUrl::join`].
///
/// Conversion is explicit: strings and integers implement `From`, anything else must be
/// rendered by the caller first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment(String);
impl PathSegment {
	/// Wraps already-rendered segment text.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Segment text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for PathSegment {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for PathSegment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl From<&str> for PathSegment {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl From<String> for PathSegment {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&String> for PathSegment {
	fn from(value: &String) -> Self {
		Self(value.clone())
	}
}
macro_rules! impl_integer_segment {
	($($ty:ty),+ $(,)?) => {
		$(
			impl From<$ty> for PathSegment {
				fn from(value: $ty) -> Self {
					Self(value.to_string())
				}
			}
		)+
	};
}
impl_integer_segment!(u8, u16, u32, u64, usize, i32, i64);

/// URL prefix shared by every request of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUrl {
	/// Host name without scheme.
	pub hostname: String,
	/// URL scheme.
	#[serde(default = "ApiUrl::default_protocol")]
	pub protocol: String,
	/// Optional explicit port.
	#[serde(default)]
	pub port: Option<u16>,
	/// Optional path prefix (API version, etc.).
	#[serde(default)]
	pub base_path: Option<String>,
	/// Optional endpoint group appended after the base path.
	#[serde(default)]
	pub endpoint: Option<String>,
}
impl ApiUrl {
	/// Creates an HTTPS URL for `hostname`.
	pub fn new(hostname: impl Into<String>) -> Self {
		Self {
			hostname: hostname.into(),
			protocol: Self::default_protocol(),
			port: None,
			base_path: None,
			endpoint: None,
		}
	}

	fn default_protocol() -> String {
		"https".into()
	}

	/// Overrides the scheme.
	pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
		self.protocol = protocol.into();

		self
	}

	/// Sets an explicit port.
	pub fn with_port(mut self, port: u16) -> Self {
		self.port = Some(port);

		self
	}

	/// Sets the path prefix.
	pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
		self.base_path = Some(base_path.into());

		self
	}

	/// Sets the endpoint group.
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());

		self
	}

	/// Renders the base URL.
	pub fn base(&self) -> String {
		let mut buf = format!("{}://{}", self.protocol, self.hostname);

		if let Some(port) = self.port {
			buf.push(':');
			buf.push_str(&port.to_string());
		}
		if let Some(base_path) = &self.base_path {
			buf.push('/');
			buf.push_str(base_path);
		}
		if let Some(endpoint) = &self.endpoint {
			buf.push('/');
			buf.push_str(endpoint);
		}

		buf
	}

	/// Appends `/`-joined segments to the base URL.
	pub fn join<I, S>(&self, segments: I) -> String
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
	{
		self.join_query(segments, std::iter::empty::<(&str, &str)>())
	}

	/// Appends segments and a `key=value` query joined with `&`.
	///
	/// No segments and no parameters yields [`base`](Self::base) unchanged; a query without
	/// segments is rendered after a bare `/`.
	pub fn join_query<I, S, Q, K, V>(&self, segments: I, query: Q) -> String
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
		Q: IntoIterator<Item = (K, V)>,
		K: Display,
		V: Display,
	{
		let mut buf = self.base();
		let mut joined = false;

		for segment in segments {
			buf.push('/');
			buf.push_str(segment.into().as_str());

			joined = true;
		}

		let query =
			query.into_iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>();

		if !query.is_empty() {
			if !joined {
				buf.push('/');
			}

			buf.push('?');
			buf.push_str(&query.join("&"));
		}

		buf
	}

	/// Parses the base URL.
	pub fn to_url(&self) -> Result<Url, ConfigError> {
		parse_url(&self.base())
	}
}
impl Display for ApiUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.base())
	}
}

/// Parses rendered URL text, keeping the offending text on failure.
pub fn parse_url(text: &str) -> Result<Url, ConfigError> {
	Url::parse(text).map_err(|source| ConfigError::InvalidUrl { url: text.to_owned(), source })
}

/// Request-line path of `url`: path plus `?query` when present.
pub fn request_path(url: &Url) -> String {
	match url.query() {
		Some(query) => format!("{}?{query}", url.path()),
		None => url.path().to_owned(),
	}
}
