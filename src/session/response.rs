//! Buffered HTTP responses returned by sessions.

// crates.io
use reqwest::{
	StatusCode,
	header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	cache::{CacheError, CachedResponse},
	obs::HttpExchange,
};

/// Fully buffered response of the last hop in a redirect chain.
#[derive(Clone, Debug)]
pub struct Response {
	url: Url,
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
	from_cache: bool,
}
impl Response {
	pub(crate) fn from_exchange(exchange: HttpExchange) -> Self {
		Self {
			url: exchange.url,
			status: exchange.status,
			headers: exchange.response_headers,
			body: exchange.response_body,
			from_cache: false,
		}
	}

	pub(crate) fn from_cached(entry: CachedResponse) -> Result<Self, CacheError> {
		let corrupt = |what: &str| CacheError::Serialization {
			message: format!("Cached response for {} has an invalid {what}", entry.url),
		};
		let url = Url::parse(&entry.url).map_err(|_| corrupt("URL"))?;
		let status = StatusCode::from_u16(entry.status).map_err(|_| corrupt("status"))?;
		let mut headers = HeaderMap::with_capacity(entry.headers.len());

		for (name, value) in &entry.headers {
			let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| corrupt("header"))?;
			let value = HeaderValue::from_str(value).map_err(|_| corrupt("header"))?;

			headers.append(name, value);
		}

		Ok(Self { url, status, headers, body: entry.body, from_cache: true })
	}

	pub(crate) fn to_cached(&self, now: OffsetDateTime, expire: Duration) -> CachedResponse {
		let headers = self
			.headers
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();

		CachedResponse {
			url: self.url.to_string(),
			status: self.status.as_u16(),
			headers,
			body: self.body.clone(),
			stored_at: now,
			expires_at: now + expire,
		}
	}

	/// Final URL after redirects.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Consumes the response, returning its body.
	pub fn into_bytes(self) -> Vec<u8> {
		self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the JSON body, reporting the failing field path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { source })
	}

	/// True when the response was served from the session cache.
	pub fn from_cache(&self) -> bool {
		self.from_cache
	}

	/// True for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Converts non-`2xx` responses into [`Error::HttpStatus`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() {
			return Ok(self);
		}

		Err(Error::HttpStatus {
			status: self.status.as_u16(),
			url: self.url.to_string(),
			body: self.text(),
		})
	}
}
