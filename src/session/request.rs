//! Prepared requests handed to [`Session::execute`](crate::session::Session::execute).

// crates.io
use reqwest::{
	Method,
	header::{HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{_prelude::*, cache::CacheKey, endpoint, error::EncodingError};

/// One logical request before auth headers are attached.
///
/// Auth headers are never stored here; the session signs each physical attempt separately.
#[derive(Clone, Debug)]
pub struct SessionRequest {
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Option<Vec<u8>>,
}
impl SessionRequest {
	/// Creates a bodiless request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None }
	}

	/// Adds or replaces a header; it overrides the session's defaults.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets raw body bytes.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body.
	pub fn with_json<T>(self, payload: &T) -> Result<Self, EncodingError>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.with_body(serde_json::to_vec(payload)?))
	}

	/// Request method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Target URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Caller-supplied headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Body bytes, if any.
	pub fn body(&self) -> Option<&[u8]> {
		self.body.as_deref()
	}

	/// Path and query signed for this request.
	pub fn signing_path(&self) -> String {
		endpoint::request_path(&self.url)
	}

	/// Only `GET` and `HEAD` responses are cached.
	pub fn is_cacheable(&self) -> bool {
		matches!(self.method, Method::GET | Method::HEAD)
	}

	/// Cache fingerprint of this request.
	pub fn cache_key(&self) -> CacheKey {
		CacheKey::new(self.method.as_str(), &self.url, self.body())
	}

	/// Rebuilds the request for a redirect hop.
	pub(crate) fn redirected(&self, method: Method, url: Url, keep_body: bool) -> Self {
		Self {
			method,
			url,
			headers: self.headers.clone(),
			body: if keep_body { self.body.clone() } else { None },
		}
	}
}
