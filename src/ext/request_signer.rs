//! Per-request authentication hook invoked by sessions before every send.

// crates.io
use reqwest::header::HeaderMap;
// self
use crate::_prelude::*;

/// Produces authentication headers for one outgoing HTTP request.
///
/// The session calls the hook once per physical attempt (retries and redirect hops included),
/// so implementations must derive time-sensitive values, such as timestamps, on every call.
/// `path` is the request-line path including the query string, never the scheme or host.
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Returns headers to merge into the outgoing request.
	fn sign_request(&self, method: &str, path: &str, body: Option<&[u8]>) -> Result<HeaderMap>;
}
impl<T> RequestSigner for Arc<T>
where
	T: ?Sized + RequestSigner,
{
	fn sign_request(&self, method: &str, path: &str, body: Option<&[u8]>) -> Result<HeaderMap> {
		T::sign_request(self, method, path, body)
	}
}
