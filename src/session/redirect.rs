//! Redirect resolution for session-managed request chains.

// crates.io
use reqwest::{Method, StatusCode, header::LOCATION};
// self
use crate::{_prelude::*, error::TransportError, obs::HttpExchange, session::SessionRequest};

/// Maximum number of redirects followed for one logical request.
pub const MAX_REDIRECTS: usize = 10;

/// Returns the request for the next hop, or `None` when `exchange` is not a redirect.
///
/// A redirect status without a `Location` header ends the chain. `301` turns `POST` into `GET`
/// and `302`/`303` turn everything but `HEAD` into `GET`, dropping the body; `307`/`308` repeat
/// the request unchanged against the new location.
pub fn next_hop(
	request: &SessionRequest,
	exchange: &HttpExchange,
) -> Result<Option<SessionRequest>, TransportError> {
	let keeps_method = match exchange.status {
		StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => true,
		StatusCode::MOVED_PERMANENTLY => request.method() != Method::POST,
		StatusCode::FOUND | StatusCode::SEE_OTHER => request.method() == Method::HEAD,
		_ => return Ok(None),
	};
	let Some(location) = exchange.response_headers.get(LOCATION) else {
		return Ok(None);
	};
	let location = location
		.to_str()
		.map_err(|_| redirect_error(request, "Location header is not ASCII"))?;
	let url = request
		.url()
		.join(location)
		.map_err(|_| redirect_error(request, "Location header is not a valid URL"))?;

	Ok(Some(if keeps_method {
		request.redirected(request.method().clone(), url, true)
	} else {
		request.redirected(Method::GET, url, false)
	}))
}

fn redirect_error(request: &SessionRequest, reason: &'static str) -> TransportError {
	TransportError::Redirect { url: request.url().to_string(), reason }
}
