//! Wire-level request/response dumps for debug sessions.

// std
use std::fmt::Write as _;
// crates.io
use reqwest::{
	Method, StatusCode,
	header::{HeaderMap, HeaderName},
};
// self
use crate::{_prelude::*, endpoint};

const REQUEST_PREFIX: &str = "< ";
const RESPONSE_PREFIX: &str = "> ";
const REDACTED_HEADERS: [&str; 2] = ["cb-access-sign", "cb-access-passphrase"];

/// Receives rendered dumps from sessions created with `debug` enabled.
pub trait DebugSink
where
	Self: Send + Sync,
{
	/// Records one dump covering a full redirect chain.
	fn record(&self, session: &str, dump: &str);
}

/// Default sink emitting dumps as `tracing` debug events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDebugSink;
impl DebugSink for TracingDebugSink {
	fn record(&self, session: &str, dump: &str) {
		#[cfg(feature = "tracing")]
		{
			tracing::debug!(session, "{dump}");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (session, dump);
		}
	}
}

/// One request/response pair observed on the wire.
#[derive(Clone, Debug)]
pub struct HttpExchange {
	/// Request method.
	pub method: Method,
	/// Request URL.
	pub url: Url,
	/// Headers sent, auth headers included.
	pub request_headers: HeaderMap,
	/// Request body, if any.
	pub request_body: Option<Vec<u8>>,
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub response_headers: HeaderMap,
	/// Response body.
	pub response_body: Vec<u8>,
}

/// Renders a redirect chain in request/response order.
///
/// Request lines start with `< `, response lines with `> `, and the response body follows
/// undecorated. Signature and passphrase header values are redacted.
pub fn render_dump(chain: &[HttpExchange]) -> String {
	let mut buf = String::new();

	for exchange in chain {
		render_exchange(&mut buf, exchange);
	}

	buf
}

fn render_exchange(buf: &mut String, exchange: &HttpExchange) {
	let host = match (exchange.url.host_str(), exchange.url.port()) {
		(Some(host), Some(port)) => format!("{host}:{port}"),
		(Some(host), None) => host.to_owned(),
		_ => String::new(),
	};

	let _ = writeln!(
		buf,
		"{REQUEST_PREFIX}{} {} HTTP/1.1",
		exchange.method,
		endpoint::request_path(&exchange.url)
	);
	let _ = writeln!(buf, "{REQUEST_PREFIX}Host: {host}");

	render_headers(buf, REQUEST_PREFIX, &exchange.request_headers);

	let _ = writeln!(buf, "{REQUEST_PREFIX}");

	if let Some(body) = exchange.request_body.as_deref().filter(|body| !body.is_empty()) {
		let _ = writeln!(buf, "{REQUEST_PREFIX}{}", String::from_utf8_lossy(body));
	}

	let _ = writeln!(
		buf,
		"{RESPONSE_PREFIX}HTTP/1.1 {} {}",
		exchange.status.as_u16(),
		exchange.status.canonical_reason().unwrap_or_default()
	);

	render_headers(buf, RESPONSE_PREFIX, &exchange.response_headers);

	let _ = writeln!(buf, "{RESPONSE_PREFIX}");
	let _ = writeln!(buf, "{}", String::from_utf8_lossy(&exchange.response_body));
}

fn render_headers(buf: &mut String, prefix: &str, headers: &HeaderMap) {
	for (name, value) in headers {
		let value = if is_redacted(name) {
			"<redacted>".into()
		} else {
			String::from_utf8_lossy(value.as_bytes())
		};

		let _ = writeln!(buf, "{prefix}{name}: {value}");
	}
}

fn is_redacted(name: &HeaderName) -> bool {
	REDACTED_HEADERS.contains(&name.as_str())
}
