//! Coinbase Exchange client plumbing: HMAC request signing for REST and WebSocket, policy-driven
//! HTTP sessions with retries, redirects, response caching, and wire dumps, plus base-URL joining.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod endpoint;
pub mod error;
pub mod exchange;
pub mod ext;
pub mod obs;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		net::SocketAddr,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use reqwest::header::HeaderMap;
	// self
	use crate::{
		auth::{Credentials, SessionAuth, SignatureStyle, Timestamp},
		endpoint::ApiUrl,
		ext::RequestSigner,
		obs::DebugSink,
		session::{Session, SessionConfig},
	};

	/// API key used by test credentials.
	pub const TEST_KEY: &str = "abc";
	/// Passphrase used by test credentials.
	pub const TEST_PASSPHRASE: &str = "xyz";
	/// Base64 of `supersecret`, the secret used by test credentials.
	pub const TEST_SECRET: &str = "c3VwZXJzZWNyZXQ=";

	/// Credentials shared by the known-answer fixtures.
	pub fn test_credentials() -> Arc<Credentials> {
		Arc::new(
			Credentials::new(TEST_KEY, TEST_PASSPHRASE, TEST_SECRET)
				.expect("Test credentials should be valid."),
		)
	}

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// and leaves redirects to the session.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Plain-HTTP base URL pointing at a local mock server.
	pub fn mock_base_url(address: &SocketAddr) -> ApiUrl {
		ApiUrl::new(address.ip().to_string()).with_protocol("http").with_port(address.port())
	}

	/// Unauthenticated session bound to the mock server listening on `address`.
	pub fn test_session(config: SessionConfig, address: &SocketAddr) -> Session {
		Session::with_http_client(config, test_reqwest_client())
			.expect("Test session should build.")
			.with_base_url(mock_base_url(address))
	}

	/// Mock-server session that signs every request with [`test_credentials`].
	pub fn test_signed_session(config: SessionConfig, address: &SocketAddr) -> Session {
		test_session(config, address).with_signer(SessionAuth::new(test_credentials()))
	}

	/// REST signer stamping every request with a fixed timestamp and counting invocations.
	///
	/// Clones share the counter, so a test can keep one handle while the session owns another.
	#[derive(Clone, Debug)]
	pub struct FixedClockSigner {
		credentials: Arc<Credentials>,
		timestamp: Timestamp,
		calls: Arc<AtomicUsize>,
	}
	impl FixedClockSigner {
		/// Signs with [`test_credentials`] at `secs` seconds since the Unix epoch.
		pub fn new(secs: f64) -> Self {
			Self {
				credentials: test_credentials(),
				timestamp: Timestamp::from_secs(secs),
				calls: Arc::default(),
			}
		}

		/// Number of requests signed so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl RequestSigner for FixedClockSigner {
		fn sign_request(
			&self,
			method: &str,
			path: &str,
			body: Option<&[u8]>,
		) -> Result<HeaderMap> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let headers =
				self.credentials.sign_at(SignatureStyle::Rest, self.timestamp, method, path, body)?;

			Ok(headers.to_header_map()?)
		}
	}

	/// [`DebugSink`] keeping every dump in memory.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingSink(Arc<Mutex<Vec<(String, String)>>>);
	impl RecordingSink {
		/// Recorded `(session, dump)` pairs in arrival order.
		pub fn dumps(&self) -> Vec<(String, String)> {
			self.0.lock().clone()
		}
	}
	impl DebugSink for RecordingSink {
		fn record(&self, session: &str, dump: &str) {
			self.0.lock().push((session.to_owned(), dump.to_owned()));
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use color_eyre as _;
