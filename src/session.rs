//! HTTP session owning the transport, retry loop, redirect handling, and response cache.
//!
//! A [`Session`] sends every logical request through the same pipeline:
//!
//! 1. `GET`/`HEAD` requests are looked up in the response cache first.
//! 2. Each physical attempt merges default headers, caller headers, and freshly computed auth
//!    headers from the attached [`RequestSigner`].
//! 3. Connection failures, timeouts (idempotent methods only), and `413`/`429`/`503` responses
//!    carrying `Retry-After` are retried with exponential backoff.
//! 4. Redirects are followed manually so every hop is signed with its own path.
//! 5. The full chain is rendered for the [`DebugSink`] when `debug` is on, and `200` responses to
//!    cacheable requests are stored unless the cache lifetime is zero.

pub mod config;
pub mod redirect;
pub mod request;
pub mod response;

pub use config::{RetryPolicy, SessionConfig};
pub use redirect::MAX_REDIRECTS;
pub use request::SessionRequest;
pub use response::Response;

// crates.io
use reqwest::{Method, StatusCode, header::HeaderMap, redirect::Policy};
// self
use crate::{
	_prelude::*,
	cache::{CacheConfig, ResponseCache},
	endpoint::{self, ApiUrl, PathSegment},
	error::{ConfigError, TransportError},
	ext::RequestSigner,
	obs::{self, DebugSink, HttpExchange, RequestOutcome, RequestSpan, TracingDebugSink},
};

struct SessionCache {
	store: Arc<dyn ResponseCache>,
	expire: Duration,
}

/// Policy-carrying HTTP session.
///
/// The session owns its connection pool; dropping it (or calling [`close`](Self::close))
/// releases every pooled connection.
pub struct Session {
	config: SessionConfig,
	client: ReqwestClient,
	timeout: std::time::Duration,
	default_headers: HeaderMap,
	base_url: Option<ApiUrl>,
	signer: Option<Arc<dyn RequestSigner>>,
	cache: Option<SessionCache>,
	debug_sink: Arc<dyn DebugSink>,
}
impl Session {
	/// Builds a session with its own connection pool.
	pub fn new(config: SessionConfig) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Self::with_http_client(config, client)
	}

	/// Builds a session around a caller-supplied client.
	///
	/// The client must not follow redirects itself (`reqwest::redirect::Policy::none()`),
	/// otherwise intermediate hops are neither signed nor dumped.
	pub fn with_http_client(config: SessionConfig, client: ReqwestClient) -> Result<Self> {
		let timeout = config.std_timeout()?;
		let default_headers = config.header_map()?;
		let cache = match &config.cache {
			Some(cache_config) =>
				Some(SessionCache { store: cache_config.open()?, expire: cache_config.expire }),
			None => None,
		};

		Ok(Self {
			config,
			client,
			timeout,
			default_headers,
			base_url: None,
			signer: None,
			cache,
			debug_sink: Arc::new(TracingDebugSink),
		})
	}

	/// Sets the base URL used by the verb helpers.
	pub fn with_base_url(mut self, base_url: ApiUrl) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Attaches an auth hook invoked before every physical attempt.
	pub fn with_signer(mut self, signer: impl 'static + RequestSigner) -> Self {
		self.signer = Some(Arc::new(signer));

		self
	}

	/// Replaces the cache backend opened from the config.
	///
	/// Entries expire after the configured `cache.expire`, or
	/// [`CacheConfig::DEFAULT_EXPIRE`] when the config has no cache section.
	pub fn with_cache_backend(mut self, store: Arc<dyn ResponseCache>) -> Self {
		let expire =
			self.config.cache.as_ref().map_or(CacheConfig::DEFAULT_EXPIRE, |cache| cache.expire);

		self.cache = Some(SessionCache { store, expire });

		self
	}

	/// Routes debug dumps to `sink` instead of `tracing`.
	pub fn with_debug_sink(mut self, sink: impl 'static + DebugSink) -> Self {
		self.debug_sink = Arc::new(sink);

		self
	}

	/// Session configuration.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Base URL, if one was set.
	pub fn base_url(&self) -> Option<&ApiUrl> {
		self.base_url.as_ref()
	}

	/// Active cache backend, if caching is enabled.
	pub fn cache(&self) -> Option<&Arc<dyn ResponseCache>> {
		self.cache.as_ref().map(|cache| &cache.store)
	}

	/// Joins `segments` and `query` onto the base URL.
	pub fn url<I, S, Q, K, V>(&self, segments: I, query: Q) -> Result<Url>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
		Q: IntoIterator<Item = (K, V)>,
		K: Display,
		V: Display,
	{
		let base = self.base_url.as_ref().ok_or(ConfigError::MissingBaseUrl)?;

		Ok(endpoint::parse_url(&base.join_query(segments, query))?)
	}

	/// Prepares a bodiless request for the joined path.
	pub fn request<I, S>(&self, method: Method, segments: I) -> Result<SessionRequest>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
	{
		Ok(SessionRequest::new(method, self.url(segments, no_query())?))
	}

	/// Sends `GET` to the joined path.
	pub async fn get<I, S>(&self, segments: I) -> Result<Response>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
	{
		self.get_with_query(segments, no_query()).await
	}

	/// Sends `GET` to the joined path with query parameters.
	pub async fn get_with_query<I, S, Q, K, V>(&self, segments: I, query: Q) -> Result<Response>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
		Q: IntoIterator<Item = (K, V)>,
		K: Display,
		V: Display,
	{
		let url = self.url(segments, query)?;

		self.execute(SessionRequest::new(Method::GET, url)).await?.error_for_status()
	}

	/// Sends `POST` with a JSON body to the joined path.
	pub async fn post<I, S, B>(&self, segments: I, body: &B) -> Result<Response>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
		B: ?Sized + Serialize,
	{
		let request = self.request(Method::POST, segments)?.with_json(body)?;

		self.execute(request).await?.error_for_status()
	}

	/// Sends `PUT` with a JSON body to the joined path.
	pub async fn put<I, S, B>(&self, segments: I, body: &B) -> Result<Response>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
		B: ?Sized + Serialize,
	{
		let request = self.request(Method::PUT, segments)?.with_json(body)?;

		self.execute(request).await?.error_for_status()
	}

	/// Sends `DELETE` to the joined path.
	pub async fn delete<I, S>(&self, segments: I) -> Result<Response>
	where
		I: IntoIterator<Item = S>,
		S: Into<PathSegment>,
	{
		let request = self.request(Method::DELETE, segments)?;

		self.execute(request).await?.error_for_status()
	}

	/// Runs `request` through the cache, retry, redirect, and debug pipeline.
	///
	/// Non-`2xx` responses are returned as-is; use [`Response::error_for_status`] or the verb
	/// helpers to turn them into errors.
	pub async fn execute(&self, request: SessionRequest) -> Result<Response> {
		let method = request.method().as_str().to_owned();
		let span = RequestSpan::new(&self.config.name, &method, &request.signing_path());
		let result = span.instrument(self.dispatch(request)).await;
		let outcome = match &result {
			Ok(response) if response.from_cache() => None,
			Ok(response) if response.is_success() => Some(RequestOutcome::Success),
			_ => Some(RequestOutcome::Failure),
		};

		if let Some(outcome) = outcome {
			obs::record_request_outcome(&method, outcome);
		}

		result
	}

	/// Consumes the session, releasing its connection pool.
	pub fn close(self) {
		#[cfg(feature = "tracing")]
		tracing::debug!(session = %self.config.name, "Session closed.");
	}

	async fn dispatch(&self, request: SessionRequest) -> Result<Response> {
		let cache = self.cache.as_ref().filter(|_| request.is_cacheable());
		let cache_key = cache.map(|_| request.cache_key());

		if let (Some(cache), Some(key)) = (cache, &cache_key) {
			if let Some(entry) = cache.store.get(key, OffsetDateTime::now_utc()).await? {
				obs::record_request_outcome(request.method().as_str(), RequestOutcome::CacheHit);

				return Ok(Response::from_cached(entry)?);
			}
		}

		let (last, mut hops) = self.follow_redirects(request).await?;

		if self.config.debug {
			hops.push(last.clone());
			self.debug_sink.record(&self.config.name, &obs::render_dump(&hops));
		}

		let response = Response::from_exchange(last);

		if let (Some(cache), Some(key)) = (cache, cache_key) {
			if response.status() == StatusCode::OK && cache.expire.is_positive() {
				let now = OffsetDateTime::now_utc();

				cache.store.put(key, response.to_cached(now, cache.expire)).await?;
			}
		}

		Ok(response)
	}

	/// Returns the final exchange and the redirect hops that preceded it.
	async fn follow_redirects(
		&self,
		request: SessionRequest,
	) -> Result<(HttpExchange, Vec<HttpExchange>)> {
		let origin = request.url().origin();
		let mut hops = Vec::new();
		let mut current = request;

		loop {
			// Credentials only travel to the origin the caller targeted.
			let sign = current.url().origin() == origin;
			let exchange = self.send_with_retry(&current, sign).await?;
			let Some(next) = redirect::next_hop(&current, &exchange)? else {
				return Ok((exchange, hops));
			};

			if hops.len() >= MAX_REDIRECTS {
				return Err(TransportError::Redirect {
					url: current.url().to_string(),
					reason: "too many redirects",
				}
				.into());
			}

			hops.push(exchange);

			current = next;
		}
	}

	async fn send_with_retry(&self, request: &SessionRequest, sign: bool) -> Result<HttpExchange> {
		let policy = self.config.retry_policy();
		let idempotent = RetryPolicy::is_idempotent(request.method());
		let method = request.method().as_str();
		let mut retries = 0;

		loop {
			obs::record_request_outcome(method, RequestOutcome::Attempt);

			let outcome = self.send_once(request, sign).await;
			let retry = match &outcome {
				Ok(exchange) => {
					let retry_after = RetryPolicy::retry_after(&exchange.response_headers);

					policy
						.retries_status(exchange.status, retry_after)
						.then(|| (retry_after, exchange.status.to_string()))
				},
				Err(Error::Transport(e)) if e.is_retryable(idempotent) =>
					Some((None, e.to_string())),
				Err(_) => None,
			};
			let Some((retry_after, reason)) = retry else {
				return outcome;
			};

			if !policy.has_budget(retries) {
				return outcome;
			}

			retries += 1;

			let delay = retry_after.unwrap_or_else(|| policy.delay_for(retries));

			obs::trace_retry(retries, delay, &reason);
			obs::record_request_outcome(method, RequestOutcome::Retry);

			if delay.is_positive() {
				tokio::time::sleep(std::time::Duration::try_from(delay).unwrap_or_default()).await;
			}
		}
	}

	async fn send_once(&self, request: &SessionRequest, sign: bool) -> Result<HttpExchange> {
		let mut headers = self.default_headers.clone();

		headers.extend(request.headers().clone());

		if let Some(signer) = self.signer.as_ref().filter(|_| sign) {
			let auth = signer.sign_request(
				request.method().as_str(),
				&request.signing_path(),
				request.body(),
			)?;

			headers.extend(auth);
		}

		let mut builder = self
			.client
			.request(request.method().clone(), request.url().clone())
			.timeout(self.timeout)
			.headers(headers.clone());

		if let Some(body) = request.body() {
			builder = builder.body(body.to_vec());
		}

		let response = builder
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(request.url(), e))?;
		let status = response.status();
		let response_headers = response.headers().clone();
		let response_body = response
			.bytes()
			.await
			.map_err(|e| TransportError::from_reqwest(request.url(), e))?
			.to_vec();

		Ok(HttpExchange {
			method: request.method().clone(),
			url: request.url().clone(),
			request_headers: headers,
			request_body: request.body().map(<[u8]>::to_vec),
			status,
			response_headers,
			response_body,
		})
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("config", &self.config)
			.field("base_url", &self.base_url)
			.field("signed", &self.signer.is_some())
			.field("cached", &self.cache.is_some())
			.finish()
	}
}

fn no_query() -> std::iter::Empty<(&'static str, &'static str)> {
	std::iter::empty()
}

#[cfg(test)]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn url_requires_a_base() {
		let session = Session::new(SessionConfig::default()).expect("Session should build.");
		let err = session.url(["time"], no_query()).expect_err("No base URL is configured.");

		assert!(matches!(err, Error::Config(ConfigError::MissingBaseUrl)));

		let session = session.with_base_url(ApiUrl::new("api.exchange.coinbase.com"));
		let url = session
			.url(["products", "BTC-USD", "book"], [("level", 2)])
			.expect("Joined URL should parse.");

		assert_eq!(url.as_str(), "https://api.exchange.coinbase.com/products/BTC-USD/book?level=2");
	}

	#[test]
	fn invalid_config_fails_construction() {
		let config = SessionConfig::default().with_timeout(Duration::seconds(-1));

		assert!(matches!(
			Session::new(config),
			Err(Error::Config(ConfigError::InvalidDuration { .. }))
		));
	}

	#[tokio::test]
	async fn status_errors_surface_from_verb_helpers() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/missing");
				then.status(404).body(r#"{"message":"NotFound"}"#);
			})
			.await;
		let session = test_session(SessionConfig::default(), server.address());
		let err = session.get(["missing"]).await.expect_err("404 should surface as an error.");

		mock.assert_async().await;

		assert_eq!(err.status(), Some(404));
	}

	#[tokio::test]
	async fn too_many_redirects_fail() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/loop");
				then.status(302).header("location", "/loop");
			})
			.await;
		let session = test_session(SessionConfig::default(), server.address());
		let err = session.get(["loop"]).await.expect_err("Redirect loops should fail.");

		mock.assert_calls_async(MAX_REDIRECTS + 1).await;

		assert!(matches!(err, Error::Transport(TransportError::Redirect { .. })));
	}
}
