// self
use crate::_prelude::*;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span wrapping one logical request (all attempts and redirect hops).
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the session name, method, and request path.
	pub fn new(session: &str, method: &str, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("coinbase_lib.request", session, method, path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (session, method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a retry notice inside the current span.
pub fn trace_retry(attempt: u32, delay: Duration, reason: &str) {
	#[cfg(feature = "tracing")]
	{
		let delay_ms = i64::try_from(delay.whole_milliseconds()).unwrap_or(i64::MAX);

		tracing::warn!(attempt, delay_ms, reason, "Retrying request.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, delay, reason);
	}
}
