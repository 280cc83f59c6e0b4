//! Observability helpers for sessions.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit spans named `coinbase_lib.request` with `session`,
//!   `method`, and `path` fields, and to route debug dumps through `tracing::debug!`.
//! - Enable `metrics` to increment the `coinbase_lib_request_total` counter for every
//!   attempt/retry/cache hit/success/failure, labeled by `method` + `outcome`.

mod dump;
mod metrics;
mod tracing;

pub use dump::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// A physical attempt is about to be sent.
	Attempt,
	/// A failed attempt will be retried.
	Retry,
	/// The response was served from the cache.
	CacheHit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Retry => "retry",
			RequestOutcome::CacheHit => "cache_hit",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
