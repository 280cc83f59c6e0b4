//! POSIX timestamps rendered the way the exchange expects them in signatures.

// self
use crate::_prelude::*;

/// Seconds since the Unix epoch (UTC) with a fractional part.
///
/// The string form is the shortest decimal text that round-trips the float and always carries a
/// fractional part, e.g. `1700000000.0` or `1700000000.123456`. The same text feeds both the
/// pre-hash string and the timestamp header.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Timestamp(f64);
impl Timestamp {
	/// Wraps a raw seconds value.
	pub const fn from_secs(secs: f64) -> Self {
		Self(secs)
	}

	/// Reads the UTC wall clock at microsecond resolution.
	pub fn now() -> Self {
		Self::from_datetime(OffsetDateTime::now_utc())
	}

	/// Converts an instant, truncating to whole microseconds.
	pub fn from_datetime(instant: OffsetDateTime) -> Self {
		let micros = instant.unix_timestamp_nanos() / 1_000;

		Self(micros as f64 / 1_000_000.)
	}

	/// Returns the raw seconds value.
	pub const fn as_secs(self) -> f64 {
		self.0
	}
}
impl Display for Timestamp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.0.is_finite() && self.0.fract() == 0. {
			write!(f, "{:.1}", self.0)
		} else {
			write!(f, "{}", self.0)
		}
	}
}
impl From<OffsetDateTime> for Timestamp {
	fn from(instant: OffsetDateTime) -> Self {
		Self::from_datetime(instant)
	}
}
