//! Outbound request throttling.
//!
//! - [`RateLimiter`] - rolling-window admission control shared by every upstream call
//! - [`Clock`] - injectable time source ([`TokioClock`] in production, [`ManualClock`] in tests)

pub mod clock;
pub mod rate_limiter;

pub use clock::{Clock, ManualClock, TokioClock};
pub use rate_limiter::{DEFAULT_MAX_PER_WINDOW, DEFAULT_WINDOW, RateLimiter, RateWindow};
