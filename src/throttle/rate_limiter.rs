//! Rolling-window rate limiting for upstream API requests.
//!
//! This module provides the [`RateLimiter`] struct which admits at most `K`
//! requests per rolling window of `W` (3 per second by default), across every
//! caller sharing one instance.
//!
//! # Overview
//!
//! The limiter keeps the timestamps of recent admissions in a [`RateWindow`].
//! On each [`RateLimiter::admit`] call, expired timestamps are purged; if the
//! window is still full, the caller sleeps until the oldest admission ages out.
//! The limiter never rejects, it only delays.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use animirror_core::throttle::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(3, Duration::from_secs(1)));
//!
//! // The first three admissions are immediate
//! limiter.admit().await;
//! limiter.admit().await;
//! limiter.admit().await;
//!
//! // The fourth waits until the first has left the window
//! limiter.admit().await;
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::clock::{Clock, TokioClock};

/// Default number of admissions allowed per window.
pub const DEFAULT_MAX_PER_WINDOW: usize = 3;

/// Default rolling window length (1 second).
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

/// Warning threshold for cumulative throttle delay (30 seconds).
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Ordered admission timestamps inside the trailing window.
///
/// Oldest first. Never holds more than the limiter's `max_per_window` entries
/// once an admission completes.
#[derive(Debug, Default)]
pub struct RateWindow {
    admissions: VecDeque<Instant>,
}

impl RateWindow {
    /// Drops every admission that is `window` or more older than `now`.
    fn purge(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.admissions.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.admissions.pop_front();
            } else {
                break;
            }
        }
    }

    fn oldest(&self) -> Option<Instant> {
        self.admissions.front().copied()
    }

    fn pop_oldest(&mut self) {
        self.admissions.pop_front();
    }

    fn record(&mut self, at: Instant) {
        self.admissions.push_back(at);
    }

    /// Number of retained admissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.admissions.len()
    }

    /// Returns true if no admission is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admissions.is_empty()
    }
}

/// Rolling-window rate limiter shared by every upstream request.
///
/// Designed to be wrapped in `Arc` and shared across tasks and API clients.
/// The check-and-record step runs under a `tokio::sync::Mutex` that stays held
/// while a caller waits for room, so admissions are serialized and no two
/// callers can admit on the same stale count.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    disabled: bool,
    clock: Arc<dyn Clock>,
    admissions: Mutex<RateWindow>,
    /// Total throttle delay applied so far, in milliseconds.
    cumulative_delay_ms: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_per_window` requests per `window`.
    ///
    /// A `max_per_window` of zero is treated as one.
    #[must_use]
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self::with_clock(max_per_window, window, Arc::new(TokioClock))
    }

    /// Creates a limiter that reads time from `clock`.
    #[must_use]
    pub fn with_clock(max_per_window: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        debug!(max_per_window, window_ms = window.as_millis(), "creating rate limiter");
        Self {
            max_per_window: max_per_window.max(1),
            window,
            disabled: false,
            clock,
            admissions: Mutex::new(RateWindow::default()),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Creates a limiter that admits everything immediately.
    #[must_use]
    pub fn disabled() -> Self {
        debug!("creating disabled rate limiter");
        Self {
            max_per_window: usize::MAX,
            window: Duration::ZERO,
            disabled: true,
            clock: Arc::new(TokioClock),
            admissions: Mutex::new(RateWindow::default()),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Returns whether rate limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Maximum admissions per window.
    #[must_use]
    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }

    /// Length of the rolling window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Total delay this limiter has imposed on callers.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::SeqCst))
    }

    /// Number of admissions currently retained in the window.
    pub async fn in_window(&self) -> usize {
        let mut admissions = self.admissions.lock().await;
        admissions.purge(self.clock.now(), self.window);
        admissions.len()
    }

    /// Waits until a request may be sent, then records the admission.
    ///
    /// Never fails. The first `max_per_window` calls inside any window return
    /// immediately; later calls sleep until the oldest admission ages out.
    #[instrument(skip(self))]
    pub async fn admit(&self) {
        if self.disabled {
            return;
        }

        let mut admissions = self.admissions.lock().await;
        let now = self.clock.now();
        admissions.purge(now, self.window);

        if admissions.len() >= self.max_per_window {
            if let Some(oldest) = admissions.oldest() {
                let wait = self
                    .window
                    .saturating_sub(now.saturating_duration_since(oldest));
                if !wait.is_zero() {
                    let cumulative = self.add_cumulative_delay(wait);
                    debug!(
                        delay_ms = wait.as_millis(),
                        cumulative_ms = cumulative.as_millis(),
                        "applying rate limit delay"
                    );
                    if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                        warn!(
                            cumulative_delay_secs = cumulative.as_secs(),
                            "excessive rate limiting - consider reducing request volume"
                        );
                    }
                    self.clock.sleep(wait).await;
                }
            }
            admissions.pop_oldest();
        }

        admissions.record(self.clock.now());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_WINDOW, DEFAULT_WINDOW)
    }
}
