//! Rate-limited, retrying client for the upstream anime catalog API.
//!
//! # Features
//!
//! - One shared [`RateLimiter`](crate::throttle::RateLimiter) gate before every attempt
//! - Fixed-table retry for network errors, 5xx and 429 ([`RetryPolicy`])
//! - Tagged results: every [`FetchError`] carries an HTTP-style status
//! - Typed endpoint wrappers for listing, detail, episode, genre and schedule

mod client;
mod endpoints;
mod error;
mod http_client;
pub mod models;
mod retry;

pub use client::{ApiClient, ApiConfig, DEFAULT_BASE_URL, Fetched};
pub use error::{CANCELLED_STATUS, FetchError, GENERIC_FAILURE_STATUS};
pub use http_client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
pub use models::{
    Anime, AnimeInfo, AnimeQuery, DownloadLink, EpisodeDetail, EpisodeRef, Genre, ScheduleDay,
};
pub use retry::{DEFAULT_BACKOFF_MS, FailureType, RetryDecision, RetryPolicy, classify_error};
