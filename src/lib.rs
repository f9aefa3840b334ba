//! Animirror Core Library
//!
//! Client core for an anime catalog API: a shared sliding-window rate
//! limiter, a retrying JSON fetch client, and mirror resolution that turns
//! opaque mirror tokens into playable URLs, trying the best quality first.
//!
//! # Architecture
//!
//! - [`throttle`] - sliding-window rate limiter and injectable clock
//! - [`api`] - retrying fetch client, error taxonomy, catalog endpoints
//! - [`mirror`] - token codec, nonce exchange, quality-ordered fallback
//! - [`context`] - cooperative cancellation shared by every operation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod context;
pub mod mirror;
pub mod throttle;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiClient, ApiConfig, FetchError, RetryPolicy};
pub use context::ResolveContext;
pub use mirror::{
    MirrorResolver, MirrorTiers, PlaybackResolver, PlaybackUrl, QualitySelector, ResolveError,
    SelectedMirror,
};
pub use throttle::{Clock, ManualClock, RateLimiter, TokioClock};
