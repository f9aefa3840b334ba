#![allow(dead_code)]

pub mod socket_guard;

use std::sync::Arc;
use std::time::Duration;

use animirror_core::api::{ApiClient, ApiConfig, RetryPolicy};
use animirror_core::{ManualClock, RateLimiter};
use wiremock::MockServer;

/// Client against `server` whose limiter and backoff both run on `clock`.
pub fn manual_client(server: &MockServer, clock: &Arc<ManualClock>) -> ApiClient {
    manual_client_with_policy(server, clock, RetryPolicy::default())
}

pub fn manual_client_with_policy(
    server: &MockServer,
    clock: &Arc<ManualClock>,
    policy: RetryPolicy,
) -> ApiClient {
    let limiter = Arc::new(RateLimiter::with_clock(
        3,
        Duration::from_secs(1),
        clock.clone(),
    ));
    ApiClient::new(ApiConfig::with_base_url(server.uri()))
        .unwrap()
        .with_rate_limiter(limiter)
        .with_retry_policy(policy)
        .with_clock(clock.clone())
}
