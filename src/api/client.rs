//! Rate-limited, retrying JSON client for the upstream catalog API.
//!
//! [`ApiClient::fetch_json`] performs one logical GET. Each attempt first
//! passes through the shared [`RateLimiter`], so retries honor the global
//! throttle too. Retryable failures (network, timeout, 5xx, 429, unparseable
//! body) back off per the [`RetryPolicy`] table; other non-2xx statuses return
//! immediately.
//!
//! # Example
//!
//! ```no_run
//! use animirror_core::ResolveContext;
//! use animirror_core::api::{ApiClient, ApiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ApiConfig::default())?;
//! let ctx = ResolveContext::new();
//! let genres = client.fetch_json("genre", &[], &ctx).await?;
//! println!("HTTP {}: {}", genres.status, genres.data);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::context::ResolveContext;
use crate::throttle::{Clock, DEFAULT_MAX_PER_WINDOW, DEFAULT_WINDOW, RateLimiter, TokioClock};
use crate::user_agent;

use super::http_client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, build_api_http_client};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::FetchError;

/// Default upstream API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.ryzumi.vip/api/otakudesu";

/// Connection and throttling settings for an [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total per-attempt request timeout.
    pub read_timeout: Duration,
    /// Rate limiter admissions per window.
    pub max_per_window: usize,
    /// Rate limiter window length.
    pub window: Duration,
    /// Retry backoff table.
    pub retry: RetryPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_per_window: DEFAULT_MAX_PER_WINDOW,
            window: DEFAULT_WINDOW,
            retry: RetryPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Default settings pointed at `base_url`.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Successful fetch: decoded JSON body plus HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Parsed response body.
    pub data: serde_json::Value,
    /// HTTP status code (always 2xx).
    pub status: u16,
}

/// Upstream responses sometimes wrap payloads in `{"data": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Retrying JSON client for the upstream API.
///
/// Cheap to clone: clones share the reqwest connection pool, the rate
/// limiter, and the clock.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl ApiClient {
    /// Creates a client with its own rate limiter built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL, or [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let parsed = url::Url::parse(&config.base_url)
            .map_err(|_| FetchError::invalid_url(&config.base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(&config.base_url));
        }

        let http = build_api_http_client(
            &user_agent::default_api_user_agent(),
            config.connect_timeout,
            config.read_timeout,
        )?;
        let limiter = Arc::new(RateLimiter::new(config.max_per_window, config.window));

        debug!(base_url = %config.base_url, "creating API client");
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter,
            retry: config.retry,
            clock: Arc::new(TokioClock),
        })
    }

    /// Shares an existing rate limiter instead of the client's own.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Uses `clock` for backoff sleeps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The normalized base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The rate limiter gating this client's requests.
    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Builds the full URL for `path` with percent-encoded query pairs.
    ///
    /// Pairs with empty values are omitted.
    #[must_use]
    pub fn endpoint_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let pairs: Vec<String> = query
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        if !pairs.is_empty() {
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        url
    }

    /// Performs one logical GET, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`FetchError::HttpStatus`] for non-retryable statuses (returned on first sight)
    /// - [`FetchError::Exhausted`] when every attempt failed retryably
    /// - [`FetchError::Cancelled`] when `ctx` is cancelled; an in-flight request,
    ///   limiter wait or backoff sleep is abandoned at once
    #[instrument(skip(self, query, ctx), fields(path = %path))]
    pub async fn fetch_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        ctx: &ResolveContext,
    ) -> Result<Fetched, FetchError> {
        let url = self.endpoint_url(path, query);
        let mut attempt: u32 = 1;

        loop {
            if ctx.is_cancelled() {
                debug!(attempt, "fetch cancelled before admission");
                return Err(FetchError::cancelled(&url));
            }
            tokio::select! {
                biased;
                () = ctx.cancelled() => {
                    debug!(attempt, "fetch cancelled while waiting for admission");
                    return Err(FetchError::cancelled(&url));
                }
                () = self.limiter.admit() => {}
            }

            let outcome = tokio::select! {
                biased;
                () = ctx.cancelled() => {
                    debug!(attempt, "fetch cancelled in flight");
                    return Err(FetchError::cancelled(&url));
                }
                outcome = self.attempt(&url) => outcome,
            };
            let error = match outcome {
                Ok(fetched) => {
                    debug!(attempt, status = fetched.status, "fetch succeeded");
                    return Ok(fetched);
                }
                Err(error) => error,
            };

            let failure = classify_error(&error);
            match self.retry.should_retry(failure, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        attempt,
                        status = error.status(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying upstream request"
                    );
                    tokio::select! {
                        biased;
                        () = ctx.cancelled() => {
                            debug!(attempt, "fetch cancelled during backoff");
                            return Err(FetchError::cancelled(&url));
                        }
                        () = self.clock.sleep(delay) => {}
                    }
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, %reason, "not retrying");
                    if failure == FailureType::Permanent {
                        return Err(error);
                    }
                    return Err(FetchError::exhausted(url, attempt, error));
                }
            }
        }
    }

    /// Fetches and deserializes the body into `T`.
    ///
    /// Accepts both bare payloads and `{"data": payload}` envelopes.
    ///
    /// # Errors
    ///
    /// Everything [`Self::fetch_json`] returns, plus [`FetchError::Decode`] if
    /// the body does not match `T`.
    pub async fn fetch_typed<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        ctx: &ResolveContext,
    ) -> Result<T, FetchError> {
        let fetched = self.fetch_json(path, query, ctx).await?;
        serde_json::from_value::<Envelope<T>>(fetched.data)
            .map(Envelope::into_inner)
            .map_err(|error| FetchError::decode(self.endpoint_url(path, query), error.to_string()))
    }

    async fn attempt(&self, url: &str) -> Result<Fetched, FetchError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    FetchError::timeout(url)
                } else {
                    FetchError::network(url, error)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let data = response
            .json::<serde_json::Value>()
            .await
            .map_err(|error| FetchError::decode(url, error.to_string()))?;

        Ok(Fetched {
            data,
            status: status.as_u16(),
        })
    }
}
