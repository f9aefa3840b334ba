//! HTTP client construction policy for upstream API requests.
//!
//! Centralizes timeouts, user agent, compression and proxy compatibility so
//! every [`ApiClient`](super::ApiClient) talks to the upstream the same way.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use super::FetchError;

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default total request timeout (30 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the reqwest client used for upstream API calls.
///
/// # Errors
///
/// Returns [`FetchError::Client`] when client construction fails.
pub fn build_api_http_client(
    user_agent: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, FetchError> {
    let configure = || {
        Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent(user_agent)
            .gzip(true)
    };

    // System proxy discovery panics in some sandboxes; fall back to env proxies only
    let built = catch_unwind(AssertUnwindSafe(|| configure().build())).or_else(|_| {
        warn!("system proxy lookup panicked; building API client from proxy env vars only");
        catch_unwind(AssertUnwindSafe(|| with_env_proxies(configure().no_proxy()).build()))
    });

    match built {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(error)) => Err(FetchError::Client {
            reason: error.to_string(),
        }),
        Err(_) => Err(FetchError::Client {
            reason: "HTTP client construction panicked".to_string(),
        }),
    }
}

const HTTPS_PROXY_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];
const HTTP_PROXY_VARS: [&str; 4] = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];

fn with_env_proxies(builder: ClientBuilder) -> ClientBuilder {
    let https = proxy_from_env(&HTTPS_PROXY_VARS).and_then(|url| Proxy::https(url).ok());
    let http = proxy_from_env(&HTTP_PROXY_VARS).and_then(|url| Proxy::http(url).ok());
    [https, http]
        .into_iter()
        .flatten()
        .fold(builder, ClientBuilder::proxy)
}

fn proxy_from_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
