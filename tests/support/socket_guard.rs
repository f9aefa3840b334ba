//! Skips wiremock-based tests where localhost sockets are unavailable.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKETS_ENV: &str = "ANIMIRROR_REQUIRE_SOCKET_TESTS";

/// Starts a mock upstream, or returns `None` when no socket can be bound.
///
/// Panics instead of skipping when `ANIMIRROR_REQUIRE_SOCKET_TESTS` is truthy.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }

    let required = std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    assert!(
        !required,
        "cannot bind a localhost socket for the mock upstream and {REQUIRE_SOCKETS_ENV} is set"
    );

    eprintln!("[socket-bound-test] cannot bind a localhost socket; skipping mock-upstream test");
    None
}
