//! Integration tests for the nonce exchange and quality-ordered fallback.

use std::sync::Arc;

use animirror_core::api::RetryPolicy;
use animirror_core::mirror::{
    FailureReason, MirrorPayload, ProtocolStep, QualityLabel, encode_token,
};
use animirror_core::{
    ManualClock, MirrorResolver, PlaybackResolver, QualitySelector, ResolveContext, ResolveError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;
use support::{manual_client, manual_client_with_policy};

fn token(id: i64, quality: &str) -> String {
    encode_token(&MirrorPayload {
        id,
        i: 0,
        q: quality.to_string(),
    })
}

/// Mounts `/nonce`, verified on drop to be hit exactly `times` times.
async fn mount_nonce(server: &MockServer, nonce: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": nonce})))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_iframe(server: &MockServer, token: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/get-iframe"))
        .and(query_param("content", token))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolve_exchanges_nonce_for_iframe() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let mirror = token(158_123, "1080p");
    mount_nonce(&server, "n-123", 1).await;
    Mock::given(method("GET"))
        .and(path("/get-iframe"))
        .and(query_param("content", mirror.as_str()))
        .and(query_param("nonce", "n-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"iframe": "https://player.test/embed/1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let resolver = MirrorResolver::new(manual_client(&server, &clock));
    let playback = resolver
        .resolve(&mirror, &ResolveContext::new())
        .await
        .unwrap();

    assert_eq!(playback.url, "https://player.test/embed/1");
}

#[tokio::test]
async fn test_nonce_is_forwarded_verbatim() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let mirror = token(7, "720p");
    mount_nonce(&server, " n-padded ", 1).await;
    Mock::given(method("GET"))
        .and(path("/get-iframe"))
        .and(query_param("nonce", " n-padded "))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"iframe": "https://player.test/embed/7"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let resolver = MirrorResolver::new(manual_client(&server, &clock));
    let playback = resolver
        .resolve(&mirror, &ResolveContext::new())
        .await
        .unwrap();

    assert_eq!(playback.url, "https://player.test/embed/7");
}

#[tokio::test]
async fn test_missing_nonce_skips_iframe_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-iframe"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let resolver = MirrorResolver::new(manual_client(&server, &clock));
    let err = resolver
        .resolve(&token(1, "720p"), &ResolveContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NoNonce));
    assert_eq!(err.reason(), FailureReason::NoNonce);
}

#[tokio::test]
async fn test_missing_iframe_field_is_no_iframe() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let mirror = token(2, "480p");
    mount_nonce(&server, "n-1", 1).await;
    mount_iframe(&server, &mirror, 200, serde_json::json!({"iframe": ""})).await;

    let clock = Arc::new(ManualClock::new());
    let resolver = MirrorResolver::new(manual_client(&server, &clock));
    let err = resolver
        .resolve(&mirror, &ResolveContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.reason(), FailureReason::NoIframe);
}

#[tokio::test]
async fn test_nonce_server_error_reports_upstream_step_and_status() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let client = manual_client_with_policy(&server, &clock, RetryPolicy::from_millis(&[5, 5]));
    let err = MirrorResolver::new(client)
        .resolve(&token(3, "360p"), &ResolveContext::new())
        .await
        .unwrap_err();

    match &err {
        ResolveError::Upstream { step, .. } => assert_eq!(*step, ProtocolStep::Nonce),
        other => panic!("expected Upstream, got {other:?}"),
    }
    // Exhaustion surfaces the generic failure status
    assert_eq!(err.upstream_status(), Some(500));
}

#[tokio::test]
async fn test_empty_token_makes_no_requests() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let clock = Arc::new(ManualClock::new());
    let resolver = MirrorResolver::new(manual_client(&server, &clock));

    let err = resolver
        .resolve("   ", &ResolveContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.reason(), FailureReason::InvalidInput);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_play_falls_back_within_best_tier() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let low = token(10, "480p");
    let best_broken = token(11, "1080p");
    let best_working = token(12, "1080p");
    let mid = token(13, "720p");

    Mock::given(method("GET"))
        .and(path("/anime/episode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "judul": "Episode 1",
                "download": null,
                "mirror": {
                    "m480p": [{"nama": "low", "content": low}],
                    "m1080p": [
                        {"nama": "best-broken", "content": best_broken},
                        {"nama": "best-working", "content": best_working}
                    ],
                    "m720p": [{"nama": "mid", "content": mid}]
                }
            }
        })))
        .mount(&server)
        .await;
    // One fresh nonce per mirror attempt, never reused
    mount_nonce(&server, "n-e2e", 2).await;
    mount_iframe(&server, &best_broken, 404, serde_json::json!({})).await;
    mount_iframe(
        &server,
        &best_working,
        200,
        serde_json::json!({"iframe": "https://player.test/best"}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/get-iframe"))
        .and(query_param("content", mid.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new());
    let client = manual_client(&server, &clock);
    let ctx = ResolveContext::new();
    let detail = client.episode("one-piece", "1", &ctx).await.unwrap();

    let selector = QualitySelector::new(Arc::new(MirrorResolver::new(client)));
    let selected = selector.select(&detail.mirror, &ctx).await.unwrap();

    assert_eq!(selected.name, "best-working");
    assert_eq!(selected.quality, QualityLabel::P1080);
    assert_eq!(selected.url, "https://player.test/best");
    assert!(detail.download.is_empty());
}

#[tokio::test]
async fn test_play_reports_player_unavailable_when_every_mirror_fails() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let only = token(20, "720p");
    Mock::given(method("GET"))
        .and(path("/anime/episode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "mirror": {"m720p": [{"nama": "only", "content": only}]}
        })))
        .mount(&server)
        .await;
    mount_nonce(&server, "n-x", 1).await;
    mount_iframe(&server, &only, 403, serde_json::json!({})).await;

    let clock = Arc::new(ManualClock::new());
    let client = manual_client(&server, &clock);
    let ctx = ResolveContext::new();
    let detail = client.episode("x", "1", &ctx).await.unwrap();

    let selector = QualitySelector::new(Arc::new(MirrorResolver::new(client)));
    let err = selector.select(&detail.mirror, &ctx).await.unwrap_err();

    assert!(matches!(err, ResolveError::NoMirrorAvailable { tried: 1 }));
    assert!(err.to_string().contains("player unavailable"));
}
