// ===============================
// tests/unit/middleware_tests.rs
// ===============================
//! Rate-limit middleware and bearer extractor behind the real router
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, RETRY_AFTER,
        },
        Request, StatusCode,
    },
};
use gatekeeper_lib::testing::{memory_state, state_with_sessions, StalledSessionStore};

use crate::test_utils::{
    app_with_state, bearer_request, body_json, cookie_request, credentials, json_request, send,
    test_app, test_settings,
};

fn limited_app(burst: u32, trust_proxy_headers: bool) -> axum::Router {
    let mut settings = test_settings();
    settings.rate_limit.burst = burst;
    settings.rate_limit.refill_per_sec = 0.01;
    settings.server.trust_proxy_headers = trust_proxy_headers;
    app_with_state(memory_state(settings))
}

fn login_from(peer: [u8; 4]) -> Request<Body> {
    let mut request = json_request(
        "POST",
        "/api/auth/login",
        &credentials("nobody@example.com", "Whatever1!"),
    );
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
    request
}

#[tokio::test]
async fn test_sixth_request_is_rejected() {
    let app = limited_app(5, false);

    for _ in 0..5 {
        let response = send(&app, login_from([192, 0, 2, 1])).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = send(&app, login_from([192, 0, 2, 1])).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(RETRY_AFTER));
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "TOO_MANY_REQUESTS");

    // another peer has its own bucket
    let response = send(&app, login_from([192, 0, 2, 2])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_spoofed_header_ignored_without_trust() {
    let app = limited_app(1, false);

    let mut first = login_from([192, 0, 2, 1]);
    first.headers_mut().insert("x-real-ip", "1.1.1.1".parse().unwrap());
    assert_eq!(send(&app, first).await.status(), StatusCode::UNAUTHORIZED);

    let mut second = login_from([192, 0, 2, 1]);
    second.headers_mut().insert("x-real-ip", "2.2.2.2".parse().unwrap());
    assert_eq!(send(&app, second).await.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forwarded_header_used_when_trusted() {
    let app = limited_app(1, true);

    for ip in ["1.1.1.1", "2.2.2.2"] {
        let mut request = login_from([192, 0, 2, 1]);
        request.headers_mut().insert("x-forwarded-for", ip.parse().unwrap());
        assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_non_auth_routes_are_not_limited() {
    let app = limited_app(1, false);

    for _ in 0..3 {
        let response = send(
            &app,
            Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_me_requires_valid_bearer() {
    let app = limited_app(10, false);

    let missing = send(
        &app,
        Request::builder().uri("/api/me").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = send(&app, bearer_request("/api/me", "not.a.token")).await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(garbage).await;
    assert_eq!(body["error"]["type"], "INVALID_ACCESS");
}

#[tokio::test]
async fn test_request_counting_keeps_responses_intact() {
    let app = test_app();

    let health = send(
        &app,
        Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["status"], "ok");

    let missing = send(
        &app,
        Request::builder().uri("/nowhere").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let rejected = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("ghost@b.io", "Whatever1!")),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(rejected).await["error"]["type"], "INVALID_ACCESS");
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/api/auth/refresh")
        .header(ORIGIN, origin)
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let mut settings = test_settings();
    settings.server.cors_allowed_origins = vec!["https://app.example.com".to_string()];
    let app = app_with_state(memory_state(settings));

    let response = send(&app, preflight("https://app.example.com")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example.com"
    );
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );

    let response = send(&app, preflight("https://evil.example.net")).await;
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_request_times_out() {
    let mut settings = test_settings();
    settings.server.request_timeout_secs = 1;
    settings.server.backend_timeout_ms = 60_000;
    let app = app_with_state(state_with_sessions(settings, Arc::new(StalledSessionStore)));

    let response = send(&app, cookie_request("DELETE", "/api/auth/refresh", "stuck")).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
