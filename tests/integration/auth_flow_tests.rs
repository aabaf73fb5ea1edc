// ==================================
// tests/integration/auth_flow_tests.rs
// ==================================
//! End-to-end flows through the HTTP router
use std::sync::Arc;

use axum::http::{header::RETRY_AFTER, StatusCode};
use gatekeeper_lib::error::MSG_UNKNOWN;
use gatekeeper_lib::testing::{state_with_sessions, FailingSessionStore};
use serde_json::json;

use crate::test_utils::{
    app_with_state, bearer_request, body_json, cookie_request, credentials, json_request,
    refresh_cookie_value, register_and_login, send, set_cookie, test_app, test_settings, PASSWORD,
};

#[tokio::test]
async fn test_register_returns_created_user() {
    let app = test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            &credentials("  New.User@Example.com ", PASSWORD),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["email"], "new.user@example.com");
    assert!(!body["data"]["id"].as_str().unwrap().is_empty());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = test_app();
    let request = || json_request("POST", "/api/auth/register", &credentials("a@b.io", PASSWORD));

    assert_eq!(send(&app, request()).await.status(), StatusCode::CREATED);

    let response = send(&app, request()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["type"], "CONFLICT");
}

#[tokio::test]
async fn test_bad_bodies_are_invalid_body() {
    let app = test_app();

    let cases = [
        json!({ "email": "a@b.io" }),
        json!({ "email": "not-an-email", "password": PASSWORD }),
        json!({ "email": "a@b.io", "password": "weak" }),
    ];
    for body in cases {
        let response = send(&app, json_request("POST", "/api/auth/register", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body_json(response).await["error"]["type"], "INVALID_BODY");
    }

    let response = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("a@b.io", "")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_sets_refresh_cookie() {
    let app = test_app();
    send(
        &app,
        json_request("POST", "/api/auth/register", &credentials("a@b.io", PASSWORD)),
    )
    .await;

    let response = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("a@b.io", PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/api/auth/refresh"));
    assert!(cookie.contains("Max-Age=604800"));
    // dev settings
    assert!(!cookie.contains("Secure"));
    assert_eq!(refresh_cookie_value(&response).unwrap().len(), 32);

    let body = body_json(response).await;
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["expires_in"], 900);
    assert!(body["data"].get("refresh_token").is_none());
}

#[tokio::test]
async fn test_cookie_is_secure_outside_dev() {
    let mut settings = test_settings();
    settings.server.env = "prod".to_string();
    let app = app_with_state(gatekeeper_lib::testing::memory_state(settings));

    register_and_login(&app, "a@b.io").await;
    let response = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("a@b.io", PASSWORD)),
    )
    .await;
    assert!(set_cookie(&response).unwrap().ends_with("; Secure"));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_identical() {
    let app = test_app();
    register_and_login(&app, "a@b.io").await;

    let wrong_password = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("a@b.io", "Wr0ng!Password")),
    )
    .await;
    let unknown_email = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("ghost@b.io", PASSWORD)),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_email).await);
}

#[tokio::test]
async fn test_me_with_access_token() {
    let app = test_app();
    let (access, _) = register_and_login(&app, "a@b.io").await;

    let response = send(&app, bearer_request("/api/me", &access)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["email"], "a@b.io");
}

#[tokio::test]
async fn test_refresh_rotates_cookie_and_kills_old_one() {
    let app = test_app();
    let (_, refresh) = register_and_login(&app, "a@b.io").await;

    let response = send(&app, cookie_request("POST", "/api/auth/refresh", &refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = refresh_cookie_value(&response).unwrap();
    assert_ne!(rotated, refresh);
    let access = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        send(&app, bearer_request("/api/me", &access)).await.status(),
        StatusCode::OK
    );

    let replay = send(&app, cookie_request("POST", "/api/auth/refresh", &refresh)).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let again = send(&app, cookie_request("POST", "/api/auth/refresh", &rotated)).await;
    assert_eq!(again.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_cookie_is_unauthorized() {
    let app = test_app();
    let response = send(
        &app,
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/auth/refresh")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_and_is_idempotent() {
    let app = test_app();
    let (_, refresh) = register_and_login(&app, "a@b.io").await;

    let response = send(&app, cookie_request("DELETE", "/api/auth/refresh", &refresh)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));

    let response = send(&app, cookie_request("POST", "/api/auth/refresh", &refresh)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, cookie_request("DELETE", "/api/auth/refresh", &refresh)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_session_backend_outage() {
    let app = app_with_state(state_with_sessions(
        test_settings(),
        Arc::new(FailingSessionStore),
    ));

    let response = send(
        &app,
        json_request("POST", "/api/auth/register", &credentials("a@b.io", PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        json_request("POST", "/api/auth/login", &credentials("a@b.io", PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "UNKNOWN_ERROR");
    assert_eq!(body["error"]["message"], MSG_UNKNOWN);
    assert!(!body.to_string().contains("6379"));

    let health = send(
        &app,
        axum::http::Request::builder()
            .uri("/healthz")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_auth_routes_rate_limited_by_default() {
    let mut settings = test_settings();
    settings.rate_limit = Default::default();
    let app = app_with_state(gatekeeper_lib::testing::memory_state(settings));

    let login = || json_request("POST", "/api/auth/login", &credentials("a@b.io", PASSWORD));
    for _ in 0..5 {
        assert_ne!(send(&app, login()).await.status(), StatusCode::TOO_MANY_REQUESTS);
    }
    let response = send(&app, login()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "1");
}
