// ============================
// gatekeeper-lib/src/router.rs
// ============================
//! HTTP routing.
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerSettings;
use crate::handlers::{auth, health};
use crate::middleware::{rate_limit, track_requests};
use crate::AppState;

/// Create the public API router
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh).delete(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .nest("/api/auth", auth_routes)
        .route("/api/me", get(auth::me))
        .route("/healthz", get(health::healthz))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.settings.server.request_timeout(),
        ))
        .layer(from_fn(track_requests))
        .layer(cors_layer(&state.settings.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the configured origins.
///
/// The refresh cookie only travels cross-origin with credentials, which rules
/// out a wildcard origin.
pub fn cors_layer(settings: &ServerSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create the monitor router serving `/metrics` and `/healthz`
pub fn create_monitor_router(state: AppState, metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(move || std::future::ready(metrics.render())))
        .route("/healthz", get(health::healthz))
        .with_state(state)
}
