use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// Liveness plus session-store reachability
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = state.settings.server.backend_timeout();
    match tokio::time::timeout(timeout, state.sessions.health_check()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "session store health check failed");
            unavailable()
        }
        Err(_) => {
            tracing::warn!("session store health check timed out");
            unavailable()
        }
    }
}

fn unavailable() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "status": "unavailable" })),
    )
}
