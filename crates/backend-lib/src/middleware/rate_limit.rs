use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use metrics::counter;

use crate::auth::RateLimitDecision;
use crate::error::AppError;
use crate::metrics::RATE_LIMITED;
use crate::AppState;

/// Rate limiter middleware
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&request, state.settings.server.trust_proxy_headers);

    match state.rate_limiter.check(&key) {
        RateLimitDecision::Allowed => Ok(next.run(request).await),
        RateLimitDecision::Limited { retry_after_secs } => {
            counter!(RATE_LIMITED).increment(1);
            tracing::warn!(client = %key, retry_after_secs, "rate limit exceeded");
            Err(AppError::TooManyRequests { retry_after_secs })
        }
    }
}

/// Client identity used as the limiter key.
///
/// Proxy headers are only honoured when `trust_proxy` is set; otherwise a
/// client could pick a fresh key per request.
pub fn client_key(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = forwarded_ip(request.headers()) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let first_hop = || {
        headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|list| list.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    real_ip.or_else(first_hop).map(str::to_string)
}
