// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Account and session endpoints.
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gatekeeper_common::{LoginRequest, RegisterRequest, SuccessResponse, UserResponse};

use super::cookie::{clear_refresh_cookie, refresh_cookie, refresh_token_from};
use crate::error::{AppError, MSG_BAD_REFRESH};
use crate::middleware::BearerAuth;
use crate::models::AuthTokens;
use crate::AppState;

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let user = state.auth.register(&req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(UserResponse::from(&user))),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let tokens = state.auth.login(&req.email, &req.password).await?;
    token_response(&state, &tokens)
}

/// `POST /api/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = refresh_token_from(&headers)
        .ok_or_else(|| AppError::InvalidAccess(MSG_BAD_REFRESH.to_string()))?;
    let tokens = state.auth.refresh(&token).await?;
    token_response(&state, &tokens)
}

/// `DELETE /api/auth/refresh`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = refresh_token_from(&headers) {
        state.auth.logout(&token).await?;
    }

    // cleared whether or not a session existed
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_refresh_cookie(secure_cookies(&state)) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    Ok((StatusCode::NO_CONTENT, response_headers).into_response())
}

/// `GET /api/me`
pub async fn me(BearerAuth(claims): BearerAuth) -> Json<SuccessResponse<UserResponse>> {
    Json(SuccessResponse::new(UserResponse {
        id: claims.sub,
        email: claims.email,
    }))
}

fn secure_cookies(state: &AppState) -> bool {
    !state.settings.server.is_dev()
}

fn token_response(state: &AppState, tokens: &AuthTokens) -> Result<Response, AppError> {
    let cookie = refresh_cookie(&tokens.refresh_token, secure_cookies(state))
        .map_err(|e| AppError::Internal(format!("refresh cookie: {e}")))?;
    Ok((
        [(SET_COOKIE, cookie)],
        Json(SuccessResponse::new(tokens.to_response())),
    )
        .into_response())
}
