//! Bearer-token extractor.
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use gatekeeper_common::BEARER;

use crate::auth::AccessClaims;
use crate::error::{AppError, MSG_INVALID_TOKEN};
use crate::AppState;

/// Claims of a verified access token.
///
/// ```rust,ignore
/// async fn me(BearerAuth(claims): BearerAuth) -> String {
///     claims.sub
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerAuth(pub AccessClaims);

impl FromRequestParts<AppState> for BearerAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::InvalidAccess("Missing bearer token".to_string()))?;

        let claims = state.auth.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            AppError::from(e)
        })?;

        // a validly signed token without our claims is still unusable
        let claims = AccessClaims::from_map(&claims)
            .map_err(|_| AppError::InvalidAccess(MSG_INVALID_TOKEN.to_string()))?;

        Ok(BearerAuth(claims))
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty()).then_some(token)
}
