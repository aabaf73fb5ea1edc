// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
//!
//! Every failure leaving the core is classified into an [`ErrorKind`].
//! Backend detail is logged here and never reaches the caller.
use axum::{
    extract::rejection::JsonRejection,
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use gatekeeper_common::ErrorResponse;
use thiserror::Error;

use crate::auth::{PasswordError, SessionStoreError, TokenError};
use crate::storage::UserStoreError;
use crate::validation::ValidationError;

/// Message returned for every internal failure
pub const MSG_UNKNOWN: &str = "Please contact our support team for details";
/// Message for any rejected access token
pub const MSG_INVALID_TOKEN: &str = "Invalid or expired token";
/// Message for any failed login, whatever the cause
pub const MSG_BAD_CREDENTIALS: &str = "Email or password is incorrect";
/// Message for a missing, expired or revoked refresh token
pub const MSG_BAD_REFRESH: &str = "Invalid refresh token";

/// Caller-facing failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParam,
    InvalidBody,
    InvalidAccess,
    Conflict,
    NotFound,
    TooManyRequests,
    Internal,
}

impl ErrorKind {
    /// Wire code carried in the error body
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidParam => "INVALID_PARAMETER",
            ErrorKind::InvalidBody => "INVALID_BODY",
            ErrorKind::InvalidAccess => "INVALID_ACCESS",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorKind::Internal => "UNKNOWN_ERROR",
        }
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::InvalidParam | ErrorKind::InvalidBody => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidAccess => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error types.
///
/// The payload of every variant except `Internal` is a caller-safe message.
/// `Internal` carries diagnostic detail for the server log only.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("Invalid access: {0}")]
    InvalidAccess(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidParam(_) => ErrorKind::InvalidParam,
            AppError::InvalidBody(_) => ErrorKind::InvalidBody,
            AppError::InvalidAccess(_) => ErrorKind::InvalidAccess,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::TooManyRequests { .. } => ErrorKind::TooManyRequests,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        self.kind().code()
    }

    /// Message suitable for the caller
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidParam(msg)
            | AppError::InvalidBody(msg)
            | AppError::InvalidAccess(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::TooManyRequests { .. } => "Too many requests".to_string(),
            AppError::Internal(_) => MSG_UNKNOWN.to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self {
            tracing::error!(error = %detail, "internal error occurred");
        }

        let status = self.status_code();
        let body = ErrorResponse::new(self.error_code(), self.public_message());
        let mut response = (status, axum::Json(body)).into_response();

        if let AppError::TooManyRequests { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs.max(1)));
        }

        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {err}"))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidBody(err.to_string())
    }
}

impl From<SessionStoreError> for AppError {
    fn from(err: SessionStoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<UserStoreError> for AppError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::Duplicate => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            UserStoreError::Backend(detail) => AppError::Internal(detail),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(detail) => AppError::Internal(detail),
            TokenError::Expired | TokenError::InvalidSignature | TokenError::Malformed(_) => {
                AppError::InvalidAccess(MSG_INVALID_TOKEN.to_string())
            }
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Internal("backend call timed out".to_string())
    }
}
