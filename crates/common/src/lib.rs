// ================
// common/src/lib.rs
// ================
//! Wire types shared between the `gatekeeper` server and its clients.
//! Every JSON body the HTTP API accepts or returns is defined here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status tag carried by successful responses
pub const STATUS_SUCCESS: &str = "success";
/// Status tag carried by error responses
pub const STATUS_ERROR: &str = "error";
/// Token type advertised alongside access tokens
pub const BEARER: &str = "Bearer";

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Clone)]
pub struct RegisterRequest {
    /// Account email, unique across users
    pub email: String,
    /// Plain-text password, hashed server side
    pub password: String,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public view of a user account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    /// Opaque user id
    pub id: String,
    /// Account email
    pub email: String,
}

/// Access token handed out by login and refresh.
///
/// The refresh token never appears in a body; it travels in an
/// `HttpOnly` cookie.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,
    /// Always [`BEARER`]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: BEARER.to_string(),
            expires_in,
        }
    }
}

/// Envelope for every successful response
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SuccessResponse<T> {
    /// Always [`STATUS_SUCCESS`]
    pub status: String,
    /// Payload
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data,
        }
    }
}

/// Envelope for every error response
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    /// Always [`STATUS_ERROR`]
    pub status: String,
    pub error: ErrorDetail,
}

/// Caller-facing error classification and message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    /// Error kind code, e.g. `INVALID_ACCESS`
    #[serde(rename = "type")]
    pub kind: String,
    /// Message safe to show to the caller
    pub message: String,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            error: ErrorDetail {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }
}
