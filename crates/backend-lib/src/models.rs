//! Domain records.
use std::fmt;

use chrono::{DateTime, Utc};
use gatekeeper_common::{TokenResponse, UserResponse};

/// Stored user account
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Opaque id (UUID v4 text)
    pub id: String,
    /// Normalised (trimmed, lower-case) email
    pub email: String,
    /// PHC-format password hash
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New account with a fresh id
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}

/// Token pair issued by login and refresh
#[derive(Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl AuthTokens {
    /// Response body; the refresh token travels separately in a cookie
    pub fn to_response(&self) -> TokenResponse {
        TokenResponse::bearer(self.access_token.clone(), self.expires_in)
    }
}
