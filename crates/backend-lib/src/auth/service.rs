use async_trait::async_trait;

use super::token::{ClaimsMap, TokenError};
use crate::error::AppError;
use crate::models::{AuthTokens, User};

/// Account and session lifecycle
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account; `Conflict` if the email is taken
    async fn register(&self, email: &str, password: &str) -> Result<User, AppError>;

    /// Exchange credentials for an access/refresh token pair
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, AppError>;

    /// Rotate a refresh token; the presented one is dead afterwards whatever the outcome
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError>;

    /// Revoke a refresh token; revoking an unknown token succeeds
    async fn logout(&self, refresh_token: &str) -> Result<(), AppError>;

    /// Verify an access token and return its claims
    fn validate(&self, access_token: &str) -> Result<ClaimsMap, TokenError>;
}
