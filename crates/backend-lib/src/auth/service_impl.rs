//! Default [`AuthService`] over pluggable stores, hasher and token issuer.
use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use zeroize::Zeroizing;

use super::{
    generate_refresh_token, identity_claims, ClaimsMap, PasswordHasher, PasswordRequirements,
    Session, SessionStore, TokenError, TokenIssuer, SESSION_TTL,
};
use crate::auth::AuthService;
use crate::error::{AppError, MSG_BAD_CREDENTIALS, MSG_BAD_REFRESH};
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, LOGOUTS, REFRESHES, REFRESH_REJECTED, REGISTRATIONS};
use crate::models::{AuthTokens, User};
use crate::storage::{UserStore, UserStoreError};
use crate::validation::{validate_login, validate_registration};

/// Deadline for a single store call unless overridden
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Hashed once and verified against when the email is unknown
const DUMMY_PASSWORD: &str = "timing-equaliser-not-a-real-password";

pub struct DefaultAuth {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    requirements: PasswordRequirements,
    backend_timeout: Duration,
    dummy_hash: OnceCell<String>,
}

impl DefaultAuth {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            tokens,
            requirements: PasswordRequirements::default(),
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn with_requirements(mut self, requirements: PasswordRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Run one store call under the backend deadline
    async fn io<T, E>(&self, call: impl Future<Output = Result<T, E>>) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        Ok(tokio::time::timeout(self.backend_timeout, call).await??)
    }

    async fn hash_password(&self, password: Zeroizing<String>) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);
        Ok(tokio::task::spawn_blocking(move || hasher.hash(&password)).await??)
    }

    async fn verify_password(
        &self,
        hash: String,
        password: Zeroizing<String>,
    ) -> Result<bool, AppError> {
        let hasher = Arc::clone(&self.hasher);
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&hash, &password)).await??)
    }

    async fn dummy_hash(&self) -> Result<String, AppError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(Zeroizing::new(DUMMY_PASSWORD.to_string())))
            .await
            .cloned()
    }

    /// Sign an access token and open a fresh refresh session
    async fn issue(&self, user_id: &str, email: &str) -> Result<AuthTokens, AppError> {
        let access_token = self.tokens.generate(identity_claims(user_id, email))?;
        let refresh_token = generate_refresh_token();
        let session = Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
        };
        self.io(self.sessions.set_with_ttl(&refresh_token, &session, SESSION_TTL))
            .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: self.tokens.lifetime().as_secs(),
        })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    #[instrument(name = "auth.register", skip_all)]
    async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = validate_registration(email, password, &self.requirements)?;
        let password = Zeroizing::new(password.to_string());

        if self.io(self.users.find_by_email(&email)).await?.is_some() {
            return Err(UserStoreError::Duplicate.into());
        }

        let password_hash = self.hash_password(password).await?;
        // a racing registration still loses on the store's uniqueness check
        let user = self
            .io(self.users.create(User::new(email, password_hash)))
            .await?;

        counter!(REGISTRATIONS).increment(1);
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    #[instrument(name = "auth.login", skip_all)]
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, AppError> {
        let email = validate_login(email, password)?;
        let password = Zeroizing::new(password.to_string());

        let user = match self.io(self.users.find_by_email(&email)).await? {
            Some(user) => {
                let hash = user.password_hash.clone();
                self.verify_password(hash, password)
                    .await?
                    .then_some(user)
            }
            None => {
                let dummy = self.dummy_hash().await?;
                self.verify_password(dummy, password).await?;
                None
            }
        };

        let Some(user) = user else {
            counter!(LOGIN_FAILURE).increment(1);
            warn!("login rejected");
            return Err(AppError::InvalidAccess(MSG_BAD_CREDENTIALS.to_string()));
        };

        let tokens = self.issue(&user.id, &user.email).await?;
        counter!(LOGIN_SUCCESS).increment(1);
        info!(user_id = %user.id, "user logged in");
        Ok(tokens)
    }

    #[instrument(name = "auth.refresh", skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError> {
        if refresh_token.is_empty() {
            return Err(AppError::InvalidAccess(MSG_BAD_REFRESH.to_string()));
        }

        // take() deletes before anything is issued: concurrent refreshes of
        // one token see the session at most once
        let Some(session) = self.io(self.sessions.take(refresh_token)).await? else {
            counter!(REFRESH_REJECTED).increment(1);
            warn!("refresh rejected: unknown or expired token");
            return Err(AppError::InvalidAccess(MSG_BAD_REFRESH.to_string()));
        };

        let tokens = self.issue(&session.user_id, &session.email).await?;
        counter!(REFRESHES).increment(1);
        info!(user_id = %session.user_id, "refresh token rotated");
        Ok(tokens)
    }

    #[instrument(name = "auth.logout", skip_all)]
    async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        if refresh_token.is_empty() {
            return Ok(());
        }
        self.io(self.sessions.delete(refresh_token)).await?;
        counter!(LOGOUTS).increment(1);
        Ok(())
    }

    fn validate(&self, access_token: &str) -> Result<ClaimsMap, TokenError> {
        self.tokens.validate(access_token)
    }
}
