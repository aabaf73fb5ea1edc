//! Fast fakes for exercising the service and HTTP layers in tests.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{
    MemorySessionStore, PasswordError, PasswordHasher, Session, SessionStore, SessionStoreError,
};
use crate::config::Settings;
use crate::models::User;
use crate::storage::{MemoryUserStore, UserStore, UserStoreError};
use crate::AppState;

const PLAIN_PREFIX: &str = "plain$";

/// Stores passwords verbatim; only for tests, where real KDFs are too slow
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        Ok(format!("{PLAIN_PREFIX}{plain}"))
    }

    fn verify(&self, hashed: &str, plain: &str) -> Result<bool, PasswordError> {
        let stored = hashed
            .strip_prefix(PLAIN_PREFIX)
            .ok_or(PasswordError::InvalidHashFormat)?;
        Ok(stored == plain)
    }
}

/// Session store whose every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn set_with_ttl(&self, _: &str, _: &Session, _: Duration) -> Result<(), SessionStoreError> {
        Err(unavailable())
    }

    async fn get(&self, _: &str) -> Result<Option<Session>, SessionStoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _: &str) -> Result<(), SessionStoreError> {
        Err(unavailable())
    }

    async fn take(&self, _: &str) -> Result<Option<Session>, SessionStoreError> {
        Err(unavailable())
    }

    async fn health_check(&self) -> Result<(), SessionStoreError> {
        Err(unavailable())
    }
}

fn unavailable() -> SessionStoreError {
    SessionStoreError::Backend("connection refused (10.0.0.7:6379)".to_string())
}

/// User store whose every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn create(&self, _: User) -> Result<User, UserStoreError> {
        Err(UserStoreError::Backend("pool timed out".to_string()))
    }

    async fn find_by_email(&self, _: &str) -> Result<Option<User>, UserStoreError> {
        Err(UserStoreError::Backend("pool timed out".to_string()))
    }
}

/// Session store that never answers within any sane deadline
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledSessionStore;

#[async_trait]
impl SessionStore for StalledSessionStore {
    async fn set_with_ttl(&self, _: &str, _: &Session, _: Duration) -> Result<(), SessionStoreError> {
        std::future::pending().await
    }

    async fn get(&self, _: &str) -> Result<Option<Session>, SessionStoreError> {
        std::future::pending().await
    }

    async fn delete(&self, _: &str) -> Result<(), SessionStoreError> {
        std::future::pending().await
    }

    async fn take(&self, _: &str) -> Result<Option<Session>, SessionStoreError> {
        std::future::pending().await
    }
}

/// In-memory state with the plain-text hasher
pub fn memory_state(settings: Settings) -> AppState {
    state_with_sessions(settings, Arc::new(MemorySessionStore::new()))
}

/// In-memory users with the given session store and the plain-text hasher
pub fn state_with_sessions(settings: Settings, sessions: Arc<dyn SessionStore>) -> AppState {
    AppState::with_backends(
        settings,
        Arc::new(MemoryUserStore::new()),
        sessions,
        Arc::new(PlainTextHasher),
    )
}
