// ============================
// gatekeeper-lib/src/lib.rs
// ============================
//! Core library for the `gatekeeper` authentication server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod router;
pub mod storage;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    AuthService, DefaultAuth, JwtIssuer, MemorySessionStore, PasswordHasher, RateLimiter,
    RedisSessionStore, SessionStore,
};
use crate::config::{SessionBackend, Settings, UserBackend};
use crate::storage::{MemoryUserStore, PgUserStore, UserStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Refresh-session store, kept for health checks
    pub sessions: Arc<dyn SessionStore>,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Rate limiter for the auth endpoints
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        auth: Arc<dyn AuthService>,
        sessions: Arc<dyn SessionStore>,
        settings: Settings,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::from_settings(&settings.rate_limit));
        Self {
            auth,
            sessions,
            settings: Arc::new(settings),
            rate_limiter,
        }
    }

    /// Wire an [`AppState`] from explicit backends and a hasher
    pub fn with_backends(
        settings: Settings,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let tokens = Arc::new(JwtIssuer::from_settings(&settings.jwt));
        let auth = DefaultAuth::new(users, Arc::clone(&sessions), hasher, tokens)
            .with_requirements(settings.password.requirements.clone())
            .with_backend_timeout(settings.server.backend_timeout());
        Self::new(Arc::new(auth), sessions, settings)
    }

    /// Connect the configured backends and start background sweepers.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = match &settings.users.backend {
            UserBackend::Memory => {
                tracing::warn!("using in-memory user store; accounts are lost on restart");
                Arc::new(MemoryUserStore::new())
            }
            UserBackend::Postgres {
                url,
                max_connections,
            } => Arc::new(PgUserStore::connect(url, *max_connections).await?),
        };

        let sessions: Arc<dyn SessionStore> = match &settings.session.backend {
            SessionBackend::Memory => {
                let store = MemorySessionStore::new();
                store.spawn_cleanup(Duration::from_secs(settings.session.cleanup_interval_secs));
                Arc::new(store)
            }
            SessionBackend::Redis { url, key_prefix } => {
                Arc::new(RedisSessionStore::connect(url, key_prefix).await?)
            }
        };

        let hasher = settings.password.algorithm.build();
        let cleanup_interval = Duration::from_secs(settings.rate_limit.cleanup_interval_secs);
        let state = Self::with_backends(settings, users, sessions, hasher);
        state.rate_limiter.spawn_cleanup(cleanup_interval);
        Ok(state)
    }
}
