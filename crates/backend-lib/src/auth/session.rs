// ============================
// gatekeeper-lib/src/auth/session.rs
// ============================
//! Refresh-token sessions.
//!
//! A session maps an opaque refresh token to the identity it was issued for.
//! Every store expires entries on its own; a lookup after expiry is a miss.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::metrics::SESSIONS_EXPIRED;

/// Session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7); // 7 days

/// Identity bound to a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session backend error: {0}")]
    Backend(String),

    #[error("session encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Key-value store for refresh-token sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `session` under `key`, replacing any previous value
    async fn set_with_ttl(
        &self,
        key: &str,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    /// `Ok(None)` covers both an unknown and an expired key
    async fn get(&self, key: &str) -> Result<Option<Session>, SessionStoreError>;

    /// Remove `key`; removing a missing key succeeds
    async fn delete(&self, key: &str) -> Result<(), SessionStoreError>;

    /// Atomically remove `key` and return what it held.
    ///
    /// Of any number of concurrent calls for one key, at most one sees the
    /// session.
    async fn take(&self, key: &str) -> Result<Option<Session>, SessionStoreError>;

    async fn health_check(&self) -> Result<(), SessionStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process session store.
///
/// Expired entries are invisible immediately and are physically removed by
/// [`MemorySessionStore::purge_expired`].
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Sweep expired sessions every `interval` until the task is aborted
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    counter!(SESSIONS_EXPIRED).increment(removed as u64);
                    tracing::debug!(removed, remaining = store.len(), "purged expired sessions");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_with_ttl(
        &self,
        key: &str,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let entry = Entry {
            session: session.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Session>, SessionStoreError> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.session.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Session>, SessionStoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| entry)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.session))
    }
}
