// ============================
// gatekeeper-lib/src/storage.rs
// ============================
//! User storage abstraction with an in-memory implementation.
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;

use crate::models::User;

pub mod postgres;

pub use postgres::PgUserStore;

#[derive(Debug, Error)]
pub enum UserStoreError {
    /// An account with this email already exists
    #[error("email already registered")]
    Duplicate,

    #[error("user store backend error: {0}")]
    Backend(String),
}

/// Trait for user storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert `user`; fails with [`UserStoreError::Duplicate`] if the email is taken
    async fn create(&self, user: User) -> Result<User, UserStoreError>;

    /// `Ok(None)` means no such account, never a backend failure
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn health_check(&self) -> Result<(), UserStoreError> {
        Ok(())
    }
}

/// Users held in process memory, keyed by email
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: User) -> Result<User, UserStoreError> {
        // entry() holds the shard lock, so two racing creates cannot both insert
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(UserStoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.users.get(email).map(|user| user.clone()))
    }
}
