// ============================
// gatekeeper-lib/src/auth/redis_session.rs
// ============================
//! Redis-backed [`SessionStore`].
//!
//! Sessions are stored as JSON strings under `<prefix><refresh token>` and
//! expire through Redis `EX`.
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::info;

use super::session::{Session, SessionStore, SessionStoreError};

impl From<redis::RedisError> for SessionStoreError {
    fn from(err: redis::RedisError) -> Self {
        SessionStoreError::Backend(err.to_string())
    }
}

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisSessionStore {
    /// Connect to `url`; the manager reconnects on its own afterwards
    pub async fn connect(url: &str, key_prefix: &str) -> Result<Self, SessionStoreError> {
        info!("Connecting to Redis session store...");
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Redis session store connected");

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, token: &str) -> String {
        format!("{}{}", self.key_prefix, token)
    }

    fn decode(raw: Option<String>) -> Result<Option<Session>, SessionStoreError> {
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(SessionStoreError::from)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set_with_ttl(
        &self,
        key: &str,
        session: &Session,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(session)?;
        let mut conn = self.conn.clone();
        // EX 0 is rejected by the server
        let _: () = conn.set_ex(self.key(key), json, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Session>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.key(key)).await?;
        Self::decode(raw)
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(self.key(key)).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Session>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await?;
        Self::decode(raw)
    }

    async fn health_check(&self) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(SessionStoreError::Backend(format!("unexpected PING reply: {pong}")))
        }
    }
}
