//! Redis session store with connection management.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use blog_core::ports::{SessionState, SessionStore, SessionStoreError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix prepended to every session key
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "blog:session:".to_string(),
        }
    }
}

impl RedisConfig {
    /// Configuration for `url` with the remaining settings from the environment.
    pub fn from_env(url: String) -> Self {
        Self {
            url,
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("REDIS_SESSION_PREFIX")
                .unwrap_or_else(|_| "blog:session:".to_string()),
        }
    }
}

/// Redis-backed session store.
///
/// Sessions are JSON strings written with `SET EX`, so Redis handles expiry.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisSessionStore {
    pub async fn new(config: RedisConfig) -> Result<Self, SessionStoreError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| SessionStoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| SessionStoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| SessionStoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis session store");

        Ok(Self { conn, config })
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, key: &str) -> Result<Option<SessionState>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.redis_key(key))
            .await
            .map_err(|e| SessionStoreError::Operation(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| SessionStoreError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn save(
        &self,
        key: &str,
        state: &SessionState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(state)
            .map_err(|e| SessionStoreError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();

        // SET EX rejects zero
        conn.set_ex::<_, _, ()>(self.redis_key(key), json, ttl.as_secs().max(1))
            .await
            .map_err(|e| SessionStoreError::Operation(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.redis_key(key))
            .await
            .map_err(|e| SessionStoreError::Operation(e.to_string()))
    }
}
