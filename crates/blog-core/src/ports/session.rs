use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

/// Contents of one session: string keys to arbitrary JSON values.
pub type SessionState = HashMap<String, serde_json::Value>;

/// Session storage trait - abstraction over session backends (Redis, in-memory).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session. Expired or unknown keys yield `Ok(None)`.
    async fn load(&self, key: &str) -> Result<Option<SessionState>, SessionStoreError>;

    /// Store a session, replacing previous contents, expiring after `ttl`.
    async fn save(
        &self,
        key: &str,
        state: &SessionState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    /// Remove a session.
    async fn delete(&self, key: &str) -> Result<(), SessionStoreError>;
}

/// Session storage errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
