//! In-memory session store - used when Redis is not configured.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use blog_core::ports::{SessionState, SessionStore, SessionStoreError};

/// Stand-in lifetime when `now + ttl` is not representable.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

struct StoredSession {
    state: SessionState,
    expires_at: Instant,
}

impl StoredSession {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session store using a HashMap behind an async RwLock.
///
/// Sessions are lost on process restart and are not shared between
/// processes. Expired entries are dropped lazily on access or in bulk through
/// [`InMemorySessionStore::purge_expired`].
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !stored.is_expired(now));
        before - sessions.len()
    }

    /// Number of stored sessions, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<SessionState>, SessionStoreError> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(key) {
                None => return Ok(None),
                Some(stored) if !stored.is_expired(now) => return Ok(Some(stored.state.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock
        let mut sessions = self.sessions.write().await;
        sessions.remove(key);
        tracing::debug!("Evicted expired session");
        Ok(None)
    }

    async fn save(
        &self,
        key: &str,
        state: &SessionState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL);

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            key.to_string(),
            StoredSession {
                state: state.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(key: &str, value: serde_json::Value) -> SessionState {
        let mut state = SessionState::new();
        state.insert(key.to_string(), value);
        state
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemorySessionStore::new();
        let state = state_with("confirm", serde_json::json!({"title": "Hello"}));

        store
            .save("abc", &state, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.load("abc").await.unwrap(), Some(state));
        assert_eq!(store.load("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemorySessionStore::new();
        let state = state_with("k", serde_json::json!(1));
        store
            .save("abc", &state, Duration::from_secs(60))
            .await
            .unwrap();

        store.delete("abc").await.unwrap();

        assert_eq!(store.load("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_gone() {
        let store = InMemorySessionStore::new();
        let state = state_with("k", serde_json::json!(1));
        store.save("abc", &state, Duration::ZERO).await.unwrap();

        assert_eq!(store.load("abc").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemorySessionStore::new();
        let state = state_with("k", serde_json::json!(1));
        store.save("old", &state, Duration::ZERO).await.unwrap();
        store
            .save("fresh", &state, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.load("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let store = InMemorySessionStore::new();
        let state = state_with("k", serde_json::json!(1));

        store
            .save("forever", &state, Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert!(store.load("forever").await.unwrap().is_some());
        assert_eq!(store.purge_expired().await, 0);
    }
}
