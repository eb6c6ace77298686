//! Server-side sessions.
//!
//! [`SessionMiddleware`] loads the session named by the session cookie from a
//! [`SessionStore`](blog_core::ports::SessionStore) before the handler runs
//! and writes it back afterwards when the handler changed it. Handlers reach
//! the data through the [`Session`] extractor.

mod flash;
mod middleware;

use std::cell::RefCell;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::time::Duration;

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use serde::Serialize;
use serde::de::DeserializeOwned;

use blog_core::ports::SessionState;

pub use flash::FlashMessage;
pub use middleware::SessionMiddleware;

/// Session cookie and lifetime settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Idle lifetime; every write restarts it.
    pub ttl: Duration,
    /// Only send the cookie over HTTPS.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "blog_session".to_string(),
            ttl: Duration::from_secs(14 * 24 * 3600),
            secure: false,
        }
    }
}

/// Errors reading or writing session values.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session value for '{key}' could not be decoded: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },

    #[error("Session value for '{key}' could not be encoded: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionStatus {
    Unchanged,
    Changed,
    /// Persist under a fresh key and drop the old one.
    Renewed,
    /// Delete the stored session and expire the cookie.
    Purged,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    status: SessionStatus,
}

/// Handle to the current request's session.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Debug, Clone)]
pub struct Session(Rc<RefCell<SessionInner>>);

impl Session {
    pub(crate) fn new(state: SessionState) -> Self {
        Self(Rc::new(RefCell::new(SessionInner {
            state,
            status: SessionStatus::Unchanged,
        })))
    }

    /// Read and decode a value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.0.borrow().state.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| SessionError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Store a value, replacing any previous one.
    pub fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value).map_err(|source| SessionError::Encode {
            key: key.to_string(),
            source,
        })?;

        let mut inner = self.0.borrow_mut();
        inner.state.insert(key.to_string(), value);
        inner.mark_changed();
        Ok(())
    }

    /// Remove a value, returning what was stored.
    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        let mut inner = self.0.borrow_mut();
        let removed = inner.state.remove(key);
        if removed.is_some() {
            inner.mark_changed();
        }
        removed
    }

    /// Keep the data but move it to a new session key (on sign-in).
    pub fn renew(&self) {
        let mut inner = self.0.borrow_mut();
        if inner.status != SessionStatus::Purged {
            inner.status = SessionStatus::Renewed;
        }
    }

    /// Drop all data and end the session (on sign-out).
    pub fn purge(&self) {
        let mut inner = self.0.borrow_mut();
        inner.state.clear();
        inner.status = SessionStatus::Purged;
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.0.borrow().status
    }

    pub(crate) fn state(&self) -> SessionState {
        self.0.borrow().state.clone()
    }
}

impl SessionInner {
    fn mark_changed(&mut self) {
        self.status = match self.status {
            SessionStatus::Unchanged => SessionStatus::Changed,
            // Writing after a purge starts a brand new session
            SessionStatus::Purged => SessionStatus::Renewed,
            other => other,
        };
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.extensions().get::<Session>().cloned();
        match session {
            Some(session) => ready(Ok(session)),
            None => {
                tracing::error!("Session requested but SessionMiddleware is not installed");
                // Detached: usable, but never persisted
                let session = Session::new(SessionState::new());
                req.extensions_mut().insert(session.clone());
                ready(Ok(session))
            }
        }
    }
}
