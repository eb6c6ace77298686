//! Session middleware - loads the session before the handler, persists it after.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpMessage,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use uuid::Uuid;

use blog_core::ports::{SessionState, SessionStore};

use super::{Session, SessionConfig, SessionStatus};

/// Middleware factory attaching a [`Session`] to every request.
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionMiddleware {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionService {
            service: Rc::new(service),
            store: self.store.clone(),
            config: Rc::new(self.config.clone()),
        }))
    }
}

pub struct SessionService<S> {
    service: Rc<S>,
    store: Arc<dyn SessionStore>,
    config: Rc<SessionConfig>,
}

impl<S, B> Service<ServiceRequest> for SessionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let store = Arc::clone(&self.store);
        let config = Rc::clone(&self.config);

        Box::pin(async move {
            let session_key = req
                .cookie(&config.cookie_name)
                .map(|c| c.value().to_string())
                .filter(|key| !key.is_empty());

            let state = match &session_key {
                Some(key) => load_state(store.as_ref(), key).await,
                None => SessionState::new(),
            };

            let session = Session::new(state);
            req.extensions_mut().insert(session.clone());

            let mut res = service.call(req).await?;

            persist(store.as_ref(), &config, session_key, &session, &mut res).await;

            Ok(res)
        })
    }
}

async fn load_state(store: &dyn SessionStore, key: &str) -> SessionState {
    match store.load(key).await {
        Ok(Some(state)) => state,
        Ok(None) => SessionState::new(),
        Err(e) => {
            // Unreadable sessions start over empty
            tracing::warn!(error = %e, "Failed to load session");
            SessionState::new()
        }
    }
}

/// Write back a changed session. Store failures are logged; the response stands.
async fn persist<B>(
    store: &dyn SessionStore,
    config: &SessionConfig,
    session_key: Option<String>,
    session: &Session,
    res: &mut ServiceResponse<B>,
) {
    let key = match (session.status(), session_key) {
        (SessionStatus::Unchanged, _) => return,
        (SessionStatus::Changed, Some(key)) => key,
        (SessionStatus::Changed, None) => new_session_key(),
        (SessionStatus::Renewed, old) => {
            if let Some(old) = old {
                delete_quietly(store, &old).await;
            }
            new_session_key()
        }
        (SessionStatus::Purged, old) => {
            if let Some(old) = old {
                delete_quietly(store, &old).await;
            }
            let removal = session_cookie(config, String::new(), CookieDuration::ZERO);
            if let Err(e) = res.response_mut().add_cookie(&removal) {
                tracing::error!(error = %e, "Failed to expire session cookie");
            }
            return;
        }
    };

    if let Err(e) = store.save(&key, &session.state(), config.ttl).await {
        tracing::error!(error = %e, "Failed to save session");
        return;
    }

    let max_age = CookieDuration::seconds(i64::try_from(config.ttl.as_secs()).unwrap_or(i64::MAX));
    if let Err(e) = res
        .response_mut()
        .add_cookie(&session_cookie(config, key, max_age))
    {
        tracing::error!(error = %e, "Failed to set session cookie");
    }
}

async fn delete_quietly(store: &dyn SessionStore, key: &str) {
    if let Err(e) = store.delete(key).await {
        tracing::warn!(error = %e, "Failed to delete session");
    }
}

fn new_session_key() -> String {
    Uuid::new_v4().simple().to_string()
}

fn session_cookie(config: &SessionConfig, value: String, max_age: CookieDuration) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), value)
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .finish()
}
