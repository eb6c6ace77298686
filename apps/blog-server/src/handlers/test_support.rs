//! Helpers for exercising the routes against in-memory storage.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test;
use chrono::{DateTime, Utc};

use blog_core::domain::{Post, User};
use blog_core::ports::{BaseRepository, PasswordService, SessionState, SessionStore};
use blog_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemorySessionStore, InMemoryUserRepository,
    JwtConfig, JwtTokenService,
};

use crate::middleware::auth::auth_cookie;
use crate::session::SessionConfig;
use crate::state::AppState;

/// Build the full route table around a [`TestApp`].
macro_rules! blog_service {
    ($app:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap($crate::session::SessionMiddleware::new(
                    $app.sessions.clone(),
                    $app.session_config.clone(),
                ))
                .app_data(actix_web::web::Data::new($app.state.clone()))
                .configure($crate::handlers::configure_routes),
        )
        .await
    };
}
pub(crate) use blog_service;

pub(crate) struct TestApp {
    pub state: AppState,
    pub posts: Arc<InMemoryPostRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub sessions: Arc<InMemorySessionStore>,
    pub session_config: SessionConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let posts = Arc::new(InMemoryPostRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let tokens = JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "blog-test".to_string(),
        });

        let state = AppState {
            posts: posts.clone(),
            users: users.clone(),
            tokens: Arc::new(tokens),
            passwords: Arc::new(Argon2PasswordService::new()),
            sessions: sessions.clone(),
        };

        Self {
            state,
            posts,
            users,
            sessions,
            session_config: SessionConfig::default(),
        }
    }

    /// A stored user who can only sign in through a minted token.
    pub async fn user(&self, email: &str) -> User {
        self.users
            .insert(User::new(email.to_string(), "not-a-hash".to_string()))
            .await
            .unwrap()
    }

    /// A stored user with a real password hash.
    pub async fn registered_user(&self, email: &str, password: &str) -> User {
        let hash = Argon2PasswordService::new().hash(password).unwrap();
        self.users
            .insert(User::new(email.to_string(), hash))
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, title: &str) -> Post {
        self.post_at(author, title, Utc::now()).await
    }

    pub async fn post_at(&self, author: &User, title: &str, at: DateTime<Utc>) -> Post {
        let mut post = Post::new(author.id, title.to_string(), format!("Body of {title}"));
        post.published_at = at;
        post.updated_at = at;
        self.posts.insert(post).await.unwrap()
    }

    /// Access token cookie signing in as `user`.
    pub fn auth_cookie(&self, user: &User) -> Cookie<'static> {
        let token = self.state.tokens.generate_token(user.id, &user.email).unwrap();
        auth_cookie(token, self.state.tokens.expiration_seconds())
    }

    /// Stored state behind a session cookie.
    pub async fn session_state(&self, cookie: &Cookie<'_>) -> SessionState {
        self.sessions
            .load(cookie.value())
            .await
            .unwrap()
            .unwrap_or_default()
    }

    /// The session cookie set by `res`, if any.
    pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
        res.response()
            .cookies()
            .find(|c| c.name() == SessionConfig::default().cookie_name && !c.value().is_empty())
            .map(|c| c.into_owned())
    }

    pub async fn body(res: ServiceResponse) -> String {
        String::from_utf8(test::read_body(res).await.to_vec()).unwrap()
    }
}

pub(crate) fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
