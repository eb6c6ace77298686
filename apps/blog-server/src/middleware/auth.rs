//! Authentication extractors.
//!
//! The access token travels in the `access_token` cookie set at sign-in; a
//! `Bearer` header is accepted as well. Routes that take an [`Identity`]
//! redirect anonymous visitors to the login page.

use std::future::{Ready, ready};

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, ResponseError,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::Payload,
    http::{StatusCode, header},
    web,
};
use uuid::Uuid;

use blog_core::ports::{AuthError, TokenClaims};

use crate::state::AppState;

/// Cookie carrying the access token.
pub const AUTH_COOKIE: &str = "access_token";

/// Where anonymous visitors are sent.
pub const LOGIN_PATH: &str = "/accounts/login";

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn my_posts(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Authentication failure; answers with a redirect to the login page.
#[derive(Debug)]
pub struct AuthenticationError {
    pub reason: AuthError,
    /// Path the visitor was trying to reach.
    pub next: String,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        let location = if is_safe_redirect(&self.next) {
            format!("{LOGIN_PATH}?next={}", self.next)
        } else {
            LOGIN_PATH.to_string()
        };

        let mut response = HttpResponse::Found();
        response.insert_header((header::LOCATION, location));
        // A stale or forged token is dropped so the browser stops sending it
        if !matches!(self.reason, AuthError::MissingAuth) {
            response.cookie(auth_removal_cookie());
        }
        response.finish()
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|reason| {
            tracing::debug!(path = %req.path(), error = %reason, "Authentication required");
            AuthenticationError {
                reason,
                next: req.path().to_string(),
            }
        }))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let token = request_token(req).ok_or(AuthError::MissingAuth)?;
    state.tokens.validate_token(&token).map(Identity::from)
}

fn request_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

/// Cookie handing `token` to the browser for `max_age_secs`.
pub fn auth_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

/// Cookie that makes the browser forget the access token.
pub fn auth_removal_cookie() -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .finish()
}

/// Only same-origin absolute paths are followed after sign-in.
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && next
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/-_.".contains(c))
}
