//! Account handlers: registration, sign-in and sign-out.

use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;

use blog_core::domain::{User, mask_email};
use blog_shared::{FormErrors, LoginForm, RegisterForm};

use super::{INDEX_PATH, LIST_PATH};
use crate::middleware::auth::{OptionalIdentity, auth_cookie, auth_removal_cookie, is_safe_redirect};
use crate::middleware::error::AppResult;
use crate::session::Session;
use crate::state::AppState;
use crate::views::{LoginPage, PageContext, RegisterPage, render};

const INVALID_LOGIN: &str = "Invalid email or password.";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    next: String,
}

/// Issue an access token for `user`, rotate the session key and redirect.
fn sign_in(state: &AppState, session: &Session, user: &User, location: &str) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.email)?;
    session.renew();

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(auth_cookie(token, state.tokens.expiration_seconds()))
        .finish())
}

/// GET /accounts/register
pub async fn register_form(
    session: Session,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    render(&RegisterPage::new(PageContext::new(
        identity.0.as_ref(),
        &session,
    )))
}

/// POST /accounts/register - create the account and sign in
pub async fn register(
    state: web::Data<AppState>,
    session: Session,
    identity: OptionalIdentity,
    form: web::Form<RegisterForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let email = form.normalized_email();

    let mut errors = form.validate().err().unwrap_or_default();
    if errors.for_field("email").is_empty() && state.users.find_by_email(&email).await?.is_some() {
        errors.add("email", "A user with that email already exists.");
    }

    if !errors.is_empty() {
        return render(
            &RegisterPage::new(PageContext::new(identity.0.as_ref(), &session))
                .with_errors(&email, &errors),
        );
    }

    let password_hash = state.passwords.hash(&form.password)?;
    let user = state.users.insert(User::new(email, password_hash)).await?;
    tracing::info!(user_id = %user.id, email = %user.masked_email(), "User registered");

    session.flash_success("Welcome! Your account has been created.");
    sign_in(&state, &session, &user, LIST_PATH)
}

/// GET /accounts/login
pub async fn login_form(
    session: Session,
    identity: OptionalIdentity,
    query: web::Query<LoginQuery>,
) -> AppResult<HttpResponse> {
    let next = query.into_inner().next;

    render(&LoginPage {
        page: PageContext::new(identity.0.as_ref(), &session),
        email: String::new(),
        next: if is_safe_redirect(&next) { next } else { String::new() },
        errors: Vec::new(),
    })
}

/// POST /accounts/login
pub async fn login(
    state: web::Data<AppState>,
    session: Session,
    identity: OptionalIdentity,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let email = form.normalized_email();

    let rejected = |errors: Vec<String>| {
        render(&LoginPage {
            page: PageContext::new(identity.0.as_ref(), &session),
            email: email.clone(),
            next: if is_safe_redirect(&form.next) {
                form.next.clone()
            } else {
                String::new()
            },
            errors,
        })
    };

    if let Err(errors) = form.validate() {
        return rejected(missing_fields(&errors));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        tracing::info!(email = %mask_email(&email), "Login failed: unknown email");
        return rejected(vec![INVALID_LOGIN.to_string()]);
    };

    if !state.passwords.verify(&form.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return rejected(vec![INVALID_LOGIN.to_string()]);
    }

    tracing::info!(user_id = %user.id, "User signed in");
    let location = if is_safe_redirect(&form.next) {
        form.next.as_str()
    } else {
        LIST_PATH
    };
    sign_in(&state, &session, &user, location)
}

fn missing_fields(errors: &FormErrors) -> Vec<String> {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect()
}

/// POST /accounts/logout - drop the session and the access token
pub async fn logout(session: Session, identity: OptionalIdentity) -> HttpResponse {
    if let Some(identity) = identity.0 {
        tracing::info!(user_id = %identity.user_id, "User signed out");
    }

    session.purge();
    session.flash_info("You have been logged out.");

    HttpResponse::Found()
        .insert_header((header::LOCATION, INDEX_PATH))
        .cookie(auth_removal_cookie())
        .finish()
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;

    use blog_core::ports::UserRepository;

    use super::super::test_support::{TestApp, blog_service, location};
    use super::*;
    use crate::middleware::auth::AUTH_COOKIE;

    fn auth_cookie_of<B>(res: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
        res.response()
            .cookies()
            .find(|c| c.name() == AUTH_COOKIE)
            .map(|c| c.value().to_string())
    }

    #[actix_rt::test]
    async fn test_register_creates_user_and_signs_in() {
        let app = TestApp::new();
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/register")
            .set_form([
                ("email", "new@example.com"),
                ("password", "correct horse"),
                ("password_confirm", "correct horse"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/posts");
        let token = auth_cookie_of(&res).unwrap();
        let claims = app.state.tokens.validate_token(&token).unwrap();
        assert_eq!(claims.email, "new@example.com");

        let user = app.users.find_by_email("new@example.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "correct horse");
    }

    #[actix_rt::test]
    async fn test_register_rejects_duplicate_email() {
        let app = TestApp::new();
        app.user("taken@example.com").await;
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/register")
            .set_form([
                ("email", "taken@example.com"),
                ("password", "correct horse"),
                ("password_confirm", "correct horse"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(TestApp::body(res).await.contains("A user with that email already exists."));
    }

    #[actix_rt::test]
    async fn test_register_rejects_short_password() {
        let app = TestApp::new();
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/register")
            .set_form([
                ("email", "short@example.com"),
                ("password", "short"),
                ("password_confirm", "short"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(TestApp::body(res).await.contains("Password must be at least 8 characters."));
        assert!(app.users.find_by_email("short@example.com").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_login_follows_safe_next() {
        let app = TestApp::new();
        app.registered_user("reader@example.com", "open sesame").await;
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/login")
            .set_form([
                ("email", "reader@example.com"),
                ("password", "open sesame"),
                ("next", "/posts/new"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/posts/new");
        assert!(auth_cookie_of(&res).is_some());
    }

    #[actix_rt::test]
    async fn test_login_ignores_offsite_next() {
        let app = TestApp::new();
        app.registered_user("reader@example.com", "open sesame").await;
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/login")
            .set_form([
                ("email", "reader@example.com"),
                ("password", "open sesame"),
                ("next", "//evil.example.com"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(location(&res), "/posts");
    }

    #[actix_rt::test]
    async fn test_email_case_is_ignored() {
        let app = TestApp::new();
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/register")
            .set_form([
                ("email", " Alice@Example.com "),
                ("password", "correct horse"),
                ("password_confirm", "correct horse"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(location(&res), "/posts");

        let user = app.users.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");

        let req = test::TestRequest::post()
            .uri("/accounts/register")
            .set_form([
                ("email", "ALICE@example.com"),
                ("password", "another horse"),
                ("password_confirm", "another horse"),
            ])
            .to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(TestApp::body(res).await.contains("A user with that email already exists."));

        let req = test::TestRequest::post()
            .uri("/accounts/login")
            .set_form([("email", "alice@example.com"), ("password", "correct horse")])
            .to_request();
        let res = test::call_service(&service, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert!(auth_cookie_of(&res).is_some());
    }

    #[actix_rt::test]
    async fn test_login_wrong_password() {
        let app = TestApp::new();
        app.registered_user("reader@example.com", "open sesame").await;
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/login")
            .set_form([("email", "reader@example.com"), ("password", "guess")])
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(auth_cookie_of(&res).is_none());
        assert!(TestApp::body(res).await.contains("Invalid email or password."));
    }

    #[actix_rt::test]
    async fn test_logout_clears_token_and_session() {
        let app = TestApp::new();
        let user = app.user("reader@example.com").await;
        let service = blog_service!(app);

        let req = test::TestRequest::post()
            .uri("/accounts/logout")
            .cookie(app.auth_cookie(&user))
            .to_request();
        let res = test::call_service(&service, req).await;

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/");
        assert_eq!(auth_cookie_of(&res).as_deref(), Some(""));
    }
}
