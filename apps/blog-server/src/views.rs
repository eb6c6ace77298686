//! Page models rendered through askama templates.

use actix_web::{HttpResponse, http::header::ContentType};
use askama::Template;
use chrono::{DateTime, Utc};

use blog_core::domain::Post;
use blog_shared::FormErrors;

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::session::{FlashMessage, Session};

/// Render a template into a `200 OK` HTML response.
pub fn render<T: Template>(template: &T) -> AppResult<HttpResponse> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}

/// Layout data shared by every page: who is signed in and pending notices.
#[derive(Debug, Default)]
pub struct PageContext {
    pub signed_in: bool,
    pub user_email: String,
    pub messages: Vec<FlashMessage>,
}

impl PageContext {
    /// Builds the layout context, consuming queued flash messages.
    pub fn new(identity: Option<&Identity>, session: &Session) -> Self {
        Self {
            signed_in: identity.is_some(),
            user_email: identity.map(|i| i.email.clone()).unwrap_or_default(),
            messages: session.take_messages(),
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y %H:%M").to_string()
}

/// A post as shown in listings and on its own page.
#[derive(Debug)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub text: String,
    pub published: String,
    pub edited: bool,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            text: post.text.clone(),
            published: format_timestamp(post.published_at),
            edited: post.updated_at > post.published_at,
        }
    }
}

pub fn post_views(posts: &[Post]) -> Vec<PostView> {
    posts.iter().map(PostView::from).collect()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub page: PageContext,
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "list.html")]
pub struct ListPage {
    pub page: PageContext,
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailPage {
    pub page: PageContext,
    pub post: PostView,
    pub author: String,
    pub is_owner: bool,
}

/// Shared create/update form.
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormPage {
    pub page: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub title: String,
    pub text: String,
    pub title_errors: Vec<String>,
    pub text_errors: Vec<String>,
}

impl PostFormPage {
    pub fn create(page: PageContext) -> Self {
        Self {
            page,
            heading: "New blog",
            action: "/posts/new".to_string(),
            submit_label: "Create",
            title: String::new(),
            text: String::new(),
            title_errors: Vec::new(),
            text_errors: Vec::new(),
        }
    }

    pub fn update(page: PageContext, post_id: &str) -> Self {
        Self {
            heading: "Edit blog",
            action: format!("/posts/{post_id}/edit"),
            submit_label: "Save",
            ..Self::create(page)
        }
    }

    pub fn with_values(mut self, title: &str, text: &str) -> Self {
        self.title = title.to_string();
        self.text = text.to_string();
        self
    }

    pub fn with_errors(mut self, errors: &FormErrors) -> Self {
        self.title_errors = errors.for_field("title");
        self.text_errors = errors.for_field("text");
        self
    }
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeletePage {
    pub page: PageContext,
    pub title: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub page: PageContext,
    pub email: String,
    pub next: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub page: PageContext,
    pub email: String,
    pub email_errors: Vec<String>,
    pub password_errors: Vec<String>,
    pub password_confirm_errors: Vec<String>,
}

impl RegisterPage {
    pub fn new(page: PageContext) -> Self {
        Self {
            page,
            email: String::new(),
            email_errors: Vec::new(),
            password_errors: Vec::new(),
            password_confirm_errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, email: &str, errors: &FormErrors) -> Self {
        self.email = email.to_string();
        self.email_errors = errors.for_field("email");
        self.password_errors = errors.for_field("password");
        self.password_confirm_errors = errors.for_field("password_confirm");
        self
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub page: PageContext,
    pub status: u16,
    pub title: String,
    pub detail: String,
}

impl ErrorPage {
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            page: PageContext::default(),
            status,
            title: title.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_post_text_is_escaped() {
        let post = Post::new(
            Uuid::new_v4(),
            "<script>alert(1)</script>".to_string(),
            "body".to_string(),
        );
        let page = IndexPage {
            page: PageContext::default(),
            posts: post_views(&[post]),
        };

        let html = page.render().unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_form_shows_field_errors() {
        let mut errors = FormErrors::new();
        errors.add("text", "This field is required.");

        let html = PostFormPage::create(PageContext::default())
            .with_values("Kept title", "")
            .with_errors(&errors)
            .render()
            .unwrap();

        assert!(html.contains("This field is required."));
        assert!(html.contains("Kept title"));
    }
}
