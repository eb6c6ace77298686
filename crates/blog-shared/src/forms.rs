//! HTML form payloads.
//!
//! Every field defaults to an empty string so that a missing field reaches
//! validation and is reported next to the input instead of failing extraction.

use serde::{Deserialize, Serialize};

/// Longest accepted post title, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// Shortest accepted password, in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// A validation failure attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All validation failures of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field, in the order they were added.
    pub fn for_field(&self, field: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Accounts are keyed by email compared without regard to case.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn require(errors: &mut FormErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
        false
    } else {
        true
    }
}

/// Create/update form for a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub title: String,
    pub text: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::new();
        let title = self.title.trim();

        if require(&mut errors, "title", title) && title.chars().count() > TITLE_MAX_CHARS {
            errors.add(
                "title",
                format!("Ensure this value has at most {TITLE_MAX_CHARS} characters."),
            );
        }
        require(&mut errors, "text", &self.text);

        errors.into_result().map(|()| ValidPost {
            title: title.to_string(),
            text: self.text.clone(),
        })
    }
}

/// Sign-in form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Path to return to after signing in.
    #[serde(default)]
    pub next: String,
}

impl LoginForm {
    /// Email as stored: trimmed and lowercased.
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        require(&mut errors, "email", &self.email);
        require(&mut errors, "password", &self.password);
        errors.into_result()
    }
}

/// Account creation form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if require(&mut errors, "email", &self.email) && !self.email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        if require(&mut errors, "password", &self.password)
            && self.password.chars().count() < PASSWORD_MIN_CHARS
        {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN_CHARS} characters."),
            );
        }
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        errors.into_result()
    }
}

/// Answer on the delete confirmation page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub choice: String,
}
