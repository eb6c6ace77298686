//! # Blog Shared
//!
//! Form payloads submitted by the browser, and their validation.

pub mod forms;

pub use forms::{
    ConfirmForm, FieldError, FormErrors, LoginForm, PostForm, RegisterForm, ValidPost,
};
