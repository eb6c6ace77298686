//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains posts, users, the delete confirmation state and the
//! ports infrastructure must implement. It performs no I/O.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
