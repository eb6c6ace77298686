//! Domain entities - the core business objects.

mod pending_delete;
mod post;
mod user;

pub use pending_delete::{ConfirmChoice, PendingDelete};
pub use post::Post;
pub use user::{User, mask_email};
