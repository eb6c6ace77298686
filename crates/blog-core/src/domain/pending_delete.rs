//! Two-step delete confirmation state.
//!
//! A delete request stages a [`PendingDelete`] in the session; the follow-up
//! request either confirms it, cancels it, or finds nothing staged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Post;

/// A post awaiting confirmed deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelete {
    pub pk: Uuid,
    pub title: String,
}

impl PendingDelete {
    /// Session key holding the pending entry.
    pub const SESSION_KEY: &'static str = "confirm";

    pub fn for_post(post: &Post) -> Self {
        Self {
            pk: post.id,
            title: post.title.clone(),
        }
    }
}

/// Answer submitted on the confirmation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Yes,
    Cancel,
}

impl ConfirmChoice {
    /// Parse the submitted button value. Anything but an explicit answer is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "Yes" => Some(Self::Yes),
            "Cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(ConfirmChoice::parse("Yes"), Some(ConfirmChoice::Yes));
        assert_eq!(ConfirmChoice::parse(" Cancel "), Some(ConfirmChoice::Cancel));
        assert_eq!(ConfirmChoice::parse("yes"), None);
        assert_eq!(ConfirmChoice::parse(""), None);
    }

    #[test]
    fn test_pending_delete_serializes_pk_and_title() {
        let post = Post::new(Uuid::new_v4(), "Hello".to_string(), "World".to_string());
        let pending = PendingDelete::for_post(&post);

        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["pk"], serde_json::json!(post.id));
        assert_eq!(value["title"], "Hello");

        let back: PendingDelete = serde_json::from_value(value).unwrap();
        assert_eq!(back, pending);
    }
}
