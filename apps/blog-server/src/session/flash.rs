//! One-shot notices carried across a redirect.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Session;

const MESSAGES_KEY: &str = "_messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Danger,
}

impl fmt::Display for FlashLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Danger => "danger",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl Session {
    /// Queue a message for the next rendered page.
    pub fn flash(&self, level: FlashLevel, text: impl Into<String>) {
        let mut messages = self.peek_messages();
        messages.push(FlashMessage {
            level,
            text: text.into(),
        });
        if let Err(e) = self.insert(MESSAGES_KEY, messages) {
            tracing::error!(error = %e, "Failed to queue flash message");
        }
    }

    pub fn flash_success(&self, text: impl Into<String>) {
        self.flash(FlashLevel::Success, text);
    }

    pub fn flash_info(&self, text: impl Into<String>) {
        self.flash(FlashLevel::Info, text);
    }

    pub fn flash_error(&self, text: impl Into<String>) {
        self.flash(FlashLevel::Danger, text);
    }

    /// Take every queued message, leaving none behind.
    pub fn take_messages(&self) -> Vec<FlashMessage> {
        let messages = self.peek_messages();
        self.remove(MESSAGES_KEY);
        messages
    }

    fn peek_messages(&self) -> Vec<FlashMessage> {
        match self.get::<Vec<FlashMessage>>(MESSAGES_KEY) {
            Ok(messages) => messages.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable flash messages");
                Vec::new()
            }
        }
    }
}
