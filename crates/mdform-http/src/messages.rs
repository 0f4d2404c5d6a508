//! Flash messages attached to a request.
//!
//! Views add messages while handling a request; templates display them once.
//! Storage across requests (sessions, cookies) is left to the embedding
//! application, which reads the messages back with [`get_messages`].

use serde::{Deserialize, Serialize};

use crate::request::FormRequest;

/// Message severity levels.
///
/// Each level has a numeric value for comparison and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MessageLevel {
    /// Debug messages (level 10).
    Debug = 10,
    /// Informational messages (level 20).
    Info = 20,
    /// Success messages (level 25).
    Success = 25,
    /// Warning messages (level 30).
    Warning = 30,
    /// Error messages (level 40).
    Error = 40,
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A flash message for display on the rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The severity level of this message.
    pub level: MessageLevel,
    /// The message text.
    pub message: String,
    /// Extra CSS tags for template rendering (e.g. `danger`).
    pub extra_tags: String,
}

impl Message {
    /// The CSS tags for this message: the extra tags when set, else the level name.
    pub fn tags(&self) -> String {
        if self.extra_tags.is_empty() {
            self.level.to_string()
        } else {
            self.extra_tags.clone()
        }
    }
}

/// Adds a flash message to the request's message store.
pub fn add_message(request: &mut FormRequest, level: MessageLevel, message: &str) {
    add_message_with_tags(request, level, message, "");
}

/// Adds a flash message with extra CSS tags.
pub fn add_message_with_tags(
    request: &mut FormRequest,
    level: MessageLevel,
    message: &str,
    extra_tags: &str,
) {
    request.messages_mut().push(Message {
        level,
        message: message.to_string(),
        extra_tags: extra_tags.to_string(),
    });
}

/// Retrieves and consumes all pending messages from the request.
pub fn get_messages(request: &mut FormRequest) -> Vec<Message> {
    std::mem::take(request.messages_mut())
}

/// Convenience function: adds an info-level message.
pub fn info(request: &mut FormRequest, message: &str) {
    add_message(request, MessageLevel::Info, message);
}

/// Convenience function: adds an error-level message.
pub fn error(request: &mut FormRequest, message: &str) {
    add_message(request, MessageLevel::Error, message);
}
