//! # Messages
//!
//! A `Message` is one entry of the conversation log. Once appended it is never
//! edited, so the type exposes read-only accessors and no setters.
//!
//! ```text
//! Message
//! ├── role: Role                  // system | user | assistant
//! ├── content: String             // raw markup text
//! └── auxiliary: Option<Value>    // opaque reasoning payload from the backend
//! ```
//!
//! Only the store can mint a `system` message; everything outside the crate
//! goes through [`Message::user`] or [`Message::assistant`].

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One immutable entry of the conversation log.
///
/// Serializes to the completion service wire form:
/// `{"role": "...", "content": "...", "reasoning_details": ...}`, with the
/// auxiliary payload omitted when absent.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(rename = "reasoning_details", skip_serializing_if = "Option::is_none")]
    auxiliary: Option<Value>,
}

impl Message {
    pub(crate) fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            auxiliary: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            auxiliary: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            auxiliary: None,
        }
    }

    /// An assistant reply carrying the backend's reasoning payload.
    pub fn assistant_with_auxiliary(content: impl Into<String>, auxiliary: Option<Value>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            auxiliary,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn auxiliary(&self) -> Option<&Value> {
        self.auxiliary.as_ref()
    }
}
