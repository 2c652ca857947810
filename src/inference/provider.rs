use std::fmt;

use async_trait::async_trait;

use super::types::Completion;
use crate::core::message::Message;

/// Errors that can occur while asking the completion service for a reply.
/// Every variant ends up as the same fallback message in the conversation;
/// the detail only goes to the log.
#[derive(Debug)]
pub enum CompletionError {
    /// Service misconfigured (missing API key, bad URL).
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Service answered with a non-success status.
    Api { status: u16, message: String },
    /// Body was missing, malformed, or had no assistant content.
    Parse(String),
}

/// The two failure classes a turn can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Protocol,
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompletionError::Config(_)
            | CompletionError::Network(_)
            | CompletionError::Api { .. } => FailureKind::Transport,
            CompletionError::Parse(_) => FailureKind::Protocol,
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Config(msg) => write!(f, "config error: {msg}"),
            CompletionError::Network(msg) => write!(f, "network error: {msg}"),
            CompletionError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            CompletionError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for CompletionError {}

/// A remote endpoint that turns a conversation log into one assistant reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the name of the service, for logs and the status line.
    fn name(&self) -> &str;

    /// Sends the full ordered log and waits for a single reply.
    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(CompletionError::Network("x".into()).kind(), FailureKind::Transport);
        assert_eq!(
            CompletionError::Api { status: 500, message: "boom".into() }.kind(),
            FailureKind::Transport
        );
        assert_eq!(CompletionError::Config("no key".into()).kind(), FailureKind::Transport);
        assert_eq!(CompletionError::Parse("no content".into()).kind(), FailureKind::Protocol);
    }

    #[test]
    fn test_display_includes_status() {
        let err = CompletionError::Api { status: 502, message: "bad gateway".into() };
        assert_eq!(err.to_string(), "API error (HTTP 502): bad gateway");
    }
}
