//! Wire types shared by the completion service clients.
//!
//! The response shape is decided once here: [`parse_completion`] turns a raw
//! body into either a [`Completion`] or a `CompletionError::Parse`, and nothing
//! downstream ever looks at JSON again.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::CompletionError;
use crate::core::message::Message;

/// A successfully extracted assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub auxiliary: Option<Value>,
}

/// Request body: the full ordered log, plus a model id for services that need one.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [Message],
}

#[derive(Deserialize, Debug)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_details: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

/// Accepted response bodies: OpenAI-style `choices[0].message`, or a bare `message`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ChatResponse {
    Choices { choices: Vec<Choice> },
    Single { message: ReplyMessage },
}

/// Extracts the assistant reply from a response body.
pub fn parse_completion(body: &str) -> Result<Completion, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::Parse(format!("unexpected response shape: {e}")))?;

    let reply = match response {
        ChatResponse::Choices { choices } => choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .ok_or_else(|| CompletionError::Parse("response has no choices".to_string()))?,
        ChatResponse::Single { message } => message,
    };

    let content = reply
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CompletionError::Parse("reply has no content".to_string()))?;

    Ok(Completion {
        content,
        auxiliary: reply.reasoning_details.filter(|v| !v.is_null()),
    })
}
