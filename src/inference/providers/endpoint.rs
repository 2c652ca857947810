//! The site's own chat endpoint.
//!
//! The marketing site proxies completions through a single route that accepts
//! `{"messages": [...]}` and answers in chat-completions shape. No auth header,
//! no model selection; the backend owns both.

use std::time::Duration;

use async_trait::async_trait;
use log::info;

use super::{http_client, post_chat};
use crate::core::message::Message;
use crate::inference::{ChatRequest, Completion, CompletionError, CompletionService};

pub struct EndpointService {
    url: String,
    client: reqwest::Client,
}

impl EndpointService {
    /// Creates a client for the given endpoint URL (e.g. `http://localhost:3000/api/chatbot`).
    pub fn new(url: String, timeout: Option<Duration>) -> Self {
        Self {
            url,
            client: http_client(timeout),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionService for EndpointService {
    fn name(&self) -> &str {
        "endpoint"
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        info!("Endpoint request: url={}, message_count={}", self.url, messages.len());
        let request = ChatRequest {
            model: None,
            messages,
        };
        post_chat(&self.client, &self.url, None, &request).await
    }
}
