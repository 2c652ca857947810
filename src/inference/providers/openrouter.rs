//! OpenRouter chat completions, called directly.
//!
//! Useful when the site proxy is not running: same contract, plus a bearer key
//! and a model id in the body. Reasoning details the model returns ride along
//! on the assistant message and are sent back verbatim on the next turn.

use std::time::Duration;

use async_trait::async_trait;
use log::info;

use super::{http_client, post_chat};
use crate::core::message::Message;
use crate::inference::{ChatRequest, Completion, CompletionError, CompletionService};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterService {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenRouterService {
    /// Creates a new OpenRouter client.
    ///
    /// # Arguments
    /// * `api_key` - OpenRouter API key
    /// * `base_url` - Optional custom base URL (defaults to OpenRouter's API)
    /// * `model` - Model id sent with every request
    /// * `timeout` - Optional per-request deadline
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        timeout: Option<Duration>,
    ) -> Result<Self, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::Config(
                "OpenRouter API key is empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            client: http_client(timeout),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for OpenRouterService {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        info!(
            "OpenRouter request: model={}, message_count={}",
            self.model,
            messages.len()
        );
        let request = ChatRequest {
            model: Some(&self.model),
            messages,
        };
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        post_chat(&self.client, &url, Some(&self.api_key), &request).await
    }
}
