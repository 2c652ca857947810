//! HTTP clients for the completion service.
//!
//! Both clients speak the same request/response contract and differ only in
//! where they post and which headers they add, so the send/parse path lives here.

mod endpoint;
mod openrouter;

pub use endpoint::EndpointService;
pub use openrouter::{DEFAULT_BASE_URL as DEFAULT_OPENROUTER_BASE_URL, OpenRouterService};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::provider::{CompletionError, CompletionService};
use super::types::{ChatRequest, Completion, parse_completion};
use crate::Provider;
use crate::core::config::ResolvedConfig;

/// Build the completion service selected by a resolved config.
pub fn build_service(config: &ResolvedConfig) -> Result<Arc<dyn CompletionService>, CompletionError> {
    match config.provider {
        Provider::Endpoint => {
            info!("Using endpoint service at {}", config.endpoint_url);
            Ok(Arc::new(EndpointService::new(
                config.endpoint_url.clone(),
                config.request_timeout,
            )))
        }
        Provider::OpenRouter => {
            let api_key = config.openrouter_api_key.clone().ok_or_else(|| {
                CompletionError::Config(
                    "OpenRouter API key must be set (config file or OPENROUTER_API_KEY env var)"
                        .to_string(),
                )
            })?;
            info!("Using OpenRouter with model {}", config.model);
            Ok(Arc::new(OpenRouterService::new(
                api_key,
                Some(config.openrouter_base_url.clone()),
                config.model.clone(),
                config.request_timeout,
            )?))
        }
    }
}

/// Builds the shared reqwest client. `timeout` of `None` means the request may
/// wait as long as the transport allows.
pub(crate) fn http_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build HTTP client with timeout {:?}: {}", timeout, e);
        reqwest::Client::new()
    })
}

/// Posts one chat request and extracts the assistant reply.
pub(crate) async fn post_chat(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    request: &ChatRequest<'_>,
) -> Result<Completion, CompletionError> {
    let json_body = serde_json::to_string(request)
        .map_err(|e| CompletionError::Parse(format!("request serialization failed: {e}")))?;
    debug!("Chat request to {}: {} bytes", url, json_body.len());

    let mut builder = client
        .post(url)
        .header("Content-Type", "application/json")
        .body(json_body);
    if let Some(key) = bearer {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }

    let response = builder
        .send()
        .await
        .map_err(|e| CompletionError::Network(e.to_string()))?;

    debug!("Chat response status: {}", response.status());

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let err_body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Completion service error: {} - {}", status, err_body);
        return Err(CompletionError::Api {
            status,
            message: err_body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| CompletionError::Network(e.to_string()))?;
    debug!("Chat response body: {} bytes", body.len());

    parse_completion(&body)
}
