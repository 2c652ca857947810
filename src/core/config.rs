//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.aurith/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Provider;
use crate::core::turn::Persona;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AurithConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub provider: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AssistantConfig {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<String>,
    pub greeting: Option<String>,
    pub fallback_message: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:3000/api/chatbot";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = crate::inference::providers::DEFAULT_OPENROUTER_BASE_URL;
pub const DEFAULT_MODEL: &str = "openrouter/auto";
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_ASSISTANT_NAME: &str = "Aurith AI";

pub const DEFAULT_FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

pub const DEFAULT_GREETING: &str = "👋 **Hello! I'm your Aurith AI assistant.**

How can I help automate or optimize your business today?";

const DEFAULT_SYSTEM_PROMPT: &str = "You are Aurith AI, a friendly and expert automation consultant for businesses. \
You help users discover how to automate, optimize, and scale their business using modern AI solutions.

Aurith AI specializes in:
- Smart Chatbots & Virtual Assistants
- RAG AI Search & Knowledge Retrieval
- Predictive Analytics & Insights
- Smart CRMs & Recruiting Forms
- Data Automation & Integration
- Image, Voice, and Text AI Processing
- Staff Augmentation & Customer Service Bots

Always provide clear, helpful, and inspiring advice about how these solutions can save time, \
increase efficiency, and grow a business.

Greet users warmly, answer questions in detail, and encourage them to ask about any business \
process they want to automate. You are available 24/7 and up-to-date with the latest in AI and \
automation. Your name is Aurith AI.";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider: Provider,
    pub persona: Persona,
    pub log_level: String,
    pub endpoint_url: String,
    /// `None` waits as long as the transport allows.
    pub request_timeout: Option<Duration>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub model: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.aurith`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".aurith"))
}

/// Returns the path to `~/.aurith/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.aurith/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `AurithConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<AurithConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(AurithConfig::default());
        }
    };
    load_config_from(&path)
}

/// Same as [`load_config`] for an explicit path.
pub fn load_config_from(path: &Path) -> Result<AurithConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(AurithConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AurithConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Aurith Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# provider = "endpoint"              # "endpoint" or "open-router"
# log_level = "debug"                # "error", "warn", "info", "debug", "trace"

# [assistant]
# name = "Aurith AI"
# system_prompt = "You are Aurith AI, ..."
# system_prompt_file = "system.md"   # Path relative to ~/.aurith/
# greeting = "Hello! How can I help?"
# fallback_message = "Sorry, I encountered an error. Please try again."

# [endpoint]
# url = "http://localhost:3000/api/chatbot"   # Or set AURITH_ENDPOINT_URL
# request_timeout_secs = 60                   # Unset = no timeout

# [openrouter]
# api_key = "sk-or-..."              # Or set OPENROUTER_API_KEY env var
# base_url = "https://openrouter.ai/api/v1"
# model = "openrouter/auto"          # Or set AURITH_MODEL
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_provider` and `cli_endpoint` are from CLI flags (None = not specified).
pub fn resolve(
    config: &AurithConfig,
    cli_provider: Option<Provider>,
    cli_endpoint: Option<&str>,
) -> ResolvedConfig {
    // Provider: CLI → env → config → default
    let provider = cli_provider
        .or_else(|| std::env::var("AURITH_PROVIDER").ok().and_then(|s| parse_provider(&s)))
        .or_else(|| config.general.provider.as_deref().and_then(parse_provider))
        .unwrap_or_default();

    // Endpoint URL: CLI → env → config → default
    let endpoint_url = cli_endpoint
        .map(|s| s.to_string())
        .or_else(|| std::env::var("AURITH_ENDPOINT_URL").ok())
        .or_else(|| config.endpoint.url.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_string());

    // Timeout: env → config → none. Zero also means none.
    let request_timeout = std::env::var("AURITH_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .or(config.endpoint.request_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    // Model: env → config → default
    let model = std::env::var("AURITH_MODEL")
        .ok()
        .or_else(|| config.openrouter.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // OpenRouter API key: env → config
    let openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
        .ok()
        .or_else(|| config.openrouter.api_key.clone());

    // OpenRouter base URL: env → config → default
    let openrouter_base_url = std::env::var("OPENROUTER_BASE_URL")
        .ok()
        .or_else(|| config.openrouter.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string());

    ResolvedConfig {
        provider,
        persona: persona(config),
        log_level: config
            .general
            .log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        endpoint_url,
        request_timeout,
        openrouter_api_key,
        openrouter_base_url,
        model,
    }
}

fn parse_provider(name: &str) -> Option<Provider> {
    let parsed = Provider::from_str(name.trim(), true).ok();
    if parsed.is_none() {
        warn!("Unknown provider '{}', ignoring", name);
    }
    parsed
}

/// Builds the persona from the `[assistant]` section, falling back to defaults.
pub fn persona(config: &AurithConfig) -> Persona {
    let assistant = &config.assistant;
    Persona {
        name: assistant
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string()),
        system_prompt: resolve_system_prompt(assistant, config_dir().as_deref()),
        greeting: assistant
            .greeting
            .clone()
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        fallback_message: assistant
            .fallback_message
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_MESSAGE.to_string()),
    }
}

/// Resolves the system prompt: inline wins over file, both win over default.
/// `system_prompt_file` is relative to `base`.
fn resolve_system_prompt(assistant: &AssistantConfig, base: Option<&Path>) -> String {
    if let Some(ref prompt) = assistant.system_prompt {
        return prompt.clone();
    }

    if let Some(ref file) = assistant.system_prompt_file
        && let Some(base) = base
    {
        let prompt_path = base.join(file);
        match fs::read_to_string(&prompt_path) {
            Ok(contents) => {
                let trimmed = contents.trim().to_string();
                if !trimmed.is_empty() {
                    info!("Loaded system prompt from {}", prompt_path.display());
                    return trimmed;
                }
                warn!("System prompt file is empty: {}", prompt_path.display());
            }
            Err(e) => {
                warn!(
                    "Failed to read system prompt file {}: {}",
                    prompt_path.display(),
                    e
                );
            }
        }
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aurith-config-{}-{}", name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config_is_empty() {
        let config = AurithConfig::default();
        assert!(config.general.provider.is_none());
        assert!(config.endpoint.url.is_none());
        assert!(config.assistant.greeting.is_none());
    }

    #[test]
    fn test_persona_defaults() {
        let persona = persona(&AurithConfig::default());
        assert_eq!(persona.name, DEFAULT_ASSISTANT_NAME);
        assert!(persona.system_prompt.starts_with("You are Aurith AI"));
        assert!(persona.greeting.contains("Hello! I'm your Aurith AI assistant."));
        assert_eq!(persona.fallback_message, DEFAULT_FALLBACK_MESSAGE);
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = AurithConfig {
            general: GeneralConfig {
                provider: Some("endpoint".to_string()),
                ..Default::default()
            },
            endpoint: EndpointConfig {
                url: Some("http://from-config/api".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some(Provider::OpenRouter), Some("http://from-cli/api"));
        assert_eq!(resolved.provider, Provider::OpenRouter);
        assert_eq!(resolved.endpoint_url, "http://from-cli/api");
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = AurithConfig {
            assistant: AssistantConfig {
                name: Some("Helper".to_string()),
                greeting: Some("Hi.".to_string()),
                system_prompt: Some("Custom prompt.".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve(&config, None, None);
        assert_eq!(resolved.persona.name, "Helper");
        assert_eq!(resolved.persona.greeting, "Hi.");
        assert_eq!(resolved.persona.system_prompt, "Custom prompt.");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = AurithConfig {
            endpoint: EndpointConfig {
                request_timeout_secs: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        if std::env::var("AURITH_REQUEST_TIMEOUT_SECS").is_err() {
            assert_eq!(resolve(&config, None, None).request_timeout, None);
        }
    }

    #[test]
    fn test_parse_provider_names() {
        assert_eq!(parse_provider("endpoint"), Some(Provider::Endpoint));
        assert_eq!(parse_provider("open-router"), Some(Provider::OpenRouter));
        assert_eq!(parse_provider("OpenRouter"), Some(Provider::OpenRouter));
        assert_eq!(parse_provider("lmstudio"), None);
    }

    #[test]
    fn test_toml_parses_all_sections() {
        let toml_str = r#"
[general]
provider = "open-router"
log_level = "info"

[assistant]
name = "Aurith"
fallback_message = "Oops."

[endpoint]
url = "https://example.com/api/chatbot"
request_timeout_secs = 30

[openrouter]
api_key = "sk-or-test"
model = "some/model"
"#;
        let config: AurithConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.provider.as_deref(), Some("open-router"));
        assert_eq!(config.general.log_level.as_deref(), Some("info"));
        assert_eq!(config.assistant.fallback_message.as_deref(), Some("Oops."));
        assert_eq!(config.endpoint.request_timeout_secs, Some(30));
        assert_eq!(config.openrouter.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(config.openrouter.model.as_deref(), Some("some/model"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[endpoint]
url = "http://localhost:8080/chat"
"#;
        let config: AurithConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.endpoint.url.as_deref(), Some("http://localhost:8080/chat"));
        assert!(config.endpoint.request_timeout_secs.is_none());
        assert!(config.general.provider.is_none());
    }

    #[test]
    fn test_generated_default_parses_as_empty() {
        let dir = scratch_dir("generate");
        let path = dir.join("config.toml");
        let first = load_config_from(&path).unwrap();
        assert!(first.general.provider.is_none());
        assert!(path.exists());

        let reloaded = load_config_from(&path).unwrap();
        assert!(reloaded.endpoint.url.is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = scratch_dir("malformed");
        let path = dir.join("config.toml");
        fs::write(&path, "[general\nprovider = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_system_prompt_file_and_inline_precedence() {
        let dir = scratch_dir("prompt");
        fs::write(dir.join("system.md"), "  From file.  \n").unwrap();

        let from_file = AssistantConfig {
            system_prompt_file: Some("system.md".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_system_prompt(&from_file, Some(&dir)), "From file.");

        let inline = AssistantConfig {
            system_prompt: Some("Inline wins.".to_string()),
            system_prompt_file: Some("system.md".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_system_prompt(&inline, Some(&dir)), "Inline wins.");

        let missing = AssistantConfig {
            system_prompt_file: Some("nope.md".to_string()),
            ..Default::default()
        };
        assert!(resolve_system_prompt(&missing, Some(&dir)).starts_with("You are Aurith AI"));
        let _ = fs::remove_dir_all(dir);
    }
}
