//! Aurith library exports for the binary and integration tests

use clap::ValueEnum;

pub mod core;
pub mod inference;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// Which completion service turns are sent to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// The site's own chat endpoint (`/api/chatbot`).
    #[default]
    Endpoint,
    /// OpenRouter chat completions, called directly.
    #[value(alias = "openrouter")]
    OpenRouter,
}
