//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::message::Message;
use crate::core::state::App;
use crate::core::turn::Persona;
use crate::inference::{Completion, CompletionError, CompletionService};

/// A completion service that plays back a fixed script of outcomes.
///
/// Once the script runs out every call fails with a network error.
pub struct ScriptedService {
    script: Mutex<VecDeque<Result<Completion, CompletionError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedService {
    pub fn new(script: Vec<Result<Completion, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<Vec<Message>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Network("script exhausted".into())))
    }
}

pub fn test_persona() -> Persona {
    Persona {
        name: "Test Assistant".to_string(),
        system_prompt: "You are a test assistant.".to_string(),
        greeting: "**Hello!** How can I help?".to_string(),
        fallback_message: "Sorry, I encountered an error. Please try again.".to_string(),
    }
}

/// Creates a test App backed by an empty script.
pub fn test_app() -> App {
    App::new(Arc::new(ScriptedService::failing()), test_persona())
}
