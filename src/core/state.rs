//! # Application State
//!
//! Core business state for the assistant. Domain logic only, no TUI types.
//! Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── service: Arc<dyn CompletionService>  // where turns are sent
//! ├── persona: Persona                     // prompt, greeting, fallback, name
//! ├── controller: TurnController           // the live session
//! └── status_message: String               // header status text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use log::info;

use crate::core::turn::{Persona, TurnController};
use crate::inference::CompletionService;

pub const STATUS_IDLE: &str = "Always Available";
pub const STATUS_PENDING: &str = "Thinking...";

pub struct App {
    pub service: Arc<dyn CompletionService>,
    pub persona: Persona,
    pub controller: TurnController,
    pub status_message: String,
}

impl App {
    pub fn new(service: Arc<dyn CompletionService>, persona: Persona) -> Self {
        let controller = TurnController::new(&persona);
        Self {
            service,
            persona,
            controller,
            status_message: STATUS_IDLE.to_string(),
        }
    }

    /// Replaces the session with a fresh one. Results still in flight for the
    /// old session will be discarded when they arrive.
    pub fn remount(&mut self) {
        let old = self.controller.session_id();
        self.controller = TurnController::new(&self.persona);
        info!(
            "Remounted: session {} replaced by {}",
            old,
            self.controller.session_id()
        );
    }

    pub fn refresh_status(&mut self) {
        let status = if self.controller.is_pending() {
            STATUS_PENDING
        } else {
            STATUS_IDLE
        };
        if self.status_message != status {
            self.status_message = status.to_string();
        }
    }
}
