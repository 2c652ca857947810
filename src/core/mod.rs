//! # Core Application Logic
//!
//! The session engine. It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • ConversationStore    │
//!                    │  • TurnController       │
//!                    │  • render() pipeline    │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI.         │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │  One-shot  │
//!           │  Adapter   │              │   (--ask)  │
//!           │ (ratatui)  │              │            │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `Role` and `Message`, the unit of the conversation log
//! - [`store`]: `ConversationStore`, the append-only log
//! - [`turn`]: `TurnController`, one request per user turn
//! - [`render`]: assistant text → sanitized `RenderedDocument`
//! - [`state`]: the `App` struct, all application state in one place
//! - [`action`]: the `Action` enum and `update()` reducer
//! - [`config`]: config file, env, and CLI resolution

pub mod action;
pub mod config;
pub mod message;
pub mod render;
pub mod state;
pub mod store;
pub mod turn;
