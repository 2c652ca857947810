//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Simple display components that receive all data as parameters:
//! - `TitleBar`: header line with assistant name, status, and service
//! - `Message`: a single chat bubble
//! - `Launcher`: the closed-panel invitation
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: single-line text input
//! - `MessageList`: scrollable conversation view with layout caching
//!
//! ## Props-Based Data Flow
//!
//! Components receive external data as "props" (struct fields), not by
//! reaching into `App`. Dependencies stay explicit and components stay
//! testable with a `TestBackend`.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (header line)
//! ├── launcher.rs      (closed panel)
//! ├── message.rs       (single bubble)
//! ├── message_list.rs  (scrollable message container)
//! └── input_box/       (text input and cursor)
//! ```

mod launcher;
mod title_bar;
pub use launcher::Launcher;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
