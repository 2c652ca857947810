//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Panel
//!
//! The chat lives in a panel that can be closed (launcher line) or open
//! (header, message list, input). Closing keeps the session and any request
//! in flight; Ctrl+N remounts with a fresh session instead.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (a reply is pending): draws every ~80ms for the pulsing
//!   "Thinking" bubble.
//! - **Idle**: sleeps up to 500ms, only redraws on events, background
//!   results, or terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::state::App;
use crate::core::turn::TurnRequest;
use crate::inference::CompletionService;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    /// Panel open (chat visible) or closed (launcher)
    pub open: bool,
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    // Animation state
    pub pulse_value: f32,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            open: false,
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            pulse_value: 0.0,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is harmlessly ignored by terminals without it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Routes one terminal event through the panel and components.
///
/// Returns the effect the event loop must carry out. The input buffer is
/// cleared only when the controller accepted the text and a request must be
/// dispatched.
pub fn handle_tui_event(app: &mut App, tui: &mut TuiState, event: TuiEvent) -> Effect {
    match event {
        TuiEvent::ForceQuit => return update(app, Action::Quit),
        TuiEvent::ToggleWidget => {
            tui.open = !tui.open;
            debug!("Panel {}", if tui.open { "opened" } else { "closed" });
            return Effect::None;
        }
        TuiEvent::Resize => return Effect::None,
        _ => {}
    }

    if !tui.open {
        // Enter on the launcher opens the panel; everything else waits
        if event == TuiEvent::Submit {
            tui.open = true;
        }
        return Effect::None;
    }

    match event {
        TuiEvent::Escape => {
            tui.open = false;
            Effect::None
        }
        TuiEvent::NewConversation => {
            let effect = update(app, Action::Remount);
            tui.message_list = MessageListState::new();
            effect
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
            Effect::None
        }
        _ => match tui.input_box.handle_event(&event) {
            Some(InputEvent::Submit(text)) => {
                let effect = update(app, Action::Submit(text));
                if matches!(effect, Effect::Dispatch(_)) {
                    tui.input_box.clear();
                    tui.message_list.stick_to_bottom = true;
                }
                effect
            }
            Some(InputEvent::ContentChanged) | None => Effect::None,
        },
    }
}

pub fn run(mut app: App) -> std::io::Result<()> {
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    loop {
        let animating = app.controller.is_pending();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            let spinner_frame = (elapsed * 4.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short when animating (~12fps), long when idle
        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match handle_tui_event(&mut app, &mut tui, event) {
                Effect::Quit => should_quit = true,
                Effect::Dispatch(request) => {
                    spawn_request(app.service.clone(), request, tx.clone());
                }
                Effect::None => {}
            }
        }

        if should_quit {
            break;
        }

        // Results from background requests
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            match update(&mut app, action) {
                Effect::Quit => should_quit = true,
                Effect::Dispatch(request) => {
                    spawn_request(app.service.clone(), request, tx.clone());
                }
                Effect::None => {}
            }
        }

        if should_quit {
            break;
        }
    }

    ratatui::restore();
    Ok(())
}

/// Runs one request on a background task and reports back with
/// `Action::CompletionReady`. The ticket travels with the result, so a reply
/// for a remounted session is recognised as stale when it lands.
fn spawn_request(
    service: Arc<dyn CompletionService>,
    request: TurnRequest,
    tx: mpsc::Sender<Action>,
) -> tokio::task::JoinHandle<()> {
    info!(
        "Spawning {} request: generation={}, message_count={}",
        service.name(),
        request.ticket.generation,
        request.messages.len()
    );
    tokio::spawn(async move {
        let outcome = service.complete(&request.messages).await;
        let ticket = request.ticket;
        if tx.send(Action::CompletionReady { ticket, outcome }).is_err() {
            warn!(
                "Failed to deliver completion for generation {}: receiver dropped",
                ticket.generation
            );
        }
    })
}
