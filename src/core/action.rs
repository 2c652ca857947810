//! # Actions
//!
//! Everything that can happen to the assistant becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The completion service answers? That's `Action::CompletionReady`.
//!
//! `update()` applies an action to the [`App`] and returns an [`Effect`]
//! describing the I/O the caller must perform. No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::debug;

use crate::core::state::App;
use crate::core::turn::{Resolution, Ticket, TurnRequest};
use crate::inference::{Completion, CompletionError};

#[derive(Debug)]
pub enum Action {
    /// The user pressed Enter with this input.
    Submit(String),
    /// A background request finished.
    CompletionReady {
        ticket: Ticket,
        outcome: Result<Completion, CompletionError>,
    },
    /// Discard the session and start over.
    Remount,
    Quit,
}

#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    /// Send this request to the completion service and report back with
    /// `Action::CompletionReady`.
    Dispatch(TurnRequest),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    let effect = match action {
        Action::Submit(text) => match app.controller.submit(&text) {
            Some(request) => Effect::Dispatch(request),
            None => Effect::None,
        },
        Action::CompletionReady { ticket, outcome } => {
            if app.controller.resolve(ticket, outcome) == Resolution::Stale {
                debug!("Completion for generation {} arrived too late", ticket.generation);
            }
            Effect::None
        }
        Action::Remount => {
            app.remount();
            Effect::None
        }
        Action::Quit => Effect::Quit,
    };
    app.refresh_status();
    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::state::{STATUS_IDLE, STATUS_PENDING};
    use crate::test_support::{test_app, test_persona};

    fn reply(content: &str) -> Result<Completion, CompletionError> {
        Ok(Completion {
            content: content.to_string(),
            auxiliary: None,
        })
    }

    fn dispatch(app: &mut App, text: &str) -> TurnRequest {
        match update(app, Action::Submit(text.to_string())) {
            Effect::Dispatch(request) => request,
            other => panic!("expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_dispatches_and_sets_thinking() {
        let mut app = test_app();
        let request = dispatch(&mut app, "hello");
        assert_eq!(request.messages.len(), 3);
        assert_eq!(app.status_message, STATUS_PENDING);
    }

    #[test]
    fn test_blank_submit_has_no_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Submit("  ".into())), Effect::None);
        assert_eq!(app.status_message, STATUS_IDLE);
    }

    #[test]
    fn test_submit_while_pending_has_no_effect() {
        let mut app = test_app();
        dispatch(&mut app, "first");
        assert_eq!(update(&mut app, Action::Submit("second".into())), Effect::None);
        assert_eq!(app.controller.store().count(Role::User), 1);
    }

    #[test]
    fn test_completion_ready_appends_and_goes_idle() {
        let mut app = test_app();
        let request = dispatch(&mut app, "hello");
        let effect = update(
            &mut app,
            Action::CompletionReady {
                ticket: request.ticket,
                outcome: reply("Hi!"),
            },
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(app.status_message, STATUS_IDLE);
        assert_eq!(app.controller.store().last().map(|m| m.content()), Some("Hi!"));
    }

    #[test]
    fn test_failure_shows_fallback() {
        let mut app = test_app();
        let request = dispatch(&mut app, "hello");
        update(
            &mut app,
            Action::CompletionReady {
                ticket: request.ticket,
                outcome: Err(CompletionError::Api {
                    status: 502,
                    message: "bad gateway".into(),
                }),
            },
        );
        assert_eq!(
            app.controller.store().last().map(|m| m.content().to_string()),
            Some(test_persona().fallback_message)
        );
    }

    #[test]
    fn test_remount_discards_session_and_drops_late_result() {
        let mut app = test_app();
        let old_session = app.controller.session_id();
        let request = dispatch(&mut app, "hello");

        update(&mut app, Action::Remount);
        assert_ne!(app.controller.session_id(), old_session);
        assert_eq!(app.controller.store().len(), 2);
        assert_eq!(app.status_message, STATUS_IDLE);

        update(
            &mut app,
            Action::CompletionReady {
                ticket: request.ticket,
                outcome: reply("late"),
            },
        );
        assert_eq!(app.controller.store().len(), 2);
        assert!(!app.controller.is_pending());
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
