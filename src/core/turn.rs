//! # Turn Controller
//!
//! Enforces the one-turn-at-a-time protocol for a single widget instance.
//!
//! ```text
//!            submit(text) accepted
//!   ┌──────┐ ─────────────────────▶ ┌─────────────────┐
//!   │ Idle │                        │ Pending(ticket) │
//!   └──────┘ ◀───────────────────── └─────────────────┘
//!            resolve(ticket, outcome)
//! ```
//!
//! The controller does no I/O of its own. [`submit`](TurnController::submit)
//! hands back the one request to send; whoever sends it reports the result
//! through [`resolve`](TurnController::resolve). An event loop can run the
//! request on a background task, while [`converse`](TurnController::converse)
//! runs a whole turn inline.
//!
//! Every accepted submit gets a [`Ticket`]. A result whose ticket does not
//! match the pending one (wrong session, old generation, or already resolved)
//! is dropped, so a reply can never land in a session it was not asked for.

use log::{debug, info, warn};
use uuid::Uuid;

use crate::core::message::{Message, Role};
use crate::core::store::ConversationStore;
use crate::inference::{Completion, CompletionError, CompletionService};

/// Identifies one in-flight turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub session: Uuid,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Pending(Ticket),
}

/// The single outbound request produced by an accepted submit.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub ticket: Ticket,
    pub messages: Vec<Message>,
}

/// What `resolve` did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The assistant reply was appended.
    Replied,
    /// The fallback apology was appended.
    Fallback,
    /// The ticket was not the pending one; nothing changed.
    Stale,
}

/// Text shown to the user, independent of what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub system_prompt: String,
    pub greeting: String,
    pub fallback_message: String,
}

pub struct TurnController {
    session: Uuid,
    store: ConversationStore,
    state: TurnState,
    generation: u64,
    fallback_message: String,
}

impl TurnController {
    /// Mounts a fresh session seeded with `[system, greeting]`.
    pub fn new(persona: &Persona) -> Self {
        let session = Uuid::new_v4();
        debug!("Mounting session {}", session);
        Self {
            session,
            store: ConversationStore::new(persona.system_prompt.clone(), persona.greeting.clone()),
            state: TurnState::Idle,
            generation: 0,
            fallback_message: persona.fallback_message.clone(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TurnState::Pending(_))
    }

    /// Starts a turn.
    ///
    /// Returns `None` (and changes nothing) if `text` is blank or a turn is
    /// already in flight. Otherwise appends the user message, moves to
    /// `Pending`, and returns the request carrying the full log. The caller
    /// clears its input buffer only when this returns `Some`.
    pub fn submit(&mut self, text: &str) -> Option<TurnRequest> {
        if text.trim().is_empty() {
            debug!("Ignoring blank submit");
            return None;
        }
        if let TurnState::Pending(ticket) = self.state {
            debug!("Ignoring submit while generation {} is pending", ticket.generation);
            return None;
        }

        self.store.append(Message::user(text));
        self.generation += 1;
        let ticket = Ticket {
            session: self.session,
            generation: self.generation,
        };
        self.state = TurnState::Pending(ticket);

        info!(
            "Turn {} started in session {} ({} messages)",
            ticket.generation,
            self.session,
            self.store.len()
        );

        Some(TurnRequest {
            ticket,
            messages: self.store.snapshot().to_vec(),
        })
    }

    /// Finishes the pending turn with the service's outcome.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        outcome: Result<Completion, CompletionError>,
    ) -> Resolution {
        if self.state != TurnState::Pending(ticket) {
            debug!(
                "Discarding stale result for session {} generation {} (state: {:?})",
                ticket.session, ticket.generation, self.state
            );
            return Resolution::Stale;
        }

        let resolution = match outcome {
            Ok(completion) => {
                info!(
                    "Turn {} replied: {} bytes, auxiliary={}",
                    ticket.generation,
                    completion.content.len(),
                    completion.auxiliary.is_some()
                );
                self.store.append(Message::assistant_with_auxiliary(
                    completion.content,
                    completion.auxiliary,
                ));
                Resolution::Replied
            }
            Err(e) => {
                warn!(
                    "Turn {} failed ({:?}): {}",
                    ticket.generation,
                    e.kind(),
                    e
                );
                self.store
                    .append(Message::assistant(self.fallback_message.clone()));
                Resolution::Fallback
            }
        };

        self.state = TurnState::Idle;
        debug_assert_eq!(
            self.store.count(Role::User) + 1,
            self.store.count(Role::Assistant),
            "every user turn needs exactly one assistant reply"
        );
        resolution
    }

    /// Runs a whole turn inline: submit, one call to `service`, resolve.
    ///
    /// Returns how the turn resolved together with the appended assistant
    /// message, or `None` if the submit was rejected.
    pub async fn converse(
        &mut self,
        service: &dyn CompletionService,
        text: &str,
    ) -> Option<(Resolution, &Message)> {
        let request = self.submit(text)?;
        let outcome = service.complete(&request.messages).await;
        let resolution = self.resolve(request.ticket, outcome);
        self.store.last().map(|reply| (resolution, reply))
    }
}
