//! # Conversation Store
//!
//! Owns the ordered message log for one widget instance.
//!
//! The log always starts with exactly one `system` message and only ever grows:
//! `append` is the single mutation primitive and there is no way to remove or
//! rewrite an entry. Reads (`snapshot`, `visible`) borrow the live vector, so
//! they always see every append made before the call.

use crate::core::message::{Message, Role};

#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    /// Creates the initial log: `[system:<prompt>, assistant:<greeting>]`.
    pub fn new(system_prompt: impl Into<String>, greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::assistant(greeting)],
        }
    }

    /// Appends a message to the end of the log.
    ///
    /// `Message` has no public `system` constructor, so the leading directive
    /// can never be duplicated from outside the crate.
    pub fn append(&mut self, message: Message) {
        debug_assert!(message.role() != Role::System, "system message appended twice");
        self.messages.push(message);
    }

    /// The full ordered log, system directive included. Used for outbound requests.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Messages shown to the user: everything except the system directive.
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role() != Role::System)
    }

    /// Same as [`visible`](Self::visible), paired with each message's log index.
    /// The index is a stable identity because the log is append-only.
    pub fn visible_indexed(&self) -> impl Iterator<Item = (usize, &Message)> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role() != Role::System)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role() == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConversationStore {
        ConversationStore::new("prompt", "greeting")
    }

    #[test]
    fn test_initial_content_is_system_then_greeting() {
        let store = store();
        let log = store.snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role(), Role::System);
        assert_eq!(log[0].content(), "prompt");
        assert_eq!(log[1].role(), Role::Assistant);
        assert_eq!(log[1].content(), "greeting");
    }

    #[test]
    fn test_visible_hides_system() {
        let store = store();
        let visible: Vec<&Message> = store.visible().collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].role(), Role::Assistant);
        assert_eq!(visible[0].content(), "greeting");
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = store();
        store.append(Message::user("one"));
        store.append(Message::assistant("two"));
        store.append(Message::user("three"));

        let contents: Vec<&str> = store.snapshot().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["prompt", "greeting", "one", "two", "three"]);
    }

    #[test]
    fn test_snapshot_sees_appends_from_same_turn() {
        let mut store = store();
        store.append(Message::user("hello"));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.last().map(|m| m.content()), Some("hello"));
    }

    #[test]
    fn test_visible_indexed_uses_log_positions() {
        let mut store = store();
        store.append(Message::user("hi"));
        let indices: Vec<usize> = store.visible_indexed().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_single_system_message() {
        let mut store = store();
        store.append(Message::user("a"));
        store.append(Message::assistant("b"));
        assert_eq!(store.count(Role::System), 1);
        assert_eq!(store.snapshot()[0].role(), Role::System);
    }
}
