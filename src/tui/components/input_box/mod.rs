//! # InputBox Component
//!
//! Single-line text input at the bottom of the chat panel.
//!
//! ## Responsibilities
//!
//! - Capture text input (typing, paste)
//! - Handle editing (backspace, delete, cursor movement)
//! - Emit a submit request on Enter
//! - Show the "Ask me anything..." placeholder while empty
//!
//! ## State Management
//!
//! The buffer is internal state. Submitting does not clear it: the parent
//! calls [`InputBox::clear`] once the turn controller accepts the text, so a
//! rejected submit (a reply still pending) keeps what the user typed.

mod cursor;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::{CursorState, HORIZONTAL_OVERHEAD, next_char_boundary, prev_char_boundary};

pub const PLACEHOLDER: &str = "Ask me anything...";
/// Fixed height: one text row plus borders.
pub const HEIGHT: u16 = 3;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User asked to submit the text (Enter pressed)
    Submit(String),
    /// Text or cursor changed
    ContentChanged,
}

/// Text input component.
///
/// # Props
///
/// - `pending`: a reply is in flight (dims the border)
///
/// # State
///
/// - `buffer`: current text being typed
/// - `cursor`: cursor position and horizontal scroll (see `CursorState`)
pub struct InputBox {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Whether a reply is in flight (Prop)
    pub pending: bool,
    cursor: CursorState,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pending: false,
            cursor: CursorState::new(),
        }
    }

    /// Empty the buffer after the parent accepted a submission.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor.reset();
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(HORIZONTAL_OVERHEAD);
        self.cursor.update_scroll(&self.buffer, inner_width);

        let border_style = if self.pending {
            Style::default().fg(Color::Green).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::Green)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(1));

        let input = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(self.cursor.visible_slice(&self.buffer, inner_width))
                .style(Style::default().fg(Color::Green))
        };

        frame.render_widget(input.block(block), area);
        frame.set_cursor_position(self.cursor.screen_pos(&self.buffer, area));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut tmp = [0u8; 4];
                self.insert(c.encode_utf8(&mut tmp));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // Single line: pasted line breaks become spaces
                let flat: String = text
                    .chars()
                    .filter(|&c| c != '\r')
                    .map(|c| if c == '\n' { ' ' } else { c })
                    .collect();
                self.insert(&flat);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.cursor.pos > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor.pos < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.cursor.pos > 0).then(|| {
                self.cursor.pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.cursor.pos < self.buffer.len()).then(|| {
                self.cursor.pos = next_char_boundary(&self.buffer, self.cursor.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => (self.cursor.pos != 0).then(|| {
                self.cursor.pos = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor.pos != self.buffer.len()).then(|| {
                self.cursor.pos = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit => {
                (!self.buffer.trim().is_empty()).then(|| InputEvent::Submit(self.buffer.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn type_text(input: &mut InputBox, text: &str) {
        for c in text.chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }
    }

    fn draw(input: &mut InputBox) -> String {
        let backend = TestBackend::new(40, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                input.render(f, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_handle_input() {
        let mut input = InputBox::new();

        let res = input.handle_event(&TuiEvent::InputChar('a'));
        assert_eq!(res, Some(InputEvent::ContentChanged));
        assert_eq!(input.buffer, "a");

        input.handle_event(&TuiEvent::InputChar('b'));
        assert_eq!(input.buffer, "ab");

        let res = input.handle_event(&TuiEvent::Backspace);
        assert_eq!(res, Some(InputEvent::ContentChanged));
        assert_eq!(input.buffer, "a");
    }

    #[test]
    fn test_submit_keeps_buffer_until_cleared() {
        let mut input = InputBox::new();
        type_text(&mut input, "hello");

        let res = input.handle_event(&TuiEvent::Submit);
        assert_eq!(res, Some(InputEvent::Submit("hello".to_string())));
        assert_eq!(input.buffer, "hello");

        input.clear();
        assert!(input.buffer.is_empty());
        // Typing after clear starts from the beginning
        type_text(&mut input, "x");
        assert_eq!(input.buffer, "x");
    }

    #[test]
    fn test_submit_whitespace_is_ignored() {
        let mut input = InputBox::new();
        type_text(&mut input, "   ");
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
    }

    #[test]
    fn test_cursor_editing_in_middle() {
        let mut input = InputBox::new();
        type_text(&mut input, "héllo");
        input.handle_event(&TuiEvent::CursorHome);
        input.handle_event(&TuiEvent::CursorRight);
        input.handle_event(&TuiEvent::Delete);
        assert_eq!(input.buffer, "hllo");
        input.handle_event(&TuiEvent::InputChar('e'));
        assert_eq!(input.buffer, "hello");
        input.handle_event(&TuiEvent::CursorEnd);
        input.handle_event(&TuiEvent::InputChar('!'));
        assert_eq!(input.buffer, "hello!");
    }

    #[test]
    fn test_boundaries_emit_nothing() {
        let mut input = InputBox::new();
        assert_eq!(input.handle_event(&TuiEvent::Backspace), None);
        assert_eq!(input.handle_event(&TuiEvent::CursorLeft), None);
        assert_eq!(input.handle_event(&TuiEvent::Delete), None);
        assert_eq!(input.handle_event(&TuiEvent::CursorEnd), None);
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = InputBox::new();
        input.handle_event(&TuiEvent::Paste("one\r\ntwo\nthree".to_string()));
        assert_eq!(input.buffer, "one two three");
    }

    #[test]
    fn test_render_placeholder_when_empty() {
        let mut input = InputBox::new();
        assert!(draw(&mut input).contains(PLACEHOLDER));

        type_text(&mut input, "What is Aurith?");
        let text = draw(&mut input);
        assert!(text.contains("What is Aurith?"));
        assert!(!text.contains(PLACEHOLDER));
    }

    #[test]
    fn test_render_scrolls_long_input() {
        let mut input = InputBox::new();
        type_text(&mut input, &"x".repeat(60));
        input.handle_event(&TuiEvent::InputChar('Z'));
        // The tail (with the cursor) stays visible
        assert!(draw(&mut input).contains('Z'));
    }
}
