//! # TitleBar Component
//!
//! Header line of the open chat panel: assistant name, live status, and which
//! completion service is answering.
//!
//! ```text
//! ● Aurith AI | Always Available | endpoint
//! ● Aurith AI | Thinking... | endpoint | ↓ New
//! ```
//!
//! Purely presentational. All fields are props supplied by the parent each
//! frame, so the struct holds no state of its own.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

pub struct TitleBar {
    /// Assistant display name (e.g. "Aurith AI")
    pub name: String,
    /// "Always Available" or "Thinking..."
    pub status_message: String,
    /// Completion service name (e.g. "endpoint", "openrouter")
    pub service_name: String,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
    /// Whether a turn is in flight (dot turns yellow)
    pub is_pending: bool,
}

impl TitleBar {
    pub fn new(
        name: String,
        status_message: String,
        service_name: String,
        has_unseen_content: bool,
        is_pending: bool,
    ) -> Self {
        Self {
            name,
            status_message,
            service_name,
            has_unseen_content,
            is_pending,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let dot = if self.is_pending {
            Color::Yellow
        } else {
            Color::Green
        };
        let sep = Span::styled(" | ", Style::default().fg(Color::DarkGray));

        let mut spans = vec![
            Span::styled("● ", Style::default().fg(dot)),
            Span::styled(self.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ];
        if !self.status_message.is_empty() {
            spans.push(sep.clone());
            spans.push(Span::raw(self.status_message.clone()));
        }
        spans.push(sep.clone());
        spans.push(Span::styled(
            self.service_name.clone(),
            Style::default().fg(Color::DarkGray),
        ));
        if self.has_unseen_content {
            spans.push(sep);
            spans.push(Span::styled("↓ New", Style::default().fg(Color::Cyan)));
        }

        frame.render_widget(Line::from(spans), area);
    }
}
