//! # Launcher Component
//!
//! What the user sees while the chat panel is closed: a centered invitation
//! to open it. The session stays alive underneath, so a reply that lands
//! while closed shows up as a badge here.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

pub struct Launcher<'a> {
    /// Assistant display name
    pub name: &'a str,
    /// A turn is in flight
    pub is_pending: bool,
    /// Assistant messages in the log (greeting included)
    pub reply_count: usize,
}

impl<'a> Launcher<'a> {
    pub fn new(name: &'a str, is_pending: bool, reply_count: usize) -> Self {
        Self {
            name,
            is_pending,
            reply_count,
        }
    }
}

impl<'a> Component for Launcher<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(
                format!("💬 Chat with {}", self.name),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("Ctrl+O", Style::default().fg(Color::Cyan)),
                Span::styled(" to open · ", Style::default().fg(Color::DarkGray)),
                Span::styled("Ctrl+C", Style::default().fg(Color::Cyan)),
                Span::styled(" to quit", Style::default().fg(Color::DarkGray)),
            ]),
        ];
        if self.is_pending {
            lines.push(Line::from(Span::styled(
                "Thinking...",
                Style::default().fg(Color::Yellow),
            )));
        } else if self.reply_count > 1 {
            lines.push(Line::from(Span::styled(
                format!("{} messages waiting", self.reply_count),
                Style::default().fg(Color::DarkGray),
            )));
        }

        let [centered] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(launcher: &mut Launcher) -> String {
        let backend = TestBackend::new(60, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                launcher.render(f, area);
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
    fn test_launcher_invites_to_open() {
        let text = draw(&mut Launcher::new("Aurith AI", false, 1));
        assert!(text.contains("Aurith AI"));
        assert!(text.contains("Ctrl+O"));
        assert!(!text.contains("Thinking"));
        assert!(!text.contains("waiting"));
    }

    #[test]
    fn test_launcher_shows_pending_turn() {
        let text = draw(&mut Launcher::new("Aurith AI", true, 1));
        assert!(text.contains("Thinking..."));
    }

    #[test]
    fn test_launcher_shows_waiting_messages() {
        let text = draw(&mut Launcher::new("Aurith AI", false, 3));
        assert!(text.contains("3 messages waiting"));
    }
}
