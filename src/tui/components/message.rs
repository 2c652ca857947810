use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::Role;
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
pub const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
pub const VERTICAL_OVERHEAD: u16 = 2;

/// Pulse intensity threshold above which the border transitions from normal to BOLD.
const PULSE_BOLD_THRESHOLD: f32 = 0.6;
/// Pulse intensity threshold above which the border transitions from DIM to normal.
const PULSE_NORMAL_THRESHOLD: f32 = 0.2;

/// A stateless chat bubble.
///
/// Created fresh each frame by `MessageList` with already-styled content:
/// user text verbatim, assistant text after the render pipeline. The user's
/// label sits on the right border, the assistant's on the left, mirroring
/// the left/right alignment of a chat widget.
#[derive(Clone)]
pub struct Message<'a> {
    pub role: Role,
    /// Border title (assistant name or "you")
    pub label: &'a str,
    pub content: Text<'static>,
    /// Current pulse intensity (0.0 to 1.0); nonzero only for the Thinking bubble
    pub pulse_intensity: f32,
}

impl<'a> Message<'a> {
    pub fn new(role: Role, label: &'a str, content: Text<'static>, pulse_intensity: f32) -> Self {
        Self {
            role,
            label,
            content,
            pulse_intensity,
        }
    }

    /// Height this bubble needs at `width`, borders included.
    ///
    /// Uses the same `Paragraph` and wrap settings as rendering, so the
    /// prediction matches what gets drawn.
    pub fn calculate_height(content: &Text<'static>, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding; still occupy a row.
            return 1;
        }
        if content.lines.is_empty() {
            return VERTICAL_OVERHEAD;
        }
        let lines = Paragraph::new(content.clone())
            .wrap(Wrap { trim: false })
            .line_count(content_width);
        u16::try_from(lines)
            .unwrap_or(u16::MAX)
            .max(1)
            .saturating_add(VERTICAL_OVERHEAD)
    }
}

pub fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Green),
        Role::Assistant => Style::default().fg(Color::Blue),
        Role::System => Style::default().fg(Color::Yellow),
    }
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = role_style(self.role);

        // Three-phase breathing: DIM → normal → BOLD
        let mut border_style = style.add_modifier(Modifier::DIM);
        if self.pulse_intensity > PULSE_BOLD_THRESHOLD {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        } else if self.pulse_intensity > PULSE_NORMAL_THRESHOLD {
            border_style = border_style.remove_modifier(Modifier::DIM);
        }

        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        block = match self.role {
            Role::User => block.title_top(ratatui::text::Line::from(self.label).right_aligned()),
            _ => block.title(self.label),
        };

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.content)
            .style(style)
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.clone(), area);
    }
}
