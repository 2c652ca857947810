//! # MessageList Component
//!
//! Scrollable view of the visible conversation, plus the "Thinking" bubble
//! while a turn is in flight.
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the conversation (props).
//!
//! The log is append-only, so a bubble measured once never changes: the
//! layout cache only measures messages past the last cached one, and resets
//! when the session or the width changes. Assistant text goes through the
//! render pipeline once per message via [`RenderCache`].

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::Color;
use ratatui::text::Text;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};
use uuid::Uuid;

use crate::core::message::Role;
use crate::core::render::RenderCache;
use crate::core::store::ConversationStore;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;
use crate::tui::markdown;

const USER_LABEL: &str = "you";

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Cached bubble contents and heights
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Content exists below the viewport
    pub has_unseen_content: bool,
    /// Rendered assistant documents, keyed by (session, log index)
    pub render_cache: RenderCache,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
            has_unseen_content: false,
            render_cache: RenderCache::new(),
        }
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.layout.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.layout.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub store: &'a ConversationStore,
    pub session: Uuid,
    pub assistant_name: &'a str,
    pub is_pending: bool,
    pub pulse_value: f32,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        store: &'a ConversationStore,
        session: Uuid,
        assistant_name: &'a str,
        is_pending: bool,
        pulse_value: f32,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            store,
            session,
            assistant_name,
            is_pending,
            pulse_value,
            spinner_frame,
        }
    }

    fn thinking_text(&self) -> Text<'static> {
        let dots = ".".repeat(self.spinner_frame % 4);
        Text::raw(format!("Thinking{dots}"))
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area

        // 1. Measure new bubbles (append-only: everything cached stays valid)
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.session, content_width);
        layout.reset_to(reusable, self.session, content_width);

        for (index, message) in self.store.visible_indexed().skip(layout.bubbles.len()) {
            let content = match message.role() {
                Role::Assistant => {
                    let doc = self
                        .state
                        .render_cache
                        .get_or_render(self.session, index, message.content());
                    markdown::to_text(&doc, Color::Blue)
                }
                _ => Text::raw(message.content().to_string()),
            };
            let height = Message::calculate_height(&content, content_width);
            layout.bubbles.push(CachedBubble {
                role: message.role(),
                content,
                height,
            });
        }
        layout.rebuild_prefix_heights();

        let thinking = self.is_pending.then(|| {
            let text = self.thinking_text();
            let height = Message::calculate_height(&text, content_width);
            (text, height)
        });
        let thinking_height = thinking.as_ref().map_or(0, |(_, h)| *h);

        let messages_height = self.state.layout.total_height();
        let canvas_height = messages_height.saturating_add(thinking_height);

        // 2. Clamp scroll offset to prevent overscrolling past content
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible bubbles into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for bubble in &self.state.layout.bubbles[visible_range] {
            let label = match bubble.role {
                Role::User => USER_LABEL,
                _ => self.assistant_name,
            };
            let rect = Rect::new(0, y_offset, content_width, bubble.height);
            scroll_view.render_widget(
                Message::new(bubble.role, label, bubble.content.clone(), 0.0),
                rect,
            );
            y_offset = y_offset.saturating_add(bubble.height);
        }

        if let Some((text, height)) = thinking {
            let rect = Rect::new(0, messages_height, content_width, height);
            scroll_view.render_widget(
                Message::new(Role::Assistant, self.assistant_name, text, self.pulse_value),
                rect,
            );
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        let current_offset = self.state.scroll_state.offset().y;
        let max_scroll = canvas_height.saturating_sub(area.height);
        self.state.has_unseen_content = !self.state.stick_to_bottom && current_offset < max_scroll;
    }
}

/// EventHandler lives on `MessageListState` because `MessageList` is
/// recreated each frame and can't hold scroll position.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                self.scroll_state.scroll_to_bottom();
            }
            _ => {}
        }
        None
    }
}

/// One measured bubble.
pub struct CachedBubble {
    pub role: Role,
    pub content: Text<'static>,
    pub height: u16,
}

/// Cached layout measurements for the visible messages, in log order.
pub struct LayoutCache {
    pub bubbles: Vec<CachedBubble>,
    pub prefix_heights: Vec<u16>,
    session: Option<Uuid>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            bubbles: Vec::new(),
            prefix_heights: Vec::new(),
            session: None,
            content_width: 0,
        }
    }

    /// How many cached bubbles can be kept for this frame.
    pub fn reusable_count(&self, session: Uuid, content_width: u16) -> usize {
        if self.session != Some(session) || self.content_width != content_width {
            return 0;
        }
        self.bubbles.len()
    }

    pub fn reset_to(&mut self, keep: usize, session: Uuid, content_width: u16) {
        self.bubbles.truncate(keep);
        self.session = Some(session);
        self.content_width = content_width;
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .bubbles
            .iter()
            .scan(0u16, |acc, b| {
                *acc = acc.saturating_add(b.height);
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end.max(start)
    }
}
