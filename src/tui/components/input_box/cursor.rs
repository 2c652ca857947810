//! Cursor position and horizontal scroll for the single-line InputBox.
//!
//! `CursorState` owns the cursor byte offset and the first visible display
//! column. All methods take `buffer: &str` explicitly since the text is owned
//! by `InputBox`. Columns are measured in terminal cells (`unicode-width`), so
//! wide characters scroll and place the cursor correctly.

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Offset from area edge to content: border (1) + padding (1)
pub(super) const CONTENT_OFFSET: u16 = 2;
/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;

/// Cursor and scroll state, separated from the text buffer.
pub(super) struct CursorState {
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    pub pos: usize,
    /// First visible display column
    pub scroll_col: usize,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_col: 0,
        }
    }

    /// Reset cursor to start (used after the buffer is cleared).
    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll_col = 0;
    }

    /// Display column of the cursor within the whole buffer.
    ///
    /// Kept as `usize`: a pasted line can be wider than any terminal.
    pub fn column(&self, buffer: &str) -> usize {
        buffer[..self.pos].width()
    }

    /// Shift the scroll window so the cursor stays inside `inner_width` cells.
    pub fn update_scroll(&mut self, buffer: &str, inner_width: u16) {
        if inner_width == 0 {
            self.scroll_col = 0;
            return;
        }
        let inner_width = usize::from(inner_width);
        let col = self.column(buffer);
        if col < self.scroll_col {
            self.scroll_col = col;
        } else if col >= self.scroll_col.saturating_add(inner_width) {
            self.scroll_col = col + 1 - inner_width;
        }
    }

    /// The part of `buffer` that fits in the scroll window.
    pub fn visible_slice(&self, buffer: &str, inner_width: u16) -> String {
        let inner_width = usize::from(inner_width);
        let mut col: usize = 0;
        let mut used: usize = 0;
        let mut out = String::new();
        for c in buffer.chars() {
            let w = c.width().unwrap_or(0);
            if col < self.scroll_col {
                col += w;
                continue;
            }
            if used + w > inner_width {
                break;
            }
            out.push(c);
            used += w;
        }
        out
    }

    /// Screen position of the cursor for `frame.set_cursor_position`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let col = self.column(buffer).saturating_sub(self.scroll_col);
        let col = u16::try_from(col).unwrap_or(u16::MAX);
        let max_x = area.x.saturating_add(area.width.saturating_sub(CONTENT_OFFSET));
        let x = area.x.saturating_add(CONTENT_OFFSET).saturating_add(col);
        (x.min(max_x), area.y.saturating_add(1))
    }
}

/// Find the byte offset of the previous character boundary before `pos` in `text`.
pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Find the byte offset of the next character boundary after `pos` in `text`.
pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_boundaries_multibyte() {
        let text = "aé😀b";
        assert_eq!(next_char_boundary(text, 0), 1);
        assert_eq!(next_char_boundary(text, 1), 3);
        assert_eq!(next_char_boundary(text, 3), 7);
        assert_eq!(prev_char_boundary(text, 7), 3);
        assert_eq!(prev_char_boundary(text, 0), 0);
        assert_eq!(next_char_boundary(text, text.len()), text.len());
    }

    #[test]
    fn test_scroll_follows_cursor_right() {
        let buffer = "abcdefghij";
        let mut cursor = CursorState::new();
        cursor.pos = buffer.len();
        cursor.update_scroll(buffer, 4);
        // Cursor at column 10 must be the last visible cell
        assert_eq!(cursor.scroll_col, 7);
        assert_eq!(cursor.visible_slice(buffer, 4), "hij");
    }

    #[test]
    fn test_scroll_follows_cursor_left() {
        let buffer = "abcdefghij";
        let mut cursor = CursorState::new();
        cursor.scroll_col = 6;
        cursor.pos = 2;
        cursor.update_scroll(buffer, 4);
        assert_eq!(cursor.scroll_col, 2);
        assert_eq!(cursor.visible_slice(buffer, 4), "cdef");
    }

    #[test]
    fn test_wide_chars_measured_in_cells() {
        let buffer = "日本語";
        let mut cursor = CursorState::new();
        cursor.pos = buffer.len();
        assert_eq!(cursor.column(buffer), 6);
        assert_eq!(cursor.visible_slice(buffer, 5), "日本");
    }

    #[test]
    fn test_paste_wider_than_u16_keeps_tail_visible() {
        let mut buffer = "a".repeat(70_000);
        buffer.push_str("tail");
        let mut cursor = CursorState::new();
        cursor.pos = buffer.len();
        cursor.update_scroll(&buffer, 10);

        assert_eq!(cursor.column(&buffer), 70_004);
        assert_eq!(cursor.scroll_col, 69_995);
        assert!(cursor.visible_slice(&buffer, 10).ends_with("tail"));

        let area = Rect::new(0, 0, 20, 3);
        assert_eq!(cursor.screen_pos(&buffer, area), (11, 1));
    }

    #[test]
    fn test_screen_pos_accounts_for_border_and_scroll() {
        let buffer = "hello";
        let mut cursor = CursorState::new();
        cursor.pos = 3;
        let area = Rect::new(10, 5, 40, 3);
        assert_eq!(cursor.screen_pos(buffer, area), (15, 6));
        cursor.scroll_col = 2;
        assert_eq!(cursor.screen_pos(buffer, area), (13, 6));
    }
}
