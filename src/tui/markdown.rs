//! `RenderedDocument` → ratatui `Text` renderer.
//!
//! Walks the document tree produced by [`crate::core::render`] and emits styled
//! `Line`/`Span` values. Headings, bold, italic, strikethrough, inline code,
//! fenced code blocks (with syntect highlighting), lists, task lists, tables,
//! blockquotes, and links.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::util::LinesWithEndings;
use unicode_width::UnicodeWidthStr;

use crate::core::render::{
    Block, CodeLanguage, ColumnAlign, Inline, ListItem, RenderedDocument, SYNTAX_SET, Table,
};

static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

/// Converts a rendered document into styled `Text` using the given base color.
///
/// Returns owned text (`'static`) so callers aren't constrained by input lifetime.
pub fn to_text(doc: &RenderedDocument, base_fg: Color) -> Text<'static> {
    let mut w = Writer::new(base_fg);
    w.blocks(&doc.blocks, &[], true);
    Text::from(w.lines)
}

fn border_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    lines: Vec<Line<'static>>,
    base_fg: Color,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            base_fg,
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.base_fg)
    }

    fn push_line(&mut self, prefix: &[Span<'static>], spans: Vec<Span<'static>>) {
        let mut all = prefix.to_vec();
        all.extend(spans);
        self.lines.push(Line::from(all));
    }

    /// Renders `blocks` in order; `spaced` puts a blank line between them.
    fn blocks(&mut self, blocks: &[Block], prefix: &[Span<'static>], spaced: bool) {
        for (i, block) in blocks.iter().enumerate() {
            if spaced && i > 0 {
                self.push_line(prefix, Vec::new());
            }
            self.block(block, prefix);
        }
    }

    fn block(&mut self, block: &Block, prefix: &[Span<'static>]) {
        match block {
            Block::Paragraph(inlines) => {
                for line in inline_lines(inlines, self.base()) {
                    self.push_line(prefix, line);
                }
            }
            Block::Heading { level, content } => {
                let hs = heading_style(self.base_fg, *level);
                let mut lines = inline_lines(content, hs).into_iter();
                let mut first = vec![Span::styled(format!("{} ", "#".repeat(*level as usize)), hs)];
                first.extend(lines.next().unwrap_or_default());
                self.push_line(prefix, first);
                for line in lines {
                    self.push_line(prefix, line);
                }
            }
            Block::CodeBlock { language, code } => self.code_block(language, code, prefix),
            Block::List { start, items } => {
                for (n, item) in items.iter().enumerate() {
                    let marker = match start {
                        Some(s) => format!("{}. ", s + n as u64),
                        None => "- ".to_string(),
                    };
                    self.list_item(item, marker, prefix);
                }
            }
            Block::Table(table) => self.table(table, prefix),
            Block::BlockQuote(blocks) => {
                let mut nested = prefix.to_vec();
                nested.push(Span::styled("│ ", border_style()));
                let mut inner = Writer::new(self.base_fg);
                inner.blocks(blocks, &[], true);
                let quote_style = Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC);
                for line in inner.lines {
                    let spans = line
                        .spans
                        .into_iter()
                        .map(|s| {
                            let style = s.style.patch(quote_style);
                            s.style(style)
                        })
                        .collect();
                    self.push_line(&nested, spans);
                }
            }
            Block::Rule => {
                self.push_line(prefix, vec![Span::styled("─".repeat(40), border_style())]);
            }
        }
    }

    fn list_item(&mut self, item: &ListItem, marker: String, prefix: &[Span<'static>]) {
        let check = match item.checked {
            Some(true) => "[x] ",
            Some(false) => "[ ] ",
            None => "",
        };
        let marker = format!("{marker}{check}");
        let indent = " ".repeat(marker.width());

        let mut inner = Writer::new(self.base_fg);
        inner.blocks(&item.blocks, &[], false);
        if inner.lines.is_empty() {
            inner.lines.push(Line::default());
        }

        for (i, line) in inner.lines.into_iter().enumerate() {
            let lead = if i == 0 {
                Span::styled(marker.clone(), border_style())
            } else {
                Span::raw(indent.clone())
            };
            let mut spans = vec![lead];
            spans.extend(line.spans);
            self.push_line(prefix, spans);
        }
    }

    fn code_block(&mut self, language: &CodeLanguage, code: &str, prefix: &[Span<'static>]) {
        let bs = border_style();
        let top = match language.label() {
            Some(label) => vec![
                Span::styled("╭── ", bs),
                Span::styled(label.to_owned(), bs.add_modifier(Modifier::BOLD)),
                Span::styled(" ──", bs),
            ],
            None => vec![Span::styled("╭──", bs)],
        };
        self.push_line(prefix, top);

        let mut code_prefix = prefix.to_vec();
        code_prefix.push(Span::styled("│ ", bs));

        let body = code.replace('\t', "    ");
        match highlighter(language) {
            Some(mut hl) => {
                for line in LinesWithEndings::from(body.as_str()) {
                    let spans = match hl.highlight_line(line, &SYNTAX_SET) {
                        Ok(ranges) => ranges
                            .into_iter()
                            .filter_map(|(hl_style, frag)| {
                                let content = frag.trim_end_matches('\n');
                                if content.is_empty() {
                                    return None;
                                }
                                let fg = Color::Rgb(
                                    hl_style.foreground.r,
                                    hl_style.foreground.g,
                                    hl_style.foreground.b,
                                );
                                Some(Span::styled(content.to_owned(), Style::default().fg(fg)))
                            })
                            .collect(),
                        Err(_) => vec![Span::raw(line.trim_end_matches('\n').to_owned())],
                    };
                    self.push_line(&code_prefix, spans);
                }
            }
            None => {
                let code_style = Style::default().fg(Color::White);
                for line in body.lines() {
                    self.push_line(&code_prefix, vec![Span::styled(line.to_owned(), code_style)]);
                }
            }
        }

        self.push_line(prefix, vec![Span::styled("╰──", bs)]);
    }

    fn table(&mut self, table: &Table, prefix: &[Span<'static>]) {
        let cell_text = |cell: &[Inline]| -> String {
            inline_lines(cell, Style::default())
                .into_iter()
                .flatten()
                .map(|s| s.content.into_owned())
                .collect()
        };
        let header: Vec<String> = table.header.iter().map(|c| cell_text(c.as_slice())).collect();
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|r| r.iter().map(|c| cell_text(c.as_slice())).collect())
            .collect();

        let columns = header.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&header).chain(rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let format_row = |row: &[String], style: Style| -> Vec<Span<'static>> {
            let mut spans = Vec::new();
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", border_style()));
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let align = table.alignments.get(i).copied().unwrap_or(ColumnAlign::None);
                spans.push(Span::styled(pad(cell, *width, align), style));
            }
            spans
        };

        let header_style = self.base().add_modifier(Modifier::BOLD);
        self.push_line(prefix, format_row(header.as_slice(), header_style));
        let rule = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.push_line(prefix, vec![Span::styled(rule, border_style())]);
        for row in &rows {
            self.push_line(prefix, format_row(row.as_slice(), self.base()));
        }
    }
}

fn highlighter(language: &CodeLanguage) -> Option<HighlightLines<'static>> {
    let CodeLanguage::Known { name, .. } = language else {
        return None;
    };
    let syntax = SYNTAX_SET.find_syntax_by_name(name)?;
    let theme: &'static Theme = THEME_SET.themes.get(CODE_THEME)?;
    Some(HighlightLines::new(syntax, theme))
}

fn pad(cell: &str, width: usize, align: ColumnAlign) -> String {
    let gap = width.saturating_sub(cell.width());
    match align {
        ColumnAlign::Right => format!("{}{}", " ".repeat(gap), cell),
        ColumnAlign::Center => {
            let left = gap / 2;
            format!("{}{}{}", " ".repeat(left), cell, " ".repeat(gap - left))
        }
        ColumnAlign::Left | ColumnAlign::None => format!("{}{}", cell, " ".repeat(gap)),
    }
}

/// Flattens inline nodes into lines of spans (split on hard breaks).
fn inline_lines(inlines: &[Inline], style: Style) -> Vec<Vec<Span<'static>>> {
    let mut lines = vec![Vec::new()];
    push_inlines(inlines, style, &mut lines);
    lines
}

fn push_inlines(inlines: &[Inline], style: Style, lines: &mut Vec<Vec<Span<'static>>>) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => push_span(lines, Span::styled(t.replace('\t', "    "), style)),
            Inline::Code(c) => push_span(
                lines,
                Span::styled(c.clone(), Style::default().fg(Color::White).bg(Color::DarkGray)),
            ),
            Inline::Emphasis(c) => push_inlines(c, style.add_modifier(Modifier::ITALIC), lines),
            Inline::Strong(c) => push_inlines(c, style.add_modifier(Modifier::BOLD), lines),
            Inline::Strikethrough(c) => {
                push_inlines(c, style.add_modifier(Modifier::CROSSED_OUT), lines)
            }
            Inline::Link(link) => {
                push_inlines(&link.content, style.patch(link_style()), lines);
                let shown: String = link
                    .content
                    .iter()
                    .filter_map(|i| match i {
                        Inline::Text(t) | Inline::Code(t) => Some(t.as_str()),
                        _ => None,
                    })
                    .collect();
                if shown != link.href && !link.href.is_empty() {
                    push_span(lines, Span::raw(" ("));
                    push_span(lines, Span::styled(link.href.clone(), link_style()));
                    push_span(lines, Span::raw(")"));
                }
            }
            Inline::SoftBreak => push_span(lines, Span::styled(" ", style)),
            Inline::HardBreak => lines.push(Vec::new()),
        }
    }
}

fn push_span(lines: &mut Vec<Vec<Span<'static>>>, span: Span<'static>) {
    if let Some(line) = lines.last_mut() {
        line.push(span);
    } else {
        lines.push(vec![span]);
    }
}

fn heading_style(base_fg: Color, level: u8) -> Style {
    match level {
        1 => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        2 => Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}
