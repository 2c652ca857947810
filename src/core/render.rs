//! # Render Pipeline
//!
//! Projects assistant text into a [`RenderedDocument`]: a tree of typed block
//! and inline nodes that any surface can draw without interpreting markup.
//!
//! ```text
//! "**Hi** [site](https://x.y)"
//!         │  pulldown_cmark events
//!         ▼
//! Builder (frame stack)
//!         │
//!         ▼
//! Paragraph[ Strong[Text "Hi"], Text " ", Link{href, navigation}[Text "site"] ]
//! ```
//!
//! The projection is pure: same text in, structurally equal tree out. Links
//! always carry [`ExternalNavigation::SAFE`], destinations with executable
//! schemes are unlinked, and raw HTML comes through as literal text.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use log::debug;
use pulldown_cmark::{
    Alignment, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use syntect::parsing::SyntaxSet;
use uuid::Uuid;

pub(crate) static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Link schemes allowed through. Anything else with a scheme is unlinked.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "irc", "ircs", "xmpp"];

// ============================================================================
// Document Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedDocument {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    CodeBlock { language: CodeLanguage, code: String },
    List { start: Option<u64>, items: Vec<ListItem> },
    Table(Table),
    BlockQuote(Vec<Block>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// `Some` for task list items (`- [x] done`).
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub alignments: Vec<ColumnAlign>,
    pub header: Vec<Vec<Inline>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAlign {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link(Link),
    SoftBreak,
    HardBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub title: Option<String>,
    pub content: Vec<Inline>,
    pub navigation: ExternalNavigation,
}

/// How a surface must open a link: new browsing context, no referrer, no opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalNavigation {
    pub new_context: bool,
    pub no_referrer: bool,
    pub no_opener: bool,
}

impl ExternalNavigation {
    pub const SAFE: ExternalNavigation = ExternalNavigation {
        new_context: true,
        no_referrer: true,
        no_opener: true,
    };

    /// HTML `target` attribute value.
    pub fn target(&self) -> Option<&'static str> {
        self.new_context.then_some("_blank")
    }

    /// HTML `rel` attribute value.
    pub fn rel(&self) -> String {
        let mut parts = Vec::new();
        if self.no_opener {
            parts.push("noopener");
        }
        if self.no_referrer {
            parts.push("noreferrer");
        }
        parts.join(" ")
    }
}

/// Language tag for a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeLanguage {
    /// Resolved against the bundled syntax definitions.
    Known { token: String, name: String },
    /// No definition found. `declared` keeps whatever the fence said, if anything.
    Plain { declared: Option<String> },
}

impl CodeLanguage {
    /// Resolves a declared fence token, or sniffs the first line when none was given.
    pub fn resolve(declared: Option<&str>, code: &str) -> Self {
        let syntax = match declared {
            Some(token) => SYNTAX_SET.find_syntax_by_token(token),
            None => code
                .lines()
                .next()
                .and_then(|line| SYNTAX_SET.find_syntax_by_first_line(line)),
        };

        match syntax {
            Some(syn) if syn.name != "Plain Text" => CodeLanguage::Known {
                token: declared
                    .map(str::to_string)
                    .or_else(|| syn.file_extensions.first().cloned())
                    .unwrap_or_else(|| syn.name.to_lowercase()),
                name: syn.name.clone(),
            },
            _ => CodeLanguage::Plain {
                declared: declared.map(str::to_string),
            },
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, CodeLanguage::Plain { .. })
    }

    /// Label for display: the declared or detected token.
    pub fn label(&self) -> Option<&str> {
        match self {
            CodeLanguage::Known { token, .. } => Some(token),
            CodeLanguage::Plain { declared } => declared.as_deref(),
        }
    }
}

impl RenderedDocument {
    /// Flattens the tree to readable plain text (links as `text (href)`).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            block_text(block, "", &mut out);
        }
        out
    }
}

fn block_text(block: &Block, indent: &str, out: &mut String) {
    match block {
        Block::Paragraph(inlines) | Block::Heading { content: inlines, .. } => {
            out.push_str(indent);
            inline_text(inlines, out);
            out.push('\n');
        }
        Block::CodeBlock { code, .. } => {
            for line in code.lines() {
                out.push_str(indent);
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
        Block::List { start, items } => {
            for (n, item) in items.iter().enumerate() {
                let marker = match start {
                    Some(s) => format!("{}. ", s + n as u64),
                    None => "- ".to_string(),
                };
                let check = match item.checked {
                    Some(true) => "[x] ",
                    Some(false) => "[ ] ",
                    None => "",
                };
                let nested = format!("{indent}  ");
                for (j, b) in item.blocks.iter().enumerate() {
                    if j == 0 {
                        let mut first = String::new();
                        block_text(b, "", &mut first);
                        out.push_str(indent);
                        out.push_str(&marker);
                        out.push_str(check);
                        out.push_str(first.trim_start());
                    } else {
                        block_text(b, &nested, out);
                    }
                }
            }
        }
        Block::Table(table) => {
            let row_text = |cells: &[Vec<Inline>]| {
                cells
                    .iter()
                    .map(|c| {
                        let mut s = String::new();
                        inline_text(c, &mut s);
                        s
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
            };
            out.push_str(indent);
            out.push_str(&row_text(&table.header));
            out.push('\n');
            for row in &table.rows {
                out.push_str(indent);
                out.push_str(&row_text(row));
                out.push('\n');
            }
        }
        Block::BlockQuote(blocks) => {
            let nested = format!("{indent}> ");
            for b in blocks {
                block_text(b, &nested, out);
            }
        }
        Block::Rule => {
            out.push_str(indent);
            out.push_str("---\n");
        }
    }
}

fn inline_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(t) | Inline::Code(t) => out.push_str(t),
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Strikethrough(c) => {
                inline_text(c, out)
            }
            Inline::Link(link) => {
                inline_text(&link.content, out);
                out.push_str(" (");
                out.push_str(&link.href);
                out.push(')');
            }
            Inline::SoftBreak => out.push(' '),
            Inline::HardBreak => out.push('\n'),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Parses `content` into a document tree. Never fails.
pub fn render(content: &str) -> RenderedDocument {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut builder = Builder::new();
    for event in Parser::new_ext(content, opts) {
        builder.handle(event);
    }
    builder.finish()
}

/// Returns `Some(dest)` when the link destination is safe to navigate to.
fn safe_href(dest: &str) -> Option<String> {
    let dest = dest.trim();
    let colon = dest.find(':');
    let boundary = dest.find(['/', '?', '#']);
    match colon {
        Some(c) if boundary.is_none_or(|b| c < b) => {
            let scheme = dest[..c].to_ascii_lowercase();
            SAFE_SCHEMES
                .contains(&scheme.as_str())
                .then(|| dest.to_string())
        }
        _ => Some(dest.to_string()),
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn column_align(a: Alignment) -> ColumnAlign {
    match a {
        Alignment::None => ColumnAlign::None,
        Alignment::Left => ColumnAlign::Left,
        Alignment::Center => ColumnAlign::Center,
        Alignment::Right => ColumnAlign::Right,
    }
}

// ── Builder ─────────────────────────────────────────────────────────────────

enum InlineKind {
    Paragraph,
    /// Opened for inline content that arrives directly inside a block
    /// container (tight list items). Has no matching End event.
    Implicit,
    /// Raw HTML block, carried as literal text.
    Html,
    Heading(u8),
    Emphasis,
    Strong,
    Strikethrough,
    /// `href` is `None` when the destination was rejected.
    Link { href: Option<String>, title: Option<String> },
    Cell,
    /// Unsupported inline container; children are spliced into the parent.
    Transparent,
}

enum Frame {
    Root(Vec<Block>),
    Quote(Vec<Block>),
    List { start: Option<u64>, items: Vec<ListItem> },
    Item { checked: Option<bool>, blocks: Vec<Block> },
    Inline { kind: InlineKind, content: Vec<Inline> },
    Code { declared: Option<String>, code: String },
    Table(Table),
    Row { head: bool, cells: Vec<Vec<Inline>> },
}

enum Closed {
    Block(Block),
    Inlines(Vec<Inline>),
    Item(ListItem),
    Cell(Vec<Inline>),
    Row { head: bool, cells: Vec<Vec<Inline>> },
    Nothing,
}

/// Deepest block (quote, list, item) or inline (emphasis, link) nesting kept
/// in the tree. Deeper containers are flattened into their parent so that
/// walking the tree stays shallow whatever the input.
const MAX_NESTING: usize = 32;

/// Builds the tree from a flat event stream. Every `Start` pushes exactly one
/// frame and every `End` pops one, apart from implicit paragraphs and block
/// containers flattened past [`MAX_NESTING`].
struct Builder {
    stack: Vec<Frame>,
    /// Open block containers that were flattened instead of pushed.
    flattened: usize,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::Root(Vec::new())],
            flattened: 0,
        }
    }

    fn finish(mut self) -> RenderedDocument {
        while self.stack.len() > 1 {
            self.close_top();
        }
        match self.stack.pop() {
            Some(Frame::Root(blocks)) => RenderedDocument { blocks },
            _ => RenderedDocument::default(),
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(end) => {
                self.close_implicit();
                if self.flattened > 0
                    && matches!(end, TagEnd::BlockQuote(_) | TagEnd::List(_) | TagEnd::Item)
                {
                    // Inside a flattened container every block End belongs to one
                    self.flattened -= 1;
                    return;
                }
                if self.stack.len() > 1 {
                    self.close_top();
                }
            }
            Event::Text(t) => self.text(t),
            Event::Code(c) => self.push_inline(Inline::Code(c.to_string())),
            Event::Html(h) | Event::InlineHtml(h) => self.push_literal(&h),
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::HardBreak),
            Event::Rule => {
                self.close_implicit();
                self.attach(Closed::Block(Block::Rule));
            }
            Event::TaskListMarker(checked) => {
                if self.flattened > 0 {
                    return;
                }
                if let Some(Frame::Item { checked: slot, .. }) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f, Frame::Item { .. }))
                {
                    *slot = Some(checked);
                }
            }
            other => debug!("Skipping unsupported markdown event: {:?}", other),
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        if self.flattens(&tag) {
            self.close_implicit();
            self.flattened += 1;
            return;
        }
        let frame = match tag {
            // ── Block containers ────────────────────────────────────────
            Tag::Paragraph => self.block_frame(InlineKind::Paragraph),
            Tag::Heading { level, .. } => self.block_frame(InlineKind::Heading(heading_depth(level))),
            Tag::HtmlBlock => self.block_frame(InlineKind::Html),
            Tag::BlockQuote(_) => {
                self.close_implicit();
                Frame::Quote(Vec::new())
            }
            Tag::CodeBlock(kind) => {
                self.close_implicit();
                let declared = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .next()
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                Frame::Code {
                    declared,
                    code: String::new(),
                }
            }
            Tag::List(start) => {
                self.close_implicit();
                Frame::List {
                    start,
                    items: Vec::new(),
                }
            }
            Tag::Item => Frame::Item {
                checked: None,
                blocks: Vec::new(),
            },
            Tag::Table(alignments) => {
                self.close_implicit();
                Frame::Table(Table {
                    alignments: alignments.into_iter().map(column_align).collect(),
                    header: Vec::new(),
                    rows: Vec::new(),
                })
            }
            Tag::TableHead => Frame::Row {
                head: true,
                cells: Vec::new(),
            },
            Tag::TableRow => Frame::Row {
                head: false,
                cells: Vec::new(),
            },
            Tag::TableCell => Self::inline_frame(InlineKind::Cell),

            // ── Inline containers ───────────────────────────────────────
            Tag::Emphasis => self.nested_inline(InlineKind::Emphasis),
            Tag::Strong => self.nested_inline(InlineKind::Strong),
            Tag::Strikethrough => self.nested_inline(InlineKind::Strikethrough),
            Tag::Link {
                dest_url, title, ..
            }
            | Tag::Image {
                dest_url, title, ..
            } => {
                let href = safe_href(&dest_url);
                if href.is_none() {
                    debug!("Unlinking unsafe destination: {}", dest_url);
                }
                let title = (!title.is_empty()).then(|| title.to_string());
                self.nested_inline(InlineKind::Link { href, title })
            }
            _ => self.nested_inline(InlineKind::Transparent),
        };
        self.stack.push(frame);
    }

    /// Whether a block container start is dropped and its children spliced
    /// into the enclosing container.
    fn flattens(&self, tag: &Tag<'_>) -> bool {
        match tag {
            Tag::BlockQuote(_) | Tag::List(_) => {
                self.flattened > 0 || self.block_depth() >= MAX_NESTING
            }
            // An item belongs to the list frame right above it, if that list was kept
            Tag::Item => !matches!(self.stack.last(), Some(Frame::List { .. })),
            _ => false,
        }
    }

    fn block_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|f| matches!(f, Frame::Quote(_) | Frame::List { .. } | Frame::Item { .. }))
            .count()
    }

    fn inline_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|f| matches!(f, Frame::Inline { .. }))
            .count()
    }

    fn inline_frame(kind: InlineKind) -> Frame {
        Frame::Inline {
            kind,
            content: Vec::new(),
        }
    }

    fn block_frame(&mut self, kind: InlineKind) -> Frame {
        self.close_implicit();
        Self::inline_frame(kind)
    }

    /// Inline containers need an inline parent; open an implicit paragraph if
    /// they start directly inside a block container.
    fn nested_inline(&mut self, kind: InlineKind) -> Frame {
        self.ensure_inline_parent();
        if self.inline_depth() >= MAX_NESTING {
            return Self::inline_frame(InlineKind::Transparent);
        }
        Self::inline_frame(kind)
    }

    fn ensure_inline_parent(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Root(_) | Frame::Quote(_) | Frame::Item { .. })
        ) {
            self.stack.push(Self::inline_frame(InlineKind::Implicit));
        }
    }

    fn close_implicit(&mut self) {
        while matches!(
            self.stack.last(),
            Some(Frame::Inline {
                kind: InlineKind::Implicit,
                ..
            })
        ) {
            self.close_top();
        }
    }

    fn text(&mut self, t: CowStr<'_>) {
        if let Some(Frame::Code { code, .. }) = self.stack.last_mut() {
            code.push_str(&t);
            return;
        }
        self.push_inline(Inline::Text(t.to_string()));
    }

    /// Raw HTML as literal text, one hard break per source line break.
    fn push_literal(&mut self, html: &str) {
        for (i, line) in html.split('\n').enumerate() {
            if i > 0 {
                self.push_inline(Inline::HardBreak);
            }
            if !line.is_empty() {
                self.push_inline(Inline::Text(line.to_string()));
            }
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        self.ensure_inline_parent();
        match self.stack.last_mut() {
            Some(Frame::Inline { content, .. }) => {
                if let (Some(Inline::Text(prev)), Inline::Text(next)) = (content.last_mut(), &inline) {
                    prev.push_str(next);
                } else {
                    content.push(inline);
                }
            }
            Some(Frame::Code { code, .. }) => {
                if let Inline::Text(t) | Inline::Code(t) = inline {
                    code.push_str(&t);
                }
            }
            _ => debug!("Dropping inline outside of any inline container"),
        }
    }

    fn close_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let closed = match frame {
            Frame::Root(blocks) => {
                // Never popped before finish(); put it back.
                self.stack.push(Frame::Root(blocks));
                return;
            }
            Frame::Quote(blocks) => Closed::Block(Block::BlockQuote(blocks)),
            Frame::List { start, items } => Closed::Block(Block::List { start, items }),
            Frame::Item { checked, blocks } => Closed::Item(ListItem { checked, blocks }),
            Frame::Code { declared, code } => Closed::Block(Block::CodeBlock {
                language: CodeLanguage::resolve(declared.as_deref(), &code),
                code,
            }),
            Frame::Table(table) => Closed::Block(Block::Table(table)),
            Frame::Row { head, cells } => Closed::Row { head, cells },
            Frame::Inline { kind, mut content } => match kind {
                InlineKind::Paragraph | InlineKind::Implicit => {
                    if content.is_empty() {
                        Closed::Nothing
                    } else {
                        Closed::Block(Block::Paragraph(content))
                    }
                }
                InlineKind::Html => {
                    while matches!(content.last(), Some(Inline::HardBreak)) {
                        content.pop();
                    }
                    if let Some(Inline::Text(t)) = content.last_mut() {
                        let trimmed = t.trim_end().len();
                        t.truncate(trimmed);
                    }
                    Closed::Block(Block::Paragraph(content))
                }
                InlineKind::Heading(level) => Closed::Block(Block::Heading { level, content }),
                InlineKind::Emphasis => Closed::Inlines(vec![Inline::Emphasis(content)]),
                InlineKind::Strong => Closed::Inlines(vec![Inline::Strong(content)]),
                InlineKind::Strikethrough => Closed::Inlines(vec![Inline::Strikethrough(content)]),
                InlineKind::Link {
                    href: Some(href),
                    title,
                } => Closed::Inlines(vec![Inline::Link(Link {
                    href,
                    title,
                    content,
                    navigation: ExternalNavigation::SAFE,
                })]),
                InlineKind::Link { href: None, .. } | InlineKind::Transparent => {
                    Closed::Inlines(content)
                }
                InlineKind::Cell => Closed::Cell(content),
            },
        };
        self.attach(closed);
    }

    fn attach(&mut self, closed: Closed) {
        match closed {
            Closed::Nothing => {}
            Closed::Block(block) => match self.stack.last_mut() {
                Some(Frame::Root(blocks) | Frame::Quote(blocks) | Frame::Item { blocks, .. }) => {
                    blocks.push(block)
                }
                _ => debug!("Dropping block with no block container"),
            },
            Closed::Inlines(inlines) => {
                for inline in inlines {
                    self.push_inline(inline);
                }
            }
            Closed::Item(item) => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(item);
                }
            }
            Closed::Cell(cell) => {
                if let Some(Frame::Row { cells, .. }) = self.stack.last_mut() {
                    cells.push(cell);
                }
            }
            Closed::Row { head, cells } => {
                if let Some(Frame::Table(table)) = self.stack.last_mut() {
                    if head {
                        table.header = cells;
                    } else {
                        table.rows.push(cells);
                    }
                }
            }
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Memoizes rendered documents per message.
///
/// Keyed by log index within one session: the log is append-only, so an index
/// always names the same content. Switching session clears the cache.
#[derive(Default)]
pub struct RenderCache {
    session: Option<Uuid>,
    entries: HashMap<usize, Arc<RenderedDocument>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_render(&mut self, session: Uuid, index: usize, content: &str) -> Arc<RenderedDocument> {
        if self.session != Some(session) {
            self.entries.clear();
            self.session = Some(session);
        }
        self.entries
            .entry(index)
            .or_insert_with(|| Arc::new(render(content)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
