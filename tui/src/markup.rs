//! Markup to terminal-line rendering.
//!
//! Page markup and search-result markup stream through the same rewriter
//! the augmentation pass uses, but the handlers assemble styled terminal
//! lines instead of emitting markup. Untracked elements contribute only
//! their text, so unknown markup degrades to plain prose.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use anyhow::Context;
use anyhow::Result;
use docscope_runtime::decode_entities;
use lol_html::RewriteStrSettings;
use lol_html::doc_text;
use lol_html::element;
use lol_html::rewrite_str;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use tracing::warn;

use crate::palette::Palette;

/// Gutter prefixed to every code block line.
const CODE_GUTTER: &str = "  | ";

/// One rendered page: terminal lines plus the lookup tables the views
/// need for fragment scrolling, link traversal, and code block copying.
#[derive(Debug, Default, Clone)]
pub(crate) struct RenderedDocument {
    pub lines: Vec<Line<'static>>,
    /// Element id to line index, for fragment targets.
    pub anchors: HashMap<String, usize>,
    /// Followable links, in document order.
    pub links: Vec<LinkRef>,
    /// Line ranges of code blocks, in document order. Index-aligned with
    /// the augmented page's code block list.
    pub code_blocks: Vec<BlockRange>,
}

/// Position of a link's first text span, for selection highlighting.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinkRef {
    pub line: usize,
    pub span: usize,
    pub url: String,
}

/// Half-open line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockRange {
    pub start: usize,
    pub end: usize,
}

impl BlockRange {
    pub(crate) fn contains(&self, line: usize) -> bool {
        self.start <= line && line < self.end
    }
}

pub(crate) fn render_document(html: &str, palette: Palette) -> Result<RenderedDocument> {
    let builder = Rc::new(RefCell::new(Builder::new(palette)));
    let mut element_content_handlers = Vec::new();

    for level in 1u8..=6 {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!(format!("h{level}"), move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                b.blank_line();
                if let Some(id) = el.get_attribute("id") {
                    b.mark_anchor(id);
                }
                let mut patch = Style::default()
                    .fg(b.palette.heading)
                    .add_modifier(Modifier::BOLD);
                if level == 1 {
                    patch = patch.add_modifier(Modifier::UNDERLINED);
                }
                b.push_style(patch);
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.flush_line();
                b.blank_line();
                b.pop_style();
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("p", move |el| {
            builder.borrow_mut().flush_line();
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                end.borrow_mut().end_block();
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("br", move |_el| {
            builder.borrow_mut().force_line();
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("ul", move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                b.list_markers.push(None);
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.flush_line();
                b.list_markers.pop();
                if b.list_markers.is_empty() {
                    b.blank_line();
                }
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("ol", move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                b.list_markers.push(Some(0));
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.flush_line();
                b.list_markers.pop();
                if b.list_markers.is_empty() {
                    b.blank_line();
                }
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("li", move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                let marker = match b.list_markers.last_mut() {
                    Some(Some(count)) => {
                        *count += 1;
                        format!("{count}. ")
                    }
                    _ => "• ".to_string(),
                };
                let indent = "  ".repeat(b.list_markers.len().max(1));
                let dim = Style::default().fg(b.palette.dim);
                b.current.push(Span::styled(format!("{indent}{marker}"), dim));
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                end.borrow_mut().flush_line();
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("pre", move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                b.blank_line();
                b.in_pre = true;
                let patch = Style::default().fg(b.palette.code);
                b.push_style(patch);
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.flush_line();
                if let Some(start) = b.open_block.take() {
                    let end_line = b.lines.len();
                    b.code_blocks.push(BlockRange {
                        start,
                        end: end_line,
                    });
                }
                b.in_pre = false;
                b.pop_style();
                b.blank_line();
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("code", move |el| {
            let inline = {
                let mut b = builder.borrow_mut();
                if b.in_pre {
                    b.flush_line();
                    if let Some(start) = b.open_block.take() {
                        let end_line = b.lines.len();
                        b.code_blocks.push(BlockRange {
                            start,
                            end: end_line,
                        });
                    }
                    b.open_block = Some(b.lines.len());
                    false
                } else {
                    let patch = Style::default().fg(b.palette.code);
                    b.push_style(patch);
                    true
                }
            };
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                if inline {
                    end.borrow_mut().pop_style();
                }
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("a", move |el| {
            let class = el.get_attribute("class").unwrap_or_default();
            if class.split_whitespace().any(|part| part == "anchor") {
                return Ok(());
            }
            let href = el.get_attribute("href").filter(|href| !href.is_empty());
            {
                let mut b = builder.borrow_mut();
                let patch = Style::default()
                    .fg(b.palette.link)
                    .add_modifier(Modifier::UNDERLINED);
                b.push_style(patch);
                let line = b.lines.len();
                let span = b.current.len();
                b.open_link = href.map(|url| LinkRef { line, span, url });
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.pop_style();
                if let Some(link) = b.open_link.take()
                    && b.span_exists(link.line, link.span)
                {
                    b.links.push(link);
                }
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("details", move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                b.blank_line();
                if let Some(id) = el.get_attribute("id") {
                    b.mark_anchor(id);
                }
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                end.borrow_mut().end_block();
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("summary", move |el| {
            {
                let mut b = builder.borrow_mut();
                b.flush_line();
                let dim = Style::default().fg(b.palette.dim);
                b.current.push(Span::styled("▸ ".to_string(), dim));
                b.push_style(Style::default().add_modifier(Modifier::BOLD));
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.flush_line();
                b.pop_style();
                Ok(())
            })?;
            Ok(())
        }));
    }

    for (tag, modifier) in [
        ("em", Modifier::ITALIC),
        ("i", Modifier::ITALIC),
        ("strong", Modifier::BOLD),
        ("b", Modifier::BOLD),
    ] {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!(tag, move |el| {
            builder
                .borrow_mut()
                .push_style(Style::default().add_modifier(modifier));
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                end.borrow_mut().pop_style();
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("span", move |el| {
            let class = el.get_attribute("class").unwrap_or_default();
            {
                let mut b = builder.borrow_mut();
                let mut patch = Style::default();
                for part in class.split_whitespace() {
                    match part {
                        "matched" => {
                            patch = patch.fg(b.palette.matched).add_modifier(Modifier::BOLD);
                        }
                        "scope" => patch = patch.fg(b.palette.scope),
                        _ => {}
                    }
                }
                b.push_style(patch);
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                end.borrow_mut().pop_style();
                Ok(())
            })?;
            Ok(())
        }));
    }

    for tag in ["script", "style"] {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!(tag, move |el| {
            builder.borrow_mut().skip_text += 1;
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.skip_text = b.skip_text.saturating_sub(1);
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("tr", move |el| {
            builder.borrow_mut().flush_line();
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                end.borrow_mut().flush_line();
                Ok(())
            })?;
            Ok(())
        }));
    }

    for (tag, bold) in [("th", true), ("td", false)] {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!(tag, move |el| {
            {
                let mut b = builder.borrow_mut();
                let mut patch = Style::default();
                if bold {
                    patch = patch.add_modifier(Modifier::BOLD);
                }
                b.push_style(patch);
            }
            let end = Rc::clone(&builder);
            el.on_end_tag(move |_| {
                let mut b = end.borrow_mut();
                b.pop_style();
                let dim = Style::default().fg(b.palette.dim);
                b.current.push(Span::styled("  ".to_string(), dim));
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("hr", move |_el| {
            let mut b = builder.borrow_mut();
            b.flush_line();
            let dim = Style::default().fg(b.palette.dim);
            b.lines.push(Line::from(Span::styled("─".repeat(24), dim)));
            Ok(())
        }));
    }

    {
        let builder = Rc::clone(&builder);
        element_content_handlers.push(element!("img", move |el| {
            if let Some(alt) = el.get_attribute("alt").filter(|alt| !alt.is_empty()) {
                let mut b = builder.borrow_mut();
                let dim = Style::default().fg(b.palette.dim);
                b.current
                    .push(Span::styled(format!("[{}]", decode_entities(&alt)), dim));
            }
            Ok(())
        }));
    }

    let text_builder = Rc::clone(&builder);
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            document_content_handlers: vec![doc_text!(move |chunk| {
                let mut b = text_builder.borrow_mut();
                if b.skip_text > 0 {
                    return Ok(());
                }
                let decoded = decode_entities(chunk.as_str());
                if b.in_pre {
                    b.append_code(&decoded);
                } else {
                    b.append_prose(&decoded);
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .context("render page markup")?;

    let mut b = builder.borrow_mut();
    b.flush_line();
    let mut doc = RenderedDocument {
        lines: mem::take(&mut b.lines),
        anchors: mem::take(&mut b.anchors),
        links: mem::take(&mut b.links),
        code_blocks: mem::take(&mut b.code_blocks),
    };
    while matches!(doc.lines.last(), Some(line) if line.spans.is_empty()) {
        doc.lines.pop();
    }
    Ok(doc)
}

/// Render one-line markup, as produced by the match highlighter. Falls
/// back to decoded text if the markup does not parse.
pub(crate) fn render_inline(html: &str, palette: Palette) -> Line<'static> {
    match render_document(html, palette) {
        Ok(doc) => doc.lines.into_iter().next().unwrap_or_default(),
        Err(err) => {
            warn!("inline markup failed to render: {err:#}");
            Line::from(decode_entities(html))
        }
    }
}

struct Builder {
    palette: Palette,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    anchors: HashMap<String, usize>,
    links: Vec<LinkRef>,
    open_link: Option<LinkRef>,
    code_blocks: Vec<BlockRange>,
    open_block: Option<usize>,
    in_pre: bool,
    skip_text: usize,
    list_markers: Vec<Option<usize>>,
}

impl Builder {
    fn new(palette: Palette) -> Self {
        Self {
            palette,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![Style::default()],
            anchors: HashMap::new(),
            links: Vec::new(),
            open_link: None,
            code_blocks: Vec::new(),
            open_block: None,
            in_pre: false,
            skip_text: 0,
            list_markers: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let merged = self.style().patch(patch);
        self.styles.push(merged);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    /// The line index the next flushed content will land on.
    fn mark_anchor(&mut self, id: String) {
        let line = self.lines.len();
        self.anchors.entry(id).or_insert(line);
    }

    fn span_exists(&self, line: usize, span: usize) -> bool {
        if line == self.lines.len() {
            span < self.current.len()
        } else {
            self.lines
                .get(line)
                .is_some_and(|rendered| span < rendered.spans.len())
        }
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Flush even when empty, producing an explicit break.
    fn force_line(&mut self) {
        if self.in_pre {
            self.begin_code_line();
        }
        let spans = mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        if matches!(self.lines.last(), Some(line) if !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn end_block(&mut self) {
        self.flush_line();
        self.blank_line();
    }

    fn begin_code_line(&mut self) {
        if self.current.is_empty() {
            let dim = Style::default().fg(self.palette.dim);
            self.current.push(Span::styled(CODE_GUTTER.to_string(), dim));
        }
    }

    fn append_code(&mut self, decoded: &str) {
        for (idx, segment) in decoded.split('\n').enumerate() {
            if idx > 0 {
                self.begin_code_line();
                self.flush_line();
            }
            if !segment.is_empty() {
                self.begin_code_line();
                let style = self.style();
                self.current.push(Span::styled(segment.to_string(), style));
            }
        }
    }

    fn append_prose(&mut self, decoded: &str) {
        let collapsed = collapse_whitespace(decoded);
        let text = if self.current_ends_with_space() {
            collapsed.strip_prefix(' ').unwrap_or(&collapsed)
        } else {
            &collapsed
        };
        if text.is_empty() {
            return;
        }
        let style = self.style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn current_ends_with_space(&self) -> bool {
        match self.current.last() {
            Some(span) => span.content.ends_with(' '),
            None => true,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}
