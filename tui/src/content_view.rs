use docscope_runtime::CodeBlock;
use docscope_runtime::PageView;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::markup::RenderedDocument;
use crate::markup::render_document;
use crate::palette::Palette;
use crate::text_formatting::truncate_text;

/// Outcome of the most recent copy action, shown as a badge in the title
/// row until the reset event clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CopyStatus {
    #[default]
    Idle,
    Copied,
    Failed,
}

/// Scrollable rendering of the current page. Holds the rendered lines
/// plus the anchor, link, and code block tables derived from them.
#[derive(Debug, Default)]
pub(crate) struct ContentView {
    title: String,
    doc: RenderedDocument,
    code_blocks: Vec<CodeBlock>,
    scroll: usize,
    selected_link: Option<usize>,
    highlight_line: Option<usize>,
    copy_status: CopyStatus,
    last_body_height: usize,
}

impl ContentView {
    /// Replace the displayed page. Scroll starts at the top unless the
    /// navigation carried a resolvable fragment.
    pub(crate) fn set_page(&mut self, view: &PageView, palette: Palette) {
        self.doc = match render_document(&view.page.html, palette) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("page markup failed to render: {err:#}");
                RenderedDocument {
                    lines: view
                        .page
                        .html
                        .lines()
                        .map(|line| Line::from(line.to_string()))
                        .collect(),
                    ..RenderedDocument::default()
                }
            }
        };
        self.title = view.title.clone();
        self.code_blocks = view.page.code_blocks.clone();
        self.scroll = 0;
        self.selected_link = None;
        self.highlight_line = None;
        self.copy_status = CopyStatus::Idle;
        if let Some(id) = &view.highlighted {
            self.scroll_to_anchor(id);
        }
    }

    /// Re-render the current lines, e.g. after a theme change.
    pub(crate) fn restyle(&mut self, view: Option<&PageView>, palette: Palette) {
        if let Some(view) = view {
            let scroll = self.scroll;
            let selected = self.selected_link;
            let highlight = self.highlight_line;
            self.set_page(view, palette);
            self.scroll = scroll.min(self.doc.lines.len().saturating_sub(1));
            self.selected_link = selected.filter(|idx| *idx < self.doc.links.len());
            self.highlight_line = highlight;
        }
    }

    pub(crate) fn scroll_to_anchor(&mut self, id: &str) -> bool {
        match self.doc.anchors.get(id) {
            Some(line) => {
                self.scroll = *line;
                self.highlight_line = Some(*line);
                true
            }
            None => false,
        }
    }

    pub(crate) fn scroll_by(&mut self, delta: isize) {
        let limit = self.doc.lines.len().saturating_sub(1) as isize;
        self.scroll = (self.scroll as isize + delta).clamp(0, limit) as usize;
    }

    pub(crate) fn page_by(&mut self, delta: isize) {
        let step = (self.last_body_height.max(1) as isize) * delta;
        self.scroll_by(step);
    }

    pub(crate) fn jump_to_start(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn jump_to_end(&mut self) {
        self.scroll = self.doc.lines.len().saturating_sub(1);
    }

    /// Move link selection forward or backward, scrolling the selected
    /// link into view. Returns false when the page has no links.
    pub(crate) fn cycle_link(&mut self, forward: bool) -> bool {
        if self.doc.links.is_empty() {
            return false;
        }
        let len = self.doc.links.len();
        let next = match self.selected_link {
            None => {
                if forward {
                    0
                } else {
                    len - 1
                }
            }
            Some(idx) => {
                if forward {
                    (idx + 1) % len
                } else if idx == 0 {
                    len - 1
                } else {
                    idx - 1
                }
            }
        };
        self.selected_link = Some(next);
        let line = self.doc.links[next].line;
        self.scroll = line.min(self.doc.lines.len().saturating_sub(1));
        true
    }

    pub(crate) fn selected_link_url(&self) -> Option<&str> {
        self.selected_link
            .and_then(|idx| self.doc.links.get(idx))
            .map(|link| link.url.as_str())
    }

    /// The code block to copy: the first one intersecting the viewport.
    pub(crate) fn visible_code_block(&self) -> Option<&CodeBlock> {
        let top = self.scroll;
        let bottom = self.scroll + self.last_body_height.max(1);
        let index = self
            .doc
            .code_blocks
            .iter()
            .position(|range| range.start < bottom && range.end > top)?;
        self.code_blocks.get(index)
    }

    pub(crate) fn set_copy_status(&mut self, status: CopyStatus) {
        self.copy_status = status;
    }

    pub(crate) fn render(&mut self, area: Rect, buf: &mut Buffer, palette: Palette) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let title_area = Rect { height: 1, ..area };
        self.render_title(title_area, buf, palette);
        if area.height < 2 {
            return;
        }
        let body = Rect {
            y: area.y + 1,
            height: area.height - 1,
            ..area
        };
        self.last_body_height = body.height as usize;

        if self.doc.lines.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "Nothing loaded yet".to_string(),
                Style::default().fg(palette.dim),
            )))
            .render(body, buf);
            return;
        }

        let start = self.scroll.min(self.doc.lines.len().saturating_sub(1));
        let end = (start + body.height as usize).min(self.doc.lines.len());
        let selected = self
            .selected_link
            .and_then(|idx| self.doc.links.get(idx))
            .cloned();
        let mut visible = Vec::with_capacity(end - start);
        for (offset, line) in self.doc.lines[start..end].iter().enumerate() {
            let absolute = start + offset;
            let mut line = line.clone();
            if self.highlight_line == Some(absolute) {
                line = line.style(Style::default().bg(palette.dim));
            }
            if let Some(link) = &selected
                && link.line == absolute
                && let Some(span) = line.spans.get_mut(link.span)
            {
                span.style = span.style.add_modifier(Modifier::REVERSED);
            }
            visible.push(line);
        }
        Paragraph::new(visible).render(body, buf);
    }

    fn render_title(&self, area: Rect, buf: &mut Buffer, palette: Palette) {
        let badge = match self.copy_status {
            CopyStatus::Idle => None,
            CopyStatus::Copied => Some(Span::styled(
                "copied".to_string(),
                Style::default().fg(palette.ok),
            )),
            CopyStatus::Failed => Some(Span::styled(
                "copy failed".to_string(),
                Style::default().fg(palette.err),
            )),
        };
        let badge_width = badge
            .as_ref()
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()) + 1)
            .unwrap_or(0);
        let title_budget = (area.width as usize).saturating_sub(badge_width + 1);
        let title = Span::styled(
            format!(" {}", truncate_text(&self.title, title_budget)),
            Style::default()
                .fg(palette.heading)
                .add_modifier(Modifier::BOLD),
        );
        Paragraph::new(Line::from(title)).render(area, buf);
        if let Some(badge) = badge {
            let width = UnicodeWidthStr::width(badge.content.as_ref()) as u16;
            if area.width > width {
                let badge_area = Rect {
                    x: area.right() - width,
                    width,
                    ..area
                };
                Paragraph::new(Line::from(badge)).render(badge_area, buf);
            }
        }
    }
}
