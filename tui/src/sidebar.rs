use docscope_runtime::IconRef;
use docscope_runtime::NO_RESULTS_PLACEHOLDER;
use docscope_runtime::SearchMode;
use docscope_runtime::SearchResult;
use docscope_runtime::SidebarTree;
use docscope_runtime::Tab;
use docscope_runtime::TreeRowKind;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;

use crate::markup::render_inline;
use crate::palette::Palette;

/// Everything the sidebar needs for one draw. Owned by the app; the view
/// itself only keeps selection and scroll state.
pub(crate) struct SidebarContext<'a> {
    pub tab: Tab,
    pub query: &'a str,
    pub mode: SearchMode,
    pub tree: &'a SidebarTree,
    pub results: &'a [SearchResult],
    pub selected_url: Option<&'a str>,
    pub palette: Palette,
}

#[derive(Debug, Default)]
pub(crate) struct SidebarView {
    pub selected: usize,
    pub input_active: bool,
    first_visible: usize,
}

impl SidebarView {
    pub(crate) fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected.min(len - 1) as isize;
        self.selected = current.saturating_add(delta).clamp(0, len as isize - 1) as usize;
    }

    pub(crate) fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub(crate) fn render(&mut self, area: Rect, buf: &mut Buffer, ctx: &SidebarContext) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let tabs_area = Rect { height: 1, ..area };
        Paragraph::new(tabs_line(ctx)).render(tabs_area, buf);
        if area.height < 2 {
            return;
        }
        let input_area = Rect {
            y: area.y + 1,
            height: 1,
            ..area
        };
        Paragraph::new(input_line(self.input_active, ctx)).render(input_area, buf);
        if area.height < 3 {
            return;
        }
        let body = Rect {
            y: area.y + 2,
            height: area.height - 2,
            ..area
        };

        let lines = match ctx.mode {
            SearchMode::Searching => result_lines(ctx.results, ctx.palette),
            SearchMode::Idle => tree_lines(ctx.tree, ctx.selected_url, ctx.palette),
        };
        self.clamp_selection(lines.len());
        self.ensure_visible(lines.len(), body.height as usize);

        let end = (self.first_visible + body.height as usize).min(lines.len());
        let mut visible = Vec::with_capacity(end.saturating_sub(self.first_visible));
        for (offset, line) in lines[self.first_visible..end].iter().enumerate() {
            let absolute = self.first_visible + offset;
            if absolute == self.selected && !lines.is_empty() {
                visible.push(
                    line.clone()
                        .style(Style::default().add_modifier(Modifier::REVERSED)),
                );
            } else {
                visible.push(line.clone());
            }
        }
        Paragraph::new(visible).render(body, buf);
    }

    fn ensure_visible(&mut self, len: usize, height: usize) {
        if len == 0 || height == 0 {
            self.first_visible = 0;
            return;
        }
        if self.first_visible >= len {
            self.first_visible = len - 1;
        }
        if self.selected < self.first_visible {
            self.first_visible = self.selected;
        } else if self.selected >= self.first_visible + height {
            self.first_visible = self.selected + 1 - height;
        }
    }
}

fn tabs_line(ctx: &SidebarContext) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = vec![Span::raw(" ")];
    for (idx, tab) in Tab::ALL.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(
                " │ ".to_string(),
                Style::default().fg(ctx.palette.dim),
            ));
        }
        let style = if tab == ctx.tab {
            Style::default()
                .fg(ctx.palette.heading)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(ctx.palette.dim)
        };
        spans.push(Span::styled(tab.label().to_string(), style));
    }
    Line::from(spans)
}

fn input_line(input_active: bool, ctx: &SidebarContext) -> Line<'static> {
    let dim = Style::default().fg(ctx.palette.dim);
    let mut spans = vec![Span::styled(" / ".to_string(), dim)];
    if ctx.query.is_empty() && !input_active {
        spans.push(Span::styled("to search".to_string(), dim));
    } else {
        spans.push(Span::raw(ctx.query.to_string()));
    }
    if input_active {
        spans.push(Span::styled(
            "▌".to_string(),
            Style::default().fg(ctx.palette.matched),
        ));
    }
    Line::from(spans)
}

pub(crate) fn tree_lines(
    tree: &SidebarTree,
    selected_url: Option<&str>,
    palette: Palette,
) -> Vec<Line<'static>> {
    let dim = Style::default().fg(palette.dim);
    tree.visible_rows()
        .into_iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            match row.kind {
                TreeRowKind::Dir { name, expanded } => {
                    let marker = if expanded { "▾ " } else { "▸ " };
                    Line::from(vec![
                        Span::styled(format!("{indent}{marker}"), dim),
                        Span::styled(name.to_string(), Style::default()),
                    ])
                }
                TreeRowKind::Link { name, url } => {
                    let style = if selected_url == Some(url) {
                        Style::default()
                            .fg(palette.link)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Line::from(vec![
                        Span::styled(format!("{indent}{} ", icon_glyph(row.icon)), dim),
                        Span::styled(name.to_string(), style),
                    ])
                }
            }
        })
        .collect()
}

pub(crate) fn result_lines(results: &[SearchResult], palette: Palette) -> Vec<Line<'static>> {
    if results.is_empty() {
        return vec![Line::from(Span::styled(
            NO_RESULTS_PLACEHOLDER.to_string(),
            Style::default().fg(palette.dim),
        ))];
    }
    results
        .iter()
        .map(|result| render_inline(&result.markup, palette))
        .collect()
}

fn icon_glyph(icon: Option<&IconRef>) -> &'static str {
    match icon.map(IconRef::name) {
        Some("class" | "struct" | "type" | "interface") => "◆",
        Some("function" | "method") => "ƒ",
        Some("file" | "page" | "tutorial" | "doc") => "▤",
        _ => "·",
    }
}
