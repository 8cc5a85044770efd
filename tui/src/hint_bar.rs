use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::palette::Palette;

/// Key hints for the bottom row, as `(key, action)` pairs.
pub(crate) fn hints_line(entries: &[(&str, &str)], palette: Palette) -> Line<'static> {
    let dim = Style::default().fg(palette.dim);
    let mut spans: Vec<Span<'static>> = vec![Span::raw(" ")];
    for (idx, (key, action)) in entries.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" · ".to_string(), dim));
        }
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {action}"), dim));
    }
    Line::from(spans)
}
