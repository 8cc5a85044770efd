use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Truncate `text` to at most `max_width` terminal columns, appending an
/// ellipsis when anything was cut.
pub(crate) fn truncate_text(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + width > budget {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_text("CCNode", 10), "CCNode");
        assert_eq!(truncate_text("CCNode", 6), "CCNode");
    }

    #[test]
    fn long_text_gets_an_ellipsis() {
        assert_eq!(truncate_text("drawImplementation", 8), "drawImp…");
    }

    #[test]
    fn wide_characters_count_as_two_columns() {
        assert_eq!(truncate_text("ノードの描画", 7), "ノード…");
    }
}
