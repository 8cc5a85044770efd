use anyhow::Result;
use docscope_runtime::RenderHooks;
use docscope_runtime::escape_html;

/// Rendering services for the terminal frontend: `:shortcode:` emoji
/// substitution backed by the shortcode table, and escaped code blocks.
/// Code styling happens at draw time, so the highlight hook only has to
/// keep the markup well formed.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TerminalHooks;

impl RenderHooks for TerminalHooks {
    fn substitute_emoji(&self, text: &str) -> Result<String> {
        Ok(replace_shortcodes(text))
    }

    fn highlight(&self, code: &str, _language: Option<&str>) -> Result<String> {
        Ok(escape_html(code))
    }
}

fn is_shortcode_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-')
}

/// Replace `:name:` occurrences that resolve in the shortcode table with
/// the emoji itself. Unknown names and stray colons pass through.
fn replace_shortcodes(text: &str) -> String {
    if !text.contains(':') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(':') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(':') {
            Some(close) => {
                let name = &after[..close];
                if !name.is_empty()
                    && name.chars().all(is_shortcode_char)
                    && let Some(emoji) = emojis::get_by_shortcode(name)
                {
                    out.push_str(emoji.as_str());
                    rest = &after[close + 1..];
                } else {
                    out.push(':');
                    rest = after;
                }
            }
            None => {
                out.push(':');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_shortcodes_become_emoji() {
        assert_eq!(replace_shortcodes("ship it :rocket:"), "ship it 🚀");
        assert_eq!(replace_shortcodes(":+1: and :100:"), "👍 and 💯");
    }

    #[test]
    fn unknown_shortcodes_pass_through() {
        assert_eq!(
            replace_shortcodes(":not_a_real_emoji_name:"),
            ":not_a_real_emoji_name:"
        );
    }

    #[test]
    fn stray_colons_are_preserved() {
        assert_eq!(replace_shortcodes("std::vector"), "std::vector");
        assert_eq!(replace_shortcodes("ratio 1:2:3"), "ratio 1:2:3");
        assert_eq!(replace_shortcodes("trailing:"), "trailing:");
    }

    #[test]
    fn adjacent_shortcodes_are_all_replaced() {
        assert_eq!(replace_shortcodes(":rocket::rocket:"), "🚀🚀");
    }

    #[test]
    fn highlight_escapes_markup() {
        let hooks = TerminalHooks;
        let rendered = hooks.highlight("if (a < b) {}", Some("cpp")).unwrap();
        assert_eq!(rendered, "if (a &lt; b) {}");
    }
}
