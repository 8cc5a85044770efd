//! Fuzzy and scoped name matching.
//!
//! The matcher is a single-pass, greedy, leftmost-match subsequence scorer:
//! it never backtracks to find a globally optimal alignment. That keeps it
//! linear and deterministic, at the cost of occasionally preferring an
//! earlier, lower-scoring run over a later tighter one. Known limitation.

const MATCH_LOWER: f32 = 1.0;
const MATCH_UPPER: f32 = 2.0;
const HEAD_BONUS: f32 = 5.0;
const SEGMENT_PENALTY: f32 = 5.0;
const LENGTH_PENALTY_DIVISOR: f32 = 10.0;

const HIGHLIGHT_OPEN: &str = r#"<span class="matched">"#;
const SCOPE_OPEN: &str = r#"<span class="scope">"#;
const SPAN_CLOSE: &str = "</span>";

/// Outcome of a successful match: the ranking score plus the candidate text
/// re-rendered with matched runs wrapped in highlight spans.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub score: f32,
    pub markup: String,
}

/// Match `query` as a case-insensitive, order-preserving subsequence of
/// `candidate`.
///
/// Whitespace in the query is ignored entirely; an empty query yields `None`
/// (the caller shows everything). Every query character must be consumed or
/// the whole call yields `None`. Scoring favors upper-case hits, a hit on the
/// first character, and unbroken runs; a length penalty favors tighter
/// candidates.
pub fn fuzzy_match(candidate: &str, query: &str) -> Option<MatchResult> {
    let query: Vec<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
    if query.is_empty() {
        return None;
    }
    let chars: Vec<char> = candidate.chars().collect();

    let mut markup = String::with_capacity(candidate.len() + HIGHLIGHT_OPEN.len());
    let mut score = 0.0f32;
    let mut run = 0u32;
    let mut query_index = 0usize;
    let mut in_span = false;

    for (position, &ch) in chars.iter().enumerate() {
        if chars_equal_ignore_case(ch, query[query_index]) {
            score += if ch.is_uppercase() { MATCH_UPPER } else { MATCH_LOWER };
            if position == 0 {
                score += HEAD_BONUS;
            }
            score += run as f32;
            run += 1;
            if !in_span {
                markup.push_str(HIGHLIGHT_OPEN);
                in_span = true;
            }
            push_escaped(&mut markup, ch);
            query_index += 1;
            if query_index == query.len() {
                // Query fully consumed: emit the rest of the candidate as-is.
                markup.push_str(SPAN_CLOSE);
                for &rest in &chars[position + 1..] {
                    push_escaped(&mut markup, rest);
                }
                let length_penalty = (chars.len() - query.len()) as f32 / LENGTH_PENALTY_DIVISOR;
                return Some(MatchResult {
                    score: score - length_penalty,
                    markup,
                });
            }
        } else {
            if in_span {
                markup.push_str(SPAN_CLOSE);
                in_span = false;
            }
            run = 0;
            push_escaped(&mut markup, ch);
        }
    }

    // Candidate exhausted with query characters left over.
    None
}

/// Match a `::`- or `/`-scoped query against an ordered sequence of name
/// segments (outer scope first), as produced by the sidebar ancestry or the
/// supplementary entity index.
///
/// The query is split on the first character of `separator` (empty parts
/// dropped) and the parts are consumed in order by a cursor shared across
/// all segments. Matching an enclosing-scope segment costs a penalty so the
/// leaf name stays the preferred anchor of a match.
pub fn scoped_match<S: AsRef<str>>(
    segments: &[S],
    query: &str,
    separator: &str,
) -> Option<MatchResult> {
    let query_parts: Vec<&str> = match separator.chars().next() {
        Some(sep) => query.split(sep).filter(|part| !part.is_empty()).collect(),
        None => vec![query],
    };
    if query_parts.is_empty() {
        return None;
    }

    let mut markup = String::new();
    let mut score = 0.0f32;
    let mut query_index = 0usize;
    let mut matched_any = false;
    let last = segments.len().saturating_sub(1);

    for (position, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        if position > 0 {
            markup.push_str(SCOPE_OPEN);
            markup.push_str(&escape_html(separator));
            markup.push_str(SPAN_CLOSE);
        }
        let part = query_parts[query_index.min(query_parts.len() - 1)];
        match fuzzy_match(segment, part) {
            Some(result) => {
                markup.push_str(&result.markup);
                score += result.score;
                if position != last {
                    score -= SEGMENT_PENALTY;
                }
                query_index += 1;
                if query_index >= query_parts.len() {
                    score -= SEGMENT_PENALTY;
                }
                matched_any = true;
            }
            None => markup.push_str(&escape_html(segment)),
        }
    }

    if !matched_any || query_index < query_parts.len() {
        return None;
    }
    Some(MatchResult { score, markup })
}

fn chars_equal_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

/// Entity-escape text for inclusion in rendered markup. Entity names out of
/// the generator routinely contain `<`, `>` and `&` (operators, templates).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_query_never_matches() {
        assert_eq!(fuzzy_match("CCNode", ""), None);
        assert_eq!(fuzzy_match("", ""), None);
        assert_eq!(fuzzy_match("CCNode", " \t "), None);
    }

    #[test]
    fn exact_self_match_scores_max_and_highlights_one_run() {
        let result = fuzzy_match("abc", "abc").unwrap();
        // a: 1 + 5 head, b: 1 + run 1, c: 1 + run 2; no length penalty.
        assert_eq!(result.score, 11.0);
        assert_eq!(result.markup, r#"<span class="matched">abc</span>"#);

        let result = fuzzy_match("AbC", "AbC").unwrap();
        // A: 2 + 5, b: 1 + 1, C: 2 + 2.
        assert_eq!(result.score, 13.0);
        assert_eq!(result.markup, r#"<span class="matched">AbC</span>"#);
    }

    #[test]
    fn missing_character_yields_none() {
        assert_eq!(fuzzy_match("CCNode", "ccq"), None);
        // Order matters: all characters present, but not as a subsequence.
        assert_eq!(fuzzy_match("abc", "cba"), None);
    }

    #[test]
    fn matching_is_case_insensitive_but_rewards_uppercase() {
        let lower = fuzzy_match("ccnode", "ccn").unwrap();
        let upper = fuzzy_match("CCNode", "ccn").unwrap();
        assert!(upper.score > lower.score);
        assert_eq!(upper.markup, r#"<span class="matched">CCN</span>ode"#);
    }

    #[test]
    fn broken_runs_open_separate_spans() {
        let result = fuzzy_match("CCNode", "cn").unwrap();
        assert_eq!(
            result.markup,
            r#"<span class="matched">C</span>C<span class="matched">N</span>ode"#
        );
    }

    #[test]
    fn run_bonus_prefers_consecutive_matches() {
        // Both consume "no"; in "Node" the run is unbroken, in "nacho" it
        // breaks after the first character.
        let tight = fuzzy_match("Node", "no").unwrap();
        let loose = fuzzy_match("nacho", "no").unwrap();
        assert!(tight.score > loose.score);
    }

    #[test]
    fn length_penalty_favors_tighter_candidates() {
        let short = fuzzy_match("draw", "draw").unwrap();
        let long = fuzzy_match("drawImplementation", "draw").unwrap();
        assert!(short.score > long.score);
    }

    #[test]
    fn whitespace_in_query_is_ignored() {
        let spaced = fuzzy_match("CCNode", "c c n").unwrap();
        let plain = fuzzy_match("CCNode", "ccn").unwrap();
        assert_eq!(spaced.score, plain.score);
        assert_eq!(spaced.markup, plain.markup);
    }

    #[test]
    fn candidate_text_is_entity_escaped() {
        let result = fuzzy_match("operator<<", "op").unwrap();
        assert_eq!(
            result.markup,
            r#"<span class="matched">op</span>erator&lt;&lt;"#
        );
    }

    #[test]
    fn scoped_match_consumes_parts_across_segments() {
        let result = scoped_match(&["Foo", "Bar", "baz"], "Foo::baz", "::").unwrap();
        // "Bar" matches nothing and is rendered unmodified.
        assert_eq!(
            result.markup,
            concat!(
                r#"<span class="matched">Foo</span>"#,
                r#"<span class="scope">::</span>"#,
                "Bar",
                r#"<span class="scope">::</span>"#,
                r#"<span class="matched">baz</span>"#,
            )
        );
        // Foo: 12 - 5 (not last); baz: 11 - 5 (all parts consumed).
        assert_eq!(result.score, 13.0);
    }

    #[test]
    fn scoped_match_requires_every_part_to_land() {
        assert_eq!(scoped_match(&["Foo", "Bar", "baz"], "qux", "::"), None);
        // "Bar" is never matched by any part, so "bar" stays unconsumed.
        assert_eq!(scoped_match(&["Foo", "baz"], "Foo::bar", "::"), None);
    }

    #[test]
    fn scoped_match_drops_empty_query_parts() {
        // Splitting "Foo::baz" on ':' produces empty middle parts.
        let direct = scoped_match(&["Foo", "baz"], "Foo:baz", "::").unwrap();
        let doubled = scoped_match(&["Foo", "baz"], "Foo::baz", "::").unwrap();
        assert_eq!(direct.score, doubled.score);
    }

    #[test]
    fn scoped_match_with_empty_query_is_none() {
        assert_eq!(scoped_match(&["Foo", "baz"], "", "::"), None);
        assert_eq!(scoped_match(&["Foo", "baz"], "::::", "::"), None);
    }

    #[test]
    fn scoped_match_on_no_segments_is_none() {
        let segments: [&str; 0] = [];
        assert_eq!(scoped_match(&segments, "foo", "::"), None);
    }

    #[test]
    fn single_part_query_matches_leaf_segment() {
        let result = scoped_match(&["cocos2d", "CCNode"], "ccnode", "::").unwrap();
        assert!(result.markup.ends_with(r#"<span class="matched">CCNode</span>"#));
        assert!(result.markup.starts_with("cocos2d"));
    }

    #[test]
    fn path_separator_uses_first_character_only() {
        let result = scoped_match(&["tutorials", "getting-started"], "tut/get", "/").unwrap();
        assert!(result.markup.contains(r#"<span class="scope">/</span>"#));
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
