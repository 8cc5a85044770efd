//! Supplementary flat index of addressable members.
//!
//! The generator emits `functions.json` as a flat list of `::`-joined
//! fully-qualified names for entities that have no sidebar link of their
//! own (member functions, mostly). Entries are matched segment-wise during
//! search and navigate to a synthetic `path#anchor` target.

/// One entry of the supplementary index.
///
/// `segments` keeps the raw split, including any ` (N)` overload-count
/// suffix on the last segment; the suffix is display-only and already
/// stripped from the anchor baked into `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub segments: Vec<String>,
    pub url: String,
}

/// The parsed supplementary index, cached for the process lifetime by the
/// search orchestrator once the first entity search needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberIndex {
    entries: Vec<MemberEntry>,
}

impl MemberIndex {
    /// Build the index from raw `::`-joined names. Empty names are
    /// dropped; everything else becomes one entry.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = names
            .into_iter()
            .filter_map(|name| MemberEntry::parse(name.as_ref()))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[MemberEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl MemberEntry {
    fn parse(name: &str) -> Option<Self> {
        let segments: Vec<String> = name
            .split("::")
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        let last = segments.last()?;
        let anchor = strip_overload_suffix(last);
        let path = segments[..segments.len() - 1].join("/");
        let url = format!("/{path}#{anchor}");
        Some(Self { segments, url })
    }
}

/// Strip a trailing ` (N)` overload-count marker, where `N` is numeric.
/// Any other trailing parenthetical is part of the name and kept.
fn strip_overload_suffix(name: &str) -> &str {
    if let Some(open) = name.rfind(" (")
        && let Some(digits) = name[open + 2..].strip_suffix(')')
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        return &name[..open];
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_splits_segments_and_builds_anchor_target() {
        let index = MemberIndex::from_names(["cocos2d::CCNode::init"]);
        assert_eq!(
            index.entries(),
            &[MemberEntry {
                segments: vec!["cocos2d".into(), "CCNode".into(), "init".into()],
                url: "/cocos2d/CCNode#init".into(),
            }]
        );
    }

    #[test]
    fn overload_suffix_is_stripped_from_anchor_only() {
        let index = MemberIndex::from_names(["cocos2d::CCDirector::getInstance (2)"]);
        let entry = &index.entries()[0];
        assert_eq!(entry.segments.last().map(String::as_str), Some("getInstance (2)"));
        assert_eq!(entry.url, "/cocos2d/CCDirector#getInstance");
    }

    #[test]
    fn non_numeric_parenthetical_is_kept_in_anchor() {
        let index = MemberIndex::from_names(["ax::Node::draw (override)"]);
        assert_eq!(index.entries()[0].url, "/ax/Node#draw (override)");
    }

    #[test]
    fn empty_and_separator_only_names_are_dropped() {
        let index = MemberIndex::from_names(["", "::", "cocos2d::CCNode::init"]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn single_segment_name_anchors_at_the_root_page() {
        let index = MemberIndex::from_names(["kmGLPushMatrix"]);
        assert_eq!(index.entries()[0].url, "/#kmGLPushMatrix");
    }

    #[test]
    fn strip_overload_suffix_requires_trailing_digits() {
        assert_eq!(strip_overload_suffix("init (2)"), "init");
        assert_eq!(strip_overload_suffix("init (12)"), "init");
        assert_eq!(strip_overload_suffix("init ()"), "init ()");
        assert_eq!(strip_overload_suffix("init (2) more"), "init (2) more");
        assert_eq!(strip_overload_suffix("init"), "init");
    }
}
