//! Content augmentation pass.
//!
//! Fetched page markup is run through a streaming rewrite that injects
//! heading anchors, marks copyable code blocks, substitutes emoji
//! shortcodes, and collects an outline of addressable ids for fragment
//! targeting. Injections are guarded by marker attributes so augmenting
//! already-augmented markup changes nothing, which keeps history restores
//! safe to re-augment.

use crate::matcher::escape_html;
use anyhow::Context;
use anyhow::Result;
use lol_html::RewriteStrSettings;
use lol_html::doc_text;
use lol_html::element;
use lol_html::html_content::ContentType;
use lol_html::rewrite_str;
use lol_html::text;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// Marker set on headings that already carry an injected anchor link.
pub const ANCHOR_MARKER_ATTR: &str = "data-anchored";
/// Marker set on code blocks that a copy action can target.
pub const COPY_MARKER_ATTR: &str = "data-copyable";

/// Opaque rendering services invoked during augmentation. Hook failures
/// are logged and the affected content is left untouched; they never
/// abort the rest of the page load.
pub trait RenderHooks {
    /// Replace `:shortcode:` occurrences in markup-encoded text. Called
    /// for every text chunk outside of `<pre>` blocks.
    fn substitute_emoji(&self, text: &str) -> Result<String>;

    /// Produce highlighted markup for one code block. `code` is the
    /// decoded block text.
    fn highlight(&self, code: &str, language: Option<&str>) -> Result<String>;
}

/// Hooks that leave content untouched apart from markup escaping.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughHooks;

impl RenderHooks for PassthroughHooks {
    fn substitute_emoji(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn highlight(&self, code: &str, _language: Option<&str>) -> Result<String> {
        Ok(escape_html(code))
    }
}

/// One addressable element of a page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub id: String,
    pub kind: OutlineKind,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineKind {
    Heading(u8),
    /// A collapsible section, expanded when targeted by a fragment.
    Section,
}

/// One copyable code block, in document order. The nth block corresponds
/// to the nth element carrying [`COPY_MARKER_ATTR`] in the output markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    /// Decoded text, what a copy action places on the clipboard.
    pub raw: String,
    /// Markup produced by the highlight hook, or escaped raw text when
    /// the hook fails.
    pub rendered: String,
}

/// The result of one augmentation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedPage {
    pub html: String,
    pub outline: Vec<OutlineEntry>,
    pub code_blocks: Vec<CodeBlock>,
}

impl AugmentedPage {
    pub fn outline_entry(&self, id: &str) -> Option<&OutlineEntry> {
        self.outline.iter().find(|entry| entry.id == id)
    }
}

struct RawBlock {
    language: Option<String>,
    text: String,
}

/// Run the augmentation pass over one page fragment.
pub fn augment(html: &str, hooks: &dyn RenderHooks) -> Result<AugmentedPage> {
    let outline = Rc::new(RefCell::new(Vec::<OutlineEntry>::new()));
    let raw_blocks = Rc::new(RefCell::new(Vec::<RawBlock>::new()));
    let pending_block = Rc::new(RefCell::new(Option::<RawBlock>::None));
    let in_pre = Rc::new(Cell::new(false));

    let mut element_content_handlers = Vec::new();

    for level in 1u8..=6 {
        {
            let outline = Rc::clone(&outline);
            element_content_handlers.push(element!(format!("h{level}[id]"), move |el| {
                let Some(id) = el.get_attribute("id") else {
                    return Ok(());
                };
                outline.borrow_mut().push(OutlineEntry {
                    id: id.clone(),
                    kind: OutlineKind::Heading(level),
                    title: String::new(),
                });
                if el.get_attribute(ANCHOR_MARKER_ATTR).is_none() {
                    el.set_attribute(ANCHOR_MARKER_ATTR, "")?;
                    el.prepend(
                        &format!(r##"<a class="anchor" href="#{}"></a>"##, escape_html(&id)),
                        ContentType::Html,
                    );
                }
                Ok(())
            }));
        }
        {
            let outline = Rc::clone(&outline);
            element_content_handlers.push(text!(format!("h{level}[id]"), move |chunk| {
                if let Some(entry) = outline.borrow_mut().last_mut() {
                    entry.title.push_str(chunk.as_str());
                }
                Ok(())
            }));
        }
    }

    {
        let outline = Rc::clone(&outline);
        element_content_handlers.push(element!("details[id]", move |el| {
            let Some(id) = el.get_attribute("id") else {
                return Ok(());
            };
            outline.borrow_mut().push(OutlineEntry {
                id,
                kind: OutlineKind::Section,
                title: String::new(),
            });
            Ok(())
        }));
    }
    {
        let outline = Rc::clone(&outline);
        element_content_handlers.push(text!("details[id] > summary", move |chunk| {
            if let Some(entry) = outline.borrow_mut().last_mut() {
                entry.title.push_str(chunk.as_str());
            }
            Ok(())
        }));
    }

    {
        let in_pre = Rc::clone(&in_pre);
        let raw_blocks = Rc::clone(&raw_blocks);
        let pending_block = Rc::clone(&pending_block);
        element_content_handlers.push(element!("pre", move |el| {
            in_pre.set(true);
            let end_in_pre = Rc::clone(&in_pre);
            let end_blocks = Rc::clone(&raw_blocks);
            let end_pending = Rc::clone(&pending_block);
            el.on_end_tag(move |_end| {
                end_in_pre.set(false);
                if let Some(block) = end_pending.borrow_mut().take() {
                    end_blocks.borrow_mut().push(block);
                }
                Ok(())
            })?;
            Ok(())
        }));
    }

    {
        let raw_blocks = Rc::clone(&raw_blocks);
        let pending_block = Rc::clone(&pending_block);
        element_content_handlers.push(element!("pre > code", move |el| {
            let mut pending = pending_block.borrow_mut();
            if let Some(done) = pending.take() {
                raw_blocks.borrow_mut().push(done);
            }
            let language = el.get_attribute("class").and_then(|class| {
                class
                    .split_whitespace()
                    .find_map(|part| part.strip_prefix("language-").map(str::to_string))
            });
            if el.get_attribute(COPY_MARKER_ATTR).is_none() {
                el.set_attribute(COPY_MARKER_ATTR, "")?;
            }
            *pending = Some(RawBlock {
                language,
                text: String::new(),
            });
            Ok(())
        }));
    }
    {
        let pending_block = Rc::clone(&pending_block);
        element_content_handlers.push(text!("pre > code", move |chunk| {
            if let Some(block) = pending_block.borrow_mut().as_mut() {
                block.text.push_str(chunk.as_str());
            }
            Ok(())
        }));
    }

    let emoji_in_pre = Rc::clone(&in_pre);
    let html = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            document_content_handlers: vec![doc_text!(move |chunk| {
                if emoji_in_pre.get() {
                    return Ok(());
                }
                let original = chunk.as_str().to_string();
                match hooks.substitute_emoji(&original) {
                    Ok(replaced) if replaced != original => {
                        chunk.replace(&replaced, ContentType::Html);
                    }
                    Ok(_) => {}
                    Err(err) => warn!("emoji substitution hook failed: {err:#}"),
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .context("rewrite page markup")?;

    let mut outline = outline.take();
    for entry in &mut outline {
        // Titles are collected from the source text, before the streamed
        // substitution, so the hook has to run over them separately.
        match hooks.substitute_emoji(&entry.title) {
            Ok(replaced) => entry.title = replaced,
            Err(err) => warn!("emoji substitution hook failed: {err:#}"),
        }
        entry.title = decode_entities(entry.title.trim());
    }

    let code_blocks = raw_blocks
        .take()
        .into_iter()
        .map(|block| {
            let raw = decode_entities(&block.text);
            let rendered = match hooks.highlight(&raw, block.language.as_deref()) {
                Ok(markup) => markup,
                Err(err) => {
                    warn!("syntax highlight hook failed: {err:#}");
                    escape_html(&raw)
                }
            };
            CodeBlock {
                language: block.language,
                raw,
                rendered,
            }
        })
        .collect();

    Ok(AugmentedPage {
        html,
        outline,
        code_blocks,
    })
}

/// Decode the five entities the generator escapes. Applied to collected
/// text only, never to markup that is streamed back out.
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    struct TestHooks;

    impl RenderHooks for TestHooks {
        fn substitute_emoji(&self, text: &str) -> Result<String> {
            Ok(text.replace(":tada:", "🎉"))
        }

        fn highlight(&self, code: &str, language: Option<&str>) -> Result<String> {
            Ok(format!(
                r#"<span class="hl-{}">{}</span>"#,
                language.unwrap_or("none"),
                escape_html(code)
            ))
        }
    }

    struct FailingHooks;

    impl RenderHooks for FailingHooks {
        fn substitute_emoji(&self, _text: &str) -> Result<String> {
            Err(anyhow!("emoji backend unavailable"))
        }

        fn highlight(&self, _code: &str, _language: Option<&str>) -> Result<String> {
            Err(anyhow!("highlighter crashed"))
        }
    }

    #[test]
    fn headings_get_anchor_and_outline_entry() {
        let page = augment(r#"<h2 id="usage">Usage</h2>"#, &PassthroughHooks).unwrap();
        assert_eq!(
            page.html,
            r##"<h2 id="usage" data-anchored=""><a class="anchor" href="#usage"></a>Usage</h2>"##
        );
        assert_eq!(
            page.outline,
            vec![OutlineEntry {
                id: "usage".into(),
                kind: OutlineKind::Heading(2),
                title: "Usage".into(),
            }]
        );
    }

    #[test]
    fn collapsible_sections_are_collected() {
        let html = r#"<details id="init" class="entity-desc"><summary><code>void init()</code></summary><p>body</p></details>"#;
        let page = augment(html, &PassthroughHooks).unwrap();
        let entry = page.outline_entry("init").unwrap();
        assert_eq!(entry.kind, OutlineKind::Section);
        assert_eq!(entry.title, "void init()");
    }

    #[test]
    fn code_blocks_are_marked_and_collected() {
        let html = r#"<pre><code class="language-cpp">int x = 1 &lt;&lt; 2;</code></pre>"#;
        let page = augment(html, &TestHooks).unwrap();
        assert!(page.html.contains(r#"data-copyable="""#));
        assert_eq!(page.code_blocks.len(), 1);
        let block = &page.code_blocks[0];
        assert_eq!(block.language.as_deref(), Some("cpp"));
        assert_eq!(block.raw, "int x = 1 << 2;");
        assert_eq!(
            block.rendered,
            r#"<span class="hl-cpp">int x = 1 &lt;&lt; 2;</span>"#
        );
    }

    #[test]
    fn emoji_substitution_skips_pre_blocks() {
        let html = r#"<p>done :tada:</p><pre><code>:tada:</code></pre>"#;
        let page = augment(html, &TestHooks).unwrap();
        assert!(page.html.contains("done 🎉"));
        assert!(page.html.contains("<code data-copyable=\"\">:tada:</code>"));
        assert_eq!(page.code_blocks[0].raw, ":tada:");
    }

    #[test]
    fn augmentation_is_idempotent() {
        let html = concat!(
            r#"<h1 id="top">Top :tada:</h1>"#,
            r#"<p>intro &amp; more :tada:</p>"#,
            r#"<details id="init"><summary>init</summary>text</details>"#,
            r#"<pre><code class="language-cpp">a &lt; b</code></pre>"#,
        );
        let once = augment(html, &TestHooks).unwrap();
        let twice = augment(&once.html, &TestHooks).unwrap();
        assert_eq!(twice.html, once.html);
        assert_eq!(twice.outline, once.outline);
        assert_eq!(twice.code_blocks, once.code_blocks);
    }

    #[test]
    fn failing_hooks_leave_content_untouched() {
        let html = r#"<p>hello :tada:</p><pre><code>let x = 1;</code></pre>"#;
        let page = augment(html, &FailingHooks).unwrap();
        assert!(page.html.contains("hello :tada:"));
        assert_eq!(page.code_blocks[0].rendered, "let x = 1;");
        assert_eq!(page.code_blocks[0].raw, "let x = 1;");
    }

    #[test]
    fn entities_stream_through_untouched() {
        let html = r#"<p>a &amp; b &lt; c</p>"#;
        let page = augment(html, &PassthroughHooks).unwrap();
        assert_eq!(page.html, html);
    }

    #[test]
    fn decode_entities_handles_double_escapes() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&lt;T&gt;"), "<T>");
    }
}
