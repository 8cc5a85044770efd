use serde::Deserialize;
use serde::Serialize;

/// Symbolic icon reference as emitted by the generator: the icon name plus a
/// style variant flag, serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef(pub String, pub bool);

impl IconRef {
    pub fn new(name: impl Into<String>, variant: bool) -> Self {
        Self(name.into(), variant)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn variant(&self) -> bool {
        self.1
    }
}

/// One node of the declarative navigation tree in `nav.json`.
///
/// Only `Link` nodes are navigable leaves. An anonymous `Root` (no name)
/// contributes its children directly to the parent without wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavNode {
    Root {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        items: Vec<NavNode>,
    },
    Dir {
        name: String,
        #[serde(default)]
        icon: Option<IconRef>,
        #[serde(default)]
        open: bool,
        #[serde(default)]
        items: Vec<NavNode>,
    },
    Link {
        name: String,
        #[serde(default)]
        icon: Option<IconRef>,
        url: String,
    },
}

impl Default for NavNode {
    fn default() -> Self {
        NavNode::Root {
            name: None,
            items: Vec::new(),
        }
    }
}

/// Top-level shape of `nav.json`: one tree per sidebar tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavManifest {
    #[serde(default)]
    pub entities: NavNode,
    #[serde(default)]
    pub tutorials: NavNode,
}

impl NavManifest {
    pub fn tree(&self, tab: Tab) -> &NavNode {
        match tab {
            Tab::Entities => &self.entities,
            Tab::Tutorials => &self.tutorials,
        }
    }
}

/// Sidebar tab selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Entities,
    Tutorials,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Entities, Tab::Tutorials];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Entities => "Entities",
            Tab::Tutorials => "Tutorials",
        }
    }
}

/// Shape of a page's `metadata.json`. Unknown fields are retained verbatim
/// and echoed into history state, as the generator emits arbitrary extra
/// keys alongside the title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One session-history entry, pushed on every successful navigation. Carries
/// the fetched markup so back/forward can restore the page without another
/// round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub html: String,
    pub metadata: PageMetadata,
}
