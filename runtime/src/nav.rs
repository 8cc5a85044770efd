//! Sidebar tree construction.
//!
//! A `SidebarTree` is the displayed form of one tab's `NavNode` description.
//! Qualified-name paths are computed once here, at build time, so search
//! candidates never re-derive ancestry from rendered structure.

use crate::model::IconRef;
use crate::model::NavNode;

/// One buildable sidebar entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarNode {
    Dir(DirNode),
    Link(LinkNode),
}

/// A collapsible directory row. Named roots become directories that can
/// never collapse.
#[derive(Debug, Clone, PartialEq)]
pub struct DirNode {
    pub name: String,
    pub icon: Option<IconRef>,
    pub expanded: bool,
    pub always_expanded: bool,
    pub items: Vec<SidebarNode>,
}

/// A navigable leaf row. `path` is the full qualified name, outer scope
/// first, ending with the link's own display name.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkNode {
    pub name: String,
    pub icon: Option<IconRef>,
    pub url: String,
    pub path: Vec<String>,
}

/// The built sidebar for one tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarTree {
    items: Vec<SidebarNode>,
}

/// Flattened view of one visible row, for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeRow<'a> {
    pub depth: usize,
    pub icon: Option<&'a IconRef>,
    pub kind: TreeRowKind<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeRowKind<'a> {
    Dir { name: &'a str, expanded: bool },
    Link { name: &'a str, url: &'a str },
}

impl SidebarTree {
    /// Build the displayed structure from a declarative tree description.
    /// An anonymous root contributes its children directly; a named root
    /// becomes a permanently expanded directory.
    pub fn build(node: &NavNode) -> Self {
        let mut items = Vec::new();
        build_into(node, &mut Vec::new(), &mut items);
        Self { items }
    }

    /// All visible rows in display order, honoring expansion state.
    pub fn visible_rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::new();
        collect_rows(&self.items, 0, &mut rows);
        rows
    }

    /// Every navigable link in the tree, regardless of expansion state.
    pub fn links(&self) -> Vec<&LinkNode> {
        let mut links = Vec::new();
        collect_links(&self.items, &mut links);
        links
    }

    /// Toggle the directory at the given visible-row index. Rows holding
    /// links or permanently expanded directories are left untouched.
    pub fn toggle_at(&mut self, row: usize) {
        let mut cursor = 0usize;
        toggle_at(&mut self.items, row, &mut cursor);
    }

    /// Expand every ancestor of the link with the given url so it becomes
    /// visible. Returns false if no such link exists.
    pub fn reveal(&mut self, url: &str) -> bool {
        reveal(&mut self.items, url)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn build_into(node: &NavNode, ancestry: &mut Vec<String>, out: &mut Vec<SidebarNode>) {
    match node {
        NavNode::Root { name: None, items } => {
            for item in items {
                build_into(item, ancestry, out);
            }
        }
        NavNode::Root {
            name: Some(name),
            items,
        } => {
            out.push(build_dir(name, None, true, true, items, ancestry));
        }
        NavNode::Dir {
            name,
            icon,
            open,
            items,
        } => {
            out.push(build_dir(name, icon.clone(), *open, false, items, ancestry));
        }
        NavNode::Link { name, icon, url } => {
            let mut path = ancestry.clone();
            path.push(name.clone());
            out.push(SidebarNode::Link(LinkNode {
                name: name.clone(),
                icon: icon.clone(),
                url: url.clone(),
                path,
            }));
        }
    }
}

fn build_dir(
    name: &str,
    icon: Option<IconRef>,
    expanded: bool,
    always_expanded: bool,
    items: &[NavNode],
    ancestry: &mut Vec<String>,
) -> SidebarNode {
    ancestry.push(name.to_string());
    let mut children = Vec::new();
    for item in items {
        build_into(item, ancestry, &mut children);
    }
    ancestry.pop();
    SidebarNode::Dir(DirNode {
        name: name.to_string(),
        icon,
        expanded: expanded || always_expanded,
        always_expanded,
        items: children,
    })
}

fn collect_rows<'a>(items: &'a [SidebarNode], depth: usize, out: &mut Vec<TreeRow<'a>>) {
    for item in items {
        match item {
            SidebarNode::Dir(dir) => {
                out.push(TreeRow {
                    depth,
                    icon: dir.icon.as_ref(),
                    kind: TreeRowKind::Dir {
                        name: &dir.name,
                        expanded: dir.expanded,
                    },
                });
                if dir.expanded {
                    collect_rows(&dir.items, depth + 1, out);
                }
            }
            SidebarNode::Link(link) => {
                out.push(TreeRow {
                    depth,
                    icon: link.icon.as_ref(),
                    kind: TreeRowKind::Link {
                        name: &link.name,
                        url: &link.url,
                    },
                });
            }
        }
    }
}

fn collect_links<'a>(items: &'a [SidebarNode], out: &mut Vec<&'a LinkNode>) {
    for item in items {
        match item {
            SidebarNode::Dir(dir) => collect_links(&dir.items, out),
            SidebarNode::Link(link) => out.push(link),
        }
    }
}

fn toggle_at(items: &mut [SidebarNode], target: usize, cursor: &mut usize) -> bool {
    for item in items {
        match item {
            SidebarNode::Dir(dir) => {
                if *cursor == target {
                    if !dir.always_expanded {
                        dir.expanded = !dir.expanded;
                    }
                    return true;
                }
                *cursor += 1;
                if dir.expanded && toggle_at(&mut dir.items, target, cursor) {
                    return true;
                }
            }
            SidebarNode::Link(_) => {
                if *cursor == target {
                    return true;
                }
                *cursor += 1;
            }
        }
    }
    false
}

fn reveal(items: &mut [SidebarNode], url: &str) -> bool {
    for item in items {
        match item {
            SidebarNode::Dir(dir) => {
                if reveal(&mut dir.items, url) {
                    dir.expanded = true;
                    return true;
                }
            }
            SidebarNode::Link(link) => {
                if link.url == url {
                    return true;
                }
            }
        }
    }
    false
}
