//! # Docscope Runtime
//!
//! This crate is the client-side runtime for a statically generated
//! documentation site: it fetches the navigation tree and page fragments
//! over HTTP, builds the collapsible sidebar, runs fuzzy search over
//! entity and tutorial names, and drives single-page-style navigation
//! with history restore. Rendering is left to a frontend; everything here
//! is headless and event-driven.
//!
//! ## Features
//!
//! - Fuzzy and scope-aware matching with highlighted result markup
//! - Debounced search over the sidebar tree plus a lazily loaded member
//!   index
//! - Concurrent page + metadata fetching joined before display
//! - History back/forward restore without re-fetching
//! - Idempotent content augmentation (heading anchors, copyable code
//!   blocks, emoji substitution)
//! - Persisted theme preference
//!
//! ## Example
//!
//! ```no_run
//! use docscope_runtime::DocsClient;
//! use docscope_runtime::SearchOrchestrator;
//! use tokio::sync::mpsc::unbounded_channel;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DocsClient::new("http://localhost:8080")?;
//!     let manifest = client.nav().await?;
//!
//!     let (tx, mut rx) = unbounded_channel();
//!     let mut search = SearchOrchestrator::new(client, tx);
//!     search.set_query("CCNode");
//!     // Feed events from `rx` back into the orchestrator as they arrive.
//!     Ok(())
//! }
//! ```

mod augment;
mod fetch;
mod matcher;
mod member_index;
mod model;
mod nav;
mod navigator;
mod search;
mod theme;

pub use augment::{
    ANCHOR_MARKER_ATTR, AugmentedPage, CodeBlock, COPY_MARKER_ATTR, OutlineEntry, OutlineKind,
    PassthroughHooks, RenderHooks, augment, decode_entities,
};
pub use fetch::{DocsClient, FetchError, FetchedPage};
pub use matcher::{MatchResult, escape_html, fuzzy_match, scoped_match};
pub use member_index::{MemberEntry, MemberIndex};
pub use model::{HistoryEntry, IconRef, NavManifest, NavNode, PageMetadata, Tab};
pub use nav::{DirNode, LinkNode, SidebarNode, SidebarTree, TreeRow, TreeRowKind};
pub use navigator::{NavEvent, PageNavigator, PageView};
pub use search::{
    DEBOUNCE_DELAY, Debouncer, NO_RESULTS_PLACEHOLDER, RESULT_CAP, SearchEvent, SearchMode,
    SearchOrchestrator, SearchResult,
};
pub use theme::{DEFAULT_THEME, ThemeStore};
