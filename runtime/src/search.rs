//! Search state and orchestration.

use crate::fetch::DocsClient;
use crate::matcher::scoped_match;
use crate::member_index::MemberIndex;
use crate::model::Tab;
use crate::nav::SidebarTree;
use std::cmp::Ordering;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::warn;

/// Keystrokes within this window collapse into one executed search.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(50);

/// Displayed results are capped here; a performance bound, not a
/// correctness requirement.
pub const RESULT_CAP: usize = 350;

/// Shown in place of the result list when nothing matched.
pub const NO_RESULTS_PLACEHOLDER: &str = "No results found";

/// Events the orchestrator delivers back to its owner's event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The debounce window expired for this query. `query` echoes the
    /// typed text so the owner can decide whether the completion is
    /// still relevant before executing it.
    QueryReady { query: String },

    /// The supplementary member index finished loading. Delivered once
    /// per process; a failed load is logged and delivered as an empty
    /// index rather than retried.
    MemberIndexLoaded { index: MemberIndex },
}

/// Whether the sidebar shows the tree or a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Idle,
    Searching,
}

/// One ranked search hit. `markup` carries the highlighted rendering
/// produced by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub score: f32,
    pub markup: String,
    pub url: String,
}

/// A cancellable scheduled task that delays query execution until typing
/// pauses. Rescheduling aborts the previously scheduled send.
#[derive(Debug, Default)]
pub struct Debouncer {
    task: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn schedule(&mut self, tx: UnboundedSender<SearchEvent>, query: String) {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_DELAY).await;
            if let Err(err) = tx.send(SearchEvent::QueryReady { query }) {
                error!("failed to send debounced query: {err}");
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

enum MemberIndexState {
    NotRequested,
    Loading,
    Ready(MemberIndex),
}

/// Owns the query, the debounce task, the cached member index, and the
/// current result list. Constructed once per session.
pub struct SearchOrchestrator {
    client: DocsClient,
    tx: UnboundedSender<SearchEvent>,
    query: String,
    results: Vec<SearchResult>,
    member_index: MemberIndexState,
    debouncer: Debouncer,
}

impl SearchOrchestrator {
    pub fn new(client: DocsClient, tx: UnboundedSender<SearchEvent>) -> Self {
        Self {
            client,
            tx,
            query: String::new(),
            results: Vec::new(),
            member_index: MemberIndexState::NotRequested,
            debouncer: Debouncer::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        if self.query.is_empty() {
            SearchMode::Idle
        } else {
            SearchMode::Searching
        }
    }

    pub fn current_results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Record a query edit. Execution happens later, when the debounce
    /// window expires and the owner feeds the completion back through
    /// [`SearchOrchestrator::on_query_ready`].
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        if self.query.is_empty() {
            self.debouncer.cancel();
            self.results.clear();
            return;
        }
        self.debouncer.schedule(self.tx.clone(), self.query.clone());
    }

    /// Drop the query and the result list, restoring the tree view.
    pub fn clear(&mut self) {
        self.query.clear();
        self.debouncer.cancel();
        self.results.clear();
    }

    /// Execute a debounced query against the given tab's tree. Stale
    /// completions, where the echoed query no longer matches the typed
    /// text, are dropped. The first entity search also kicks off the one
    /// member index load of the session.
    pub fn on_query_ready(&mut self, query: &str, tree: &SidebarTree, tab: Tab) {
        if query != self.query || self.query.is_empty() {
            return;
        }
        if tab == Tab::Entities && matches!(self.member_index, MemberIndexState::NotRequested) {
            self.member_index = MemberIndexState::Loading;
            self.spawn_member_index_load();
        }
        self.results = self.execute(query, tree, tab);
    }

    /// Cache the loaded member index and fold it into the current result
    /// list if a search is showing.
    pub fn on_member_index(&mut self, index: MemberIndex, tree: &SidebarTree, tab: Tab) {
        self.member_index = MemberIndexState::Ready(index);
        if !self.query.is_empty() {
            self.results = self.execute(&self.query.clone(), tree, tab);
        }
    }

    fn spawn_member_index_load(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let index = match client.member_index().await {
                Ok(index) => index,
                Err(err) => {
                    warn!("failed to load member index: {err}");
                    MemberIndex::default()
                }
            };
            if let Err(err) = tx.send(SearchEvent::MemberIndexLoaded { index }) {
                error!("failed to send member index: {err}");
            }
        });
    }

    fn execute(&self, query: &str, tree: &SidebarTree, tab: Tab) -> Vec<SearchResult> {
        let separator = tab_separator(tab);
        let mut results = Vec::new();
        for link in tree.links() {
            if let Some(found) = scoped_match(&link.path, query, separator) {
                results.push(SearchResult {
                    score: found.score,
                    markup: found.markup,
                    url: link.url.clone(),
                });
            }
        }
        if tab == Tab::Entities
            && let MemberIndexState::Ready(index) = &self.member_index
        {
            for entry in index.entries() {
                if let Some(found) = scoped_match(&entry.segments, query, "::") {
                    results.push(SearchResult {
                        score: found.score,
                        markup: found.markup,
                        url: entry.url.clone(),
                    });
                }
            }
        }
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.url.cmp(&b.url))
        });
        results.truncate(RESULT_CAP);
        results
    }
}

fn tab_separator(tab: Tab) -> &'static str {
    match tab {
        Tab::Entities => "::",
        Tab::Tutorials => "/",
    }
}
