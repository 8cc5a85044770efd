//! Page navigation and history.

use crate::augment::AugmentedPage;
use crate::augment::RenderHooks;
use crate::augment::augment;
use crate::fetch::DocsClient;
use crate::fetch::FetchError;
use crate::fetch::FetchedPage;
use crate::model::HistoryEntry;
use crate::model::PageMetadata;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tracing::error;
use tracing::warn;

/// Completion of one page fetch.
#[derive(Debug)]
pub enum NavEvent {
    /// `generation` identifies the navigation that issued the fetch;
    /// completions from superseded navigations are dropped so a slow
    /// earlier load can never overwrite a faster later one.
    PageLoaded {
        generation: u64,
        url: String,
        fragment: Option<String>,
        result: Result<FetchedPage, FetchError>,
    },
}

/// The displayed page after a successful navigation or history restore.
#[derive(Debug, Clone)]
pub struct PageView {
    pub url: String,
    pub title: String,
    pub page: AugmentedPage,
    pub fragment: Option<String>,
    /// Id of the fragment target when it exists in the page outline.
    /// Replaced wholesale on every navigation, which also clears the
    /// previous highlight.
    pub highlighted: Option<String>,
    pub metadata: PageMetadata,
}

/// Fetches pages, owns the history stack, and swaps the displayed view.
/// Both requests of a navigation are joined by the fetch layer before the
/// completion event arrives, so the view is never half-updated.
pub struct PageNavigator {
    client: DocsClient,
    tx: UnboundedSender<NavEvent>,
    generation: u64,
    history: Vec<HistoryEntry>,
    position: Option<usize>,
    view: Option<PageView>,
}

impl PageNavigator {
    pub fn new(client: DocsClient, tx: UnboundedSender<NavEvent>) -> Self {
        Self {
            client,
            tx,
            generation: 0,
            history: Vec::new(),
            position: None,
            view: None,
        }
    }

    pub fn view(&self) -> Option<&PageView> {
        self.view.as_ref()
    }

    pub fn can_go_back(&self) -> bool {
        self.position.is_some_and(|position| position > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.position
            .is_some_and(|position| position + 1 < self.history.len())
    }

    /// Start navigating to a site-relative url, optionally carrying a
    /// `#fragment`. The fetch completes through the event channel; nothing
    /// is displayed until both page requests resolve.
    pub fn navigate(&mut self, url: &str) {
        let generation = self.begin_navigation();
        let (base, fragment) = split_fragment(url);
        let base = base.to_string();
        let fragment = fragment.map(str::to_string);
        let url = url.to_string();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.page(&base).await;
            if let Err(err) = tx.send(NavEvent::PageLoaded {
                generation,
                url,
                fragment,
                result,
            }) {
                error!("failed to send page load: {err}");
            }
        });
    }

    /// Apply a fetch completion. Returns true when the displayed view
    /// changed. Failed fetches are logged and leave the current page in
    /// place.
    pub fn on_page_loaded(&mut self, event: NavEvent, hooks: &dyn RenderHooks) -> bool {
        let NavEvent::PageLoaded {
            generation,
            url,
            fragment,
            result,
        } = event;
        if generation != self.generation {
            debug!("dropping stale page load for {url}");
            return false;
        }
        match result {
            Ok(fetched) => {
                let entry = HistoryEntry {
                    url: url.clone(),
                    html: fetched.html.clone(),
                    metadata: fetched.metadata.clone(),
                };
                if let Some(position) = self.position {
                    self.history.truncate(position + 1);
                }
                self.history.push(entry);
                self.position = Some(self.history.len() - 1);
                self.view = Some(build_view(url, fetched, fragment, hooks));
                true
            }
            Err(err) => {
                warn!("navigation to {url} failed: {err}");
                false
            }
        }
    }

    /// Restore the previous history entry without re-fetching.
    pub fn back(&mut self, hooks: &dyn RenderHooks) -> bool {
        match self.position {
            Some(position) if position > 0 => self.restore(position - 1, hooks),
            _ => false,
        }
    }

    /// Restore the next history entry without re-fetching.
    pub fn forward(&mut self, hooks: &dyn RenderHooks) -> bool {
        match self.position {
            Some(position) if position + 1 < self.history.len() => {
                self.restore(position + 1, hooks)
            }
            _ => false,
        }
    }

    fn restore(&mut self, position: usize, hooks: &dyn RenderHooks) -> bool {
        let Some(entry) = self.history.get(position) else {
            return false;
        };
        let url = entry.url.clone();
        let fetched = FetchedPage {
            html: entry.html.clone(),
            metadata: entry.metadata.clone(),
        };
        // A history move supersedes any in-flight fetch.
        self.begin_navigation();
        let (_, fragment) = split_fragment(&url);
        let fragment = fragment.map(str::to_string);
        self.position = Some(position);
        self.view = Some(build_view(url, fetched, fragment, hooks));
        true
    }

    fn begin_navigation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

fn build_view(
    url: String,
    fetched: FetchedPage,
    fragment: Option<String>,
    hooks: &dyn RenderHooks,
) -> PageView {
    let page = match augment(&fetched.html, hooks) {
        Ok(page) => page,
        Err(err) => {
            warn!("content augmentation failed for {url}: {err:#}");
            AugmentedPage {
                html: fetched.html.clone(),
                outline: Vec::new(),
                code_blocks: Vec::new(),
            }
        }
    };
    let highlighted = fragment
        .as_deref()
        .and_then(|id| page.outline_entry(id))
        .map(|entry| entry.id.clone());
    PageView {
        url,
        title: fetched.metadata.title.clone(),
        page,
        fragment,
        highlighted,
        metadata: fetched.metadata,
    }
}

fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, fragment)) if !fragment.is_empty() => (base, Some(fragment)),
        Some((base, _)) => (base, None),
        None => (url, None),
    }
}
