use std::time::Duration;

use color_eyre::eyre::Result;
use color_eyre::eyre::WrapErr;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use docscope_runtime::DEFAULT_THEME;
use docscope_runtime::DocsClient;
use docscope_runtime::NavEvent;
use docscope_runtime::PageNavigator;
use docscope_runtime::SearchEvent;
use docscope_runtime::SearchMode;
use docscope_runtime::SearchOrchestrator;
use docscope_runtime::SidebarTree;
use docscope_runtime::Tab;
use docscope_runtime::ThemeStore;
use docscope_runtime::TreeRowKind;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use tokio::select;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::debug;
use tracing::warn;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::clipboard::copy_to_clipboard;
use crate::content_view::ContentView;
use crate::content_view::CopyStatus;
use crate::hint_bar::hints_line;
use crate::hooks::TerminalHooks;
use crate::palette::Palette;
use crate::palette::next_theme;
use crate::palette::palette;
use crate::sidebar::SidebarContext;
use crate::sidebar::SidebarView;
use crate::tui::Tui;

/// Column budget for the navigation pane.
const SIDEBAR_WIDTH: u16 = 34;

/// How long the copy indicator stays on screen before resetting.
const COPY_BADGE_TTL: Duration = Duration::from_millis(1500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Content,
}

enum RowAction {
    Toggle,
    Open(String),
}

fn tab_index(tab: Tab) -> usize {
    match tab {
        Tab::Entities => 0,
        Tab::Tutorials => 1,
    }
}

fn other_tab(tab: Tab) -> Tab {
    match tab {
        Tab::Entities => Tab::Tutorials,
        Tab::Tutorials => Tab::Entities,
    }
}

pub(crate) struct App {
    app_event_tx: AppEventSender,
    search: SearchOrchestrator,
    navigator: PageNavigator,
    /// One tree per tab, indexed through [`tab_index`].
    trees: [SidebarTree; 2],
    active_tab: Tab,
    sidebar: SidebarView,
    content: ContentView,
    theme_store: ThemeStore,
    palette: Palette,
    hooks: TerminalHooks,
    focus: Focus,
    copy_reset: Option<JoinHandle<()>>,
}

impl App {
    pub(crate) async fn run(
        tui: &mut Tui,
        client: DocsClient,
        theme_store: ThemeStore,
        initial_page: Option<String>,
    ) -> Result<()> {
        let (app_event_tx, mut app_event_rx) = unbounded_channel();
        let app_event_tx = AppEventSender::new(app_event_tx);

        let manifest = client
            .nav()
            .await
            .wrap_err("failed to load the navigation manifest")?;
        let trees = [
            SidebarTree::build(&manifest.entities),
            SidebarTree::build(&manifest.tutorials),
        ];

        let (search_tx, mut search_rx) = unbounded_channel();
        let (nav_tx, mut nav_rx) = unbounded_channel();
        {
            let tx = app_event_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = search_rx.recv().await {
                    tx.send(AppEvent::Search(event));
                }
            });
        }
        {
            let tx = app_event_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = nav_rx.recv().await {
                    tx.send(AppEvent::Nav(event));
                }
            });
        }

        let theme = theme_store.theme().unwrap_or_else(|err| {
            warn!("failed to read the stored theme: {err:#}");
            DEFAULT_THEME.to_string()
        });
        let mut app = Self::new(
            app_event_tx,
            client,
            theme_store,
            trees,
            search_tx,
            nav_tx,
            &theme,
        );
        app.navigator
            .navigate(initial_page.as_deref().unwrap_or("/"));

        let mut events = EventStream::new();
        app.draw(tui)?;
        loop {
            select! {
                Some(event) = app_event_rx.recv() => {
                    if !app.handle_app_event(event) {
                        break;
                    }
                    app.draw(tui)?;
                }
                Some(Ok(event)) = events.next() => {
                    match event {
                        Event::Key(key) if key.kind != KeyEventKind::Release => {
                            app.app_event_tx.send(AppEvent::Key(key));
                        }
                        Event::Resize(_, _) => app.app_event_tx.send(AppEvent::Resize),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn new(
        app_event_tx: AppEventSender,
        client: DocsClient,
        theme_store: ThemeStore,
        trees: [SidebarTree; 2],
        search_tx: UnboundedSender<SearchEvent>,
        nav_tx: UnboundedSender<NavEvent>,
        theme: &str,
    ) -> Self {
        Self {
            app_event_tx,
            search: SearchOrchestrator::new(client.clone(), search_tx),
            navigator: PageNavigator::new(client, nav_tx),
            trees,
            active_tab: Tab::Entities,
            sidebar: SidebarView::default(),
            content: ContentView::default(),
            theme_store,
            palette: palette(theme),
            hooks: TerminalHooks,
            focus: Focus::Sidebar,
            copy_reset: None,
        }
    }

    /// Returns false when the application should exit.
    fn handle_app_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize => {}
            AppEvent::Search(SearchEvent::QueryReady { query }) => {
                let tab = self.active_tab;
                self.search
                    .on_query_ready(&query, &self.trees[tab_index(tab)], tab);
                self.sidebar.selected = 0;
            }
            AppEvent::Search(SearchEvent::MemberIndexLoaded { index }) => {
                let tab = self.active_tab;
                self.search
                    .on_member_index(index, &self.trees[tab_index(tab)], tab);
                self.sidebar
                    .clamp_selection(self.search.current_results().len());
            }
            AppEvent::Nav(event) => {
                if self.navigator.on_page_loaded(event, &self.hooks) {
                    self.sync_after_navigation();
                }
            }
            AppEvent::CopyStatusReset => self.content.set_copy_status(CopyStatus::Idle),
            AppEvent::ExitRequest => return false,
        }
        true
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.app_event_tx.send(AppEvent::ExitRequest);
            return;
        }
        if self.sidebar.input_active {
            self.handle_search_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.app_event_tx.send(AppEvent::ExitRequest),
            KeyCode::Char('/') => {
                self.focus = Focus::Sidebar;
                self.sidebar.input_active = true;
            }
            KeyCode::Char('1') => self.switch_tab(Tab::Entities),
            KeyCode::Char('2') => self.switch_tab(Tab::Tutorials),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Content,
                    Focus::Content => Focus::Sidebar,
                };
            }
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('[') | KeyCode::Backspace => self.go_back(),
            KeyCode::Char(']') => self.go_forward(),
            KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => self.go_back(),
            KeyCode::Right if key.modifiers.contains(KeyModifiers::ALT) => self.go_forward(),
            _ => match self.focus {
                Focus::Sidebar => self.handle_sidebar_key(key),
                Focus::Content => self.handle_content_key(key),
            },
        }
    }

    /// Keys while the search input is being edited.
    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.sidebar.input_active = false;
                self.search.clear();
                self.sidebar.selected = 0;
            }
            KeyCode::Enter | KeyCode::Down => {
                self.sidebar.input_active = false;
            }
            KeyCode::Backspace => {
                let mut query = self.search.query().to_string();
                query.pop();
                self.search.set_query(&query);
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut query = self.search.query().to_string();
                query.push(ch);
                self.search.set_query(&query);
            }
            _ => {}
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let len = self.sidebar_len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.sidebar.move_selection(-1, len),
            KeyCode::Down | KeyCode::Char('j') => self.sidebar.move_selection(1, len),
            KeyCode::PageUp => self.sidebar.move_selection(-10, len),
            KeyCode::PageDown => self.sidebar.move_selection(10, len),
            KeyCode::Enter => self.activate_sidebar_row(),
            KeyCode::Esc => {
                if self.search.mode() == SearchMode::Searching {
                    self.search.clear();
                    self.sidebar.selected = 0;
                }
            }
            _ => {}
        }
    }

    fn handle_content_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.content.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.content.scroll_by(1),
            KeyCode::PageUp => self.content.page_by(-1),
            KeyCode::PageDown => self.content.page_by(1),
            KeyCode::Home => self.content.jump_to_start(),
            KeyCode::End => self.content.jump_to_end(),
            KeyCode::Char('n') => {
                self.content.cycle_link(true);
            }
            KeyCode::Char('p') => {
                self.content.cycle_link(false);
            }
            KeyCode::Enter => self.follow_selected_link(),
            KeyCode::Char('c') => self.copy_visible_block(),
            KeyCode::Esc => self.focus = Focus::Sidebar,
            _ => {}
        }
    }

    fn sidebar_len(&self) -> usize {
        match self.search.mode() {
            SearchMode::Searching => self.search.current_results().len(),
            SearchMode::Idle => self.trees[tab_index(self.active_tab)].visible_rows().len(),
        }
    }

    fn activate_sidebar_row(&mut self) {
        match self.search.mode() {
            SearchMode::Searching => {
                if let Some(result) = self.search.current_results().get(self.sidebar.selected) {
                    let url = result.url.clone();
                    self.navigator.navigate(&url);
                }
            }
            SearchMode::Idle => {
                let tab = tab_index(self.active_tab);
                let action = self.trees[tab]
                    .visible_rows()
                    .get(self.sidebar.selected)
                    .map(|row| match row.kind {
                        TreeRowKind::Dir { .. } => RowAction::Toggle,
                        TreeRowKind::Link { url, .. } => RowAction::Open(url.to_string()),
                    });
                match action {
                    Some(RowAction::Toggle) => {
                        self.trees[tab].toggle_at(self.sidebar.selected);
                    }
                    Some(RowAction::Open(url)) => self.navigator.navigate(&url),
                    None => {}
                }
            }
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.active_tab == tab {
            return;
        }
        self.active_tab = tab;
        self.sidebar.selected = 0;
        let query = self.search.query().to_string();
        if !query.is_empty() {
            // Re-rank against the newly visible tab without waiting for a
            // fresh debounce window.
            self.search
                .on_query_ready(&query, &self.trees[tab_index(tab)], tab);
        }
    }

    fn cycle_theme(&mut self) {
        let name = next_theme(self.palette.name);
        if let Err(err) = self.theme_store.set_theme(name) {
            warn!("failed to persist theme {name}: {err:#}");
        }
        self.palette = palette(name);
        self.content.restyle(self.navigator.view(), self.palette);
    }

    fn go_back(&mut self) {
        if self.navigator.back(&self.hooks) {
            self.sync_after_navigation();
        }
    }

    fn go_forward(&mut self) {
        if self.navigator.forward(&self.hooks) {
            self.sync_after_navigation();
        }
    }

    /// Reflect the navigator's current page in the content pane and the
    /// sidebar selection.
    fn sync_after_navigation(&mut self) {
        let Some(view) = self.navigator.view() else {
            return;
        };
        let url = view.url.clone();
        self.content.set_page(view, self.palette);
        for tab in [self.active_tab, other_tab(self.active_tab)] {
            let tree = &mut self.trees[tab_index(tab)];
            if !tree.reveal(&url) {
                continue;
            }
            self.active_tab = tab;
            if let Some(idx) = tree.visible_rows().iter().position(|row| {
                matches!(row.kind, TreeRowKind::Link { url: row_url, .. } if row_url == url)
            }) {
                self.sidebar.selected = idx;
            }
            break;
        }
        self.focus = Focus::Content;
    }

    fn follow_selected_link(&mut self) {
        let Some(url) = self.content.selected_link_url().map(str::to_string) else {
            return;
        };
        if let Some(fragment) = url.strip_prefix('#') {
            self.content.scroll_to_anchor(fragment);
        } else if url.starts_with("http://") || url.starts_with("https://") {
            debug!("ignoring external link {url}");
        } else {
            self.navigator.navigate(&url);
        }
    }

    fn copy_visible_block(&mut self) {
        let Some(raw) = self
            .content
            .visible_code_block()
            .map(|block| block.raw.clone())
        else {
            return;
        };
        let status = match copy_to_clipboard(&raw) {
            Ok(()) => CopyStatus::Copied,
            Err(err) => {
                warn!("clipboard copy failed: {err:#}");
                CopyStatus::Failed
            }
        };
        self.content.set_copy_status(status);
        self.schedule_copy_reset();
    }

    fn schedule_copy_reset(&mut self) {
        if let Some(task) = self.copy_reset.take() {
            task.abort();
        }
        let tx = self.app_event_tx.clone();
        self.copy_reset = Some(tokio::spawn(async move {
            tokio::time::sleep(COPY_BADGE_TTL).await;
            tx.send(AppEvent::CopyStatusReset);
        }));
    }

    fn draw(&mut self, tui: &mut Tui) -> Result<()> {
        tui.terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            self.render(area, buf);
        })?;
        Ok(())
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let main_height = area.height.saturating_sub(1);
        let main = Rect {
            height: main_height,
            ..area
        };
        let hints_area = Rect {
            y: area.y + main_height,
            height: area.height - main_height,
            ..area
        };

        let sidebar_width = SIDEBAR_WIDTH.min(main.width / 2);
        let sidebar_area = Rect {
            width: sidebar_width,
            ..main
        };
        let content_area = Rect {
            x: main.x + sidebar_width,
            width: main.width.saturating_sub(sidebar_width),
            ..main
        };

        let ctx = SidebarContext {
            tab: self.active_tab,
            query: self.search.query(),
            mode: self.search.mode(),
            tree: &self.trees[tab_index(self.active_tab)],
            results: self.search.current_results(),
            selected_url: self.navigator.view().map(|view| view.url.as_str()),
            palette: self.palette,
        };
        self.sidebar.render(sidebar_area, buf, &ctx);
        self.content.render(content_area, buf, self.palette);

        let entries: &[(&str, &str)] = if self.sidebar.input_active {
            &[("Esc", "clear"), ("Enter", "results"), ("↓", "select")]
        } else {
            match self.focus {
                Focus::Sidebar => &[
                    ("/", "search"),
                    ("Enter", "open"),
                    ("Tab", "content"),
                    ("1/2", "tabs"),
                    ("t", "theme"),
                    ("q", "quit"),
                ],
                Focus::Content => &[
                    ("n/p", "links"),
                    ("Enter", "follow"),
                    ("c", "copy"),
                    ("[ ]", "back/fwd"),
                    ("Tab", "sidebar"),
                    ("q", "quit"),
                ],
            }
        };
        Paragraph::new(hints_line(entries, self.palette)).render(hints_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    struct Channels {
        app_rx: UnboundedReceiver<AppEvent>,
        #[allow(dead_code)]
        search_rx: UnboundedReceiver<SearchEvent>,
        nav_rx: UnboundedReceiver<NavEvent>,
    }

    fn test_app(theme_path: &std::path::Path) -> (App, Channels) {
        let (app_tx, app_rx) = unbounded_channel();
        let (search_tx, search_rx) = unbounded_channel();
        let (nav_tx, nav_rx) = unbounded_channel();
        let client = DocsClient::new("http://127.0.0.1:9").unwrap();
        let empty = docscope_runtime::NavNode::default();
        let trees = [SidebarTree::build(&empty), SidebarTree::build(&empty)];
        let app = App::new(
            AppEventSender::new(app_tx),
            client,
            ThemeStore::new(theme_path.to_path_buf()),
            trees,
            search_tx,
            nav_tx,
            DEFAULT_THEME,
        );
        (
            app,
            Channels {
                app_rx,
                search_rx,
                nav_rx,
            },
        )
    }

    #[tokio::test]
    async fn typing_updates_the_query_and_escape_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _channels) = test_app(&dir.path().join("settings.json"));

        app.handle_key(key(KeyCode::Char('/')));
        assert!(app.sidebar.input_active);
        app.handle_key(key(KeyCode::Char('n')));
        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.search.query(), "no");
        assert_eq!(app.search.mode(), SearchMode::Searching);

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.search.query(), "n");

        app.handle_key(key(KeyCode::Esc));
        assert!(!app.sidebar.input_active);
        assert_eq!(app.search.query(), "");
        assert_eq!(app.search.mode(), SearchMode::Idle);
    }

    #[tokio::test]
    async fn q_quits_only_outside_the_search_input() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut channels) = test_app(&dir.path().join("settings.json"));

        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.search.query(), "q");
        assert!(channels.app_rx.try_recv().is_err());

        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('q')));
        assert!(matches!(
            channels.app_rx.try_recv(),
            Ok(AppEvent::ExitRequest)
        ));
    }

    #[tokio::test]
    async fn tab_toggles_focus_and_number_keys_switch_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _channels) = test_app(&dir.path().join("settings.json"));

        assert_eq!(app.focus, Focus::Sidebar);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Content);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Sidebar);

        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.active_tab, Tab::Tutorials);
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.active_tab, Tab::Entities);
    }

    #[tokio::test]
    async fn cycling_the_theme_persists_the_choice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let (mut app, _channels) = test_app(&path);

        assert_eq!(app.palette.name, "dark");
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.palette.name, "light");
        assert_eq!(ThemeStore::new(path).theme().unwrap(), "light");
    }

    #[tokio::test]
    async fn failed_page_loads_leave_the_content_pane_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, mut channels) = test_app(&dir.path().join("settings.json"));

        // The port is unroutable, so the fetch fails and the navigator
        // reports it without producing a view.
        app.navigator.navigate("/entities/node");
        let event = channels.nav_rx.recv().await.unwrap();
        assert!(app.handle_app_event(AppEvent::Nav(event)));
        assert!(app.navigator.view().is_none());
        assert_eq!(app.focus, Focus::Sidebar);
    }
}
