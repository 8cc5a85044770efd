use docscope_runtime::DocsClient;
use docscope_runtime::NavEvent;
use docscope_runtime::PageNavigator;
use docscope_runtime::PassthroughHooks;
use docscope_runtime::SearchEvent;
use docscope_runtime::SearchOrchestrator;
use docscope_runtime::SidebarTree;
use docscope_runtime::Tab;
use docscope_runtime::TreeRowKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc::unbounded_channel;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

async fn mount_page(server: &MockServer, base: &str, title: &str, html: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{base}/content.html")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .expect(hits)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{base}/metadata.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": title })))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn nav_manifest_builds_a_single_link_sidebar() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nav.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": {
                "type": "root",
                "name": null,
                "items": [{ "type": "link", "icon": null, "name": "Foo", "url": "/foo" }]
            },
            "tutorials": { "type": "root", "name": null, "items": [] }
        })))
        .mount(&server)
        .await;

    let client = DocsClient::new(server.uri()).unwrap();
    let manifest = client.nav().await.unwrap();
    let tree = SidebarTree::build(&manifest.entities);
    let rows = tree.visible_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].kind,
        TreeRowKind::Link {
            name: "Foo",
            url: "/foo"
        }
    );
}

#[tokio::test]
async fn navigating_with_a_fragment_highlights_the_target() {
    let server = MockServer::start().await;
    let html = r#"<h1 id="top">Foo</h1><details id="bar"><summary>bar()</summary>body</details>"#;
    mount_page(&server, "/foo", "Foo", html, 1).await;

    let (tx, mut rx) = unbounded_channel();
    let client = DocsClient::new(server.uri()).unwrap();
    let mut navigator = PageNavigator::new(client, tx);
    navigator.navigate("/foo#bar");
    let event = rx.recv().await.unwrap();
    assert!(navigator.on_page_loaded(event, &PassthroughHooks));

    let view = navigator.view().unwrap();
    assert_eq!(view.title, "Foo");
    assert_eq!(view.highlighted.as_deref(), Some("bar"));
    assert!(view.page.html.contains("data-anchored"));
}

#[tokio::test]
async fn history_restore_does_not_refetch() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "A", "<p>page a</p>", 1).await;
    mount_page(&server, "/b", "B", "<p>page b</p>", 1).await;

    let (tx, mut rx) = unbounded_channel();
    let client = DocsClient::new(server.uri()).unwrap();
    let mut navigator = PageNavigator::new(client, tx);

    navigator.navigate("/a");
    let event = rx.recv().await.unwrap();
    assert!(navigator.on_page_loaded(event, &PassthroughHooks));
    navigator.navigate("/b");
    let event = rx.recv().await.unwrap();
    assert!(navigator.on_page_loaded(event, &PassthroughHooks));

    assert!(navigator.back(&PassthroughHooks));
    assert_eq!(navigator.view().unwrap().title, "A");
    assert!(navigator.forward(&PassthroughHooks));
    assert_eq!(navigator.view().unwrap().title, "B");

    // every mock expects exactly one hit
    server.verify().await;
}

#[tokio::test]
async fn a_failed_metadata_fetch_displays_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bad/content.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>bad</p>", "text/html"))
        .mount(&server)
        .await;

    let (tx, mut rx) = unbounded_channel();
    let client = DocsClient::new(server.uri()).unwrap();
    let mut navigator = PageNavigator::new(client, tx);
    navigator.navigate("/bad");
    let event = rx.recv().await.unwrap();
    assert!(!navigator.on_page_loaded(event, &PassthroughHooks));
    assert!(navigator.view().is_none());
}

#[tokio::test]
async fn missing_member_index_is_an_empty_index() {
    let server = MockServer::start().await;
    let client = DocsClient::new(server.uri()).unwrap();
    let index = client.member_index().await.unwrap();
    assert!(index.is_empty());
}

#[tokio::test]
async fn member_index_is_fetched_once_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/functions.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!(["cocos2d::CCNode::init"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = DocsClient::new(server.uri()).unwrap();
    let (tx, mut rx) = unbounded_channel();
    let mut search = SearchOrchestrator::new(client, tx);
    let tree = SidebarTree::default();

    search.set_query("init");
    search.on_query_ready("init", &tree, Tab::Entities);
    loop {
        match rx.recv().await.unwrap() {
            SearchEvent::MemberIndexLoaded { index } => {
                search.on_member_index(index, &tree, Tab::Entities);
                break;
            }
            SearchEvent::QueryReady { .. } => {}
        }
    }
    assert_eq!(search.current_results().len(), 1);
    assert_eq!(search.current_results()[0].url, "/cocos2d/CCNode#init");

    // a later entity search reuses the cached index
    search.set_query("node");
    search.on_query_ready("node", &tree, Tab::Entities);
    assert_eq!(search.current_results().len(), 1);
    server.verify().await;
}
