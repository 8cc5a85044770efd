use crossterm::event::KeyEvent;
use docscope_runtime::NavEvent;
use docscope_runtime::SearchEvent;

#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub(crate) enum AppEvent {
    /// A key press forwarded from the terminal input stream.
    Key(KeyEvent),

    /// The terminal was resized; the next draw picks up the new size.
    Resize,

    /// A search-layer completion: either a debounce window expired or the
    /// supplementary member index finished loading. The payload echoes
    /// enough state for the app to decide whether it is still relevant.
    Search(SearchEvent),

    /// A page fetch finished. Stale generations are rejected by the
    /// navigator, not here.
    Nav(NavEvent),

    /// Clear the copy indicator after its display window elapses.
    CopyStatusReset,

    /// Request to exit the application gracefully.
    ExitRequest,
}
