use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

use crate::app_event::AppEvent;

#[derive(Clone, Debug)]
pub(crate) struct AppEventSender {
    app_event_tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub(crate) fn new(app_event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { app_event_tx }
    }

    /// Send an event to the app event loop. A send can only fail during
    /// shutdown when the receiver is gone, so the error is logged and
    /// otherwise ignored.
    pub(crate) fn send(&self, event: AppEvent) {
        if let Err(err) = self.app_event_tx.send(event) {
            error!("failed to send event: {err}");
        }
    }
}
