//! Terminal front end for browsing a generated documentation site.
//!
//! The heavy lifting (search, navigation, page augmentation) lives in
//! `docscope-runtime`; this crate renders those states with ratatui and
//! maps keys onto runtime operations.

use std::path::PathBuf;

use color_eyre::eyre::Result;
use color_eyre::eyre::WrapErr;
use color_eyre::eyre::eyre;
use docscope_runtime::DocsClient;
use docscope_runtime::ThemeStore;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod app_event;
mod app_event_sender;
mod cli;
mod clipboard;
mod content_view;
mod hint_bar;
mod hooks;
mod markup;
mod palette;
mod sidebar;
mod text_formatting;
mod tui;

pub use cli::Cli;

use crate::app::App;

/// Wires logging, the terminal, and the runtime together, then hands
/// control to the event loop until the user quits.
pub async fn run_main(cli: Cli) -> Result<()> {
    let _log_guard = init_logging()?;
    color_eyre::install()?;
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = tui::restore();
        default_hook(info);
    }));

    let client =
        DocsClient::new(cli.base_url).wrap_err("failed to construct the documentation client")?;
    let theme_store = ThemeStore::new(settings_path()?);

    let mut tui = tui::Tui::new()?;
    let result = App::run(&mut tui, client, theme_store, cli.open).await;
    drop(tui);
    result
}

/// Logs go to a file rather than the screen so tracing output never
/// fights the alternate-screen UI.
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = dirs::state_dir()
        .or_else(dirs::data_dir)
        .map(|dir| dir.join("docscope").join("log"))
        .ok_or_else(|| eyre!("could not determine a log directory"))?;
    std::fs::create_dir_all(&log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, "docscope-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docscope_runtime=info,docscope_tui=info"));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(false)
                .with_filter(filter),
        )
        .try_init();
    Ok(guard)
}

fn settings_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| eyre!("could not determine the configuration directory"))?
        .join("docscope");
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("settings.json"))
}
