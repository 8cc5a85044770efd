use std::io::Result;
use std::io::Stdout;
use std::io::stdout;

use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::error;

/// Raw-mode alternate-screen terminal. Restored on drop so panics and
/// early returns both leave the user's shell usable.
pub(crate) struct Tui {
    pub(crate) terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    pub(crate) fn new() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(err) = restore() {
            error!("failed to restore the terminal: {err}");
        }
    }
}

/// Leave the alternate screen and switch raw mode back off. Also called
/// from the panic hook, before the default hook prints the message.
pub(crate) fn restore() -> Result<()> {
    execute!(stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}
