use clap::Parser;

/// Terminal browser for generated documentation sites.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Base URL the generated site is served from, e.g. `http://localhost:8000`.
    pub base_url: String,

    /// Open this page instead of the site root, e.g. `/classes/CCNode#init`.
    #[arg(long)]
    pub open: Option<String>,
}
