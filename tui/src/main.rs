use clap::Parser;
use color_eyre::eyre::Result;
use docscope_tui::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    docscope_tui::run_main(Cli::parse()).await
}
