//! Command-line front end of the quote finder.
//!
//! Opens a local HTML page as the active tab, then reads commands from stdin:
//! `g` generates quotes, a number scrolls to that quote, `s` shows settings,
//! `key <value>` stores the API key and `q` quits.

use std::path::PathBuf;

use clap::Parser;

mod platform;

#[derive(Parser, Debug)]
#[command(
    name = "quote_app",
    about = "Finds the most significant quotes in a page and scrolls to them",
    version
)]
pub struct Cli {
    /// HTML file opened in the active tab
    page: Option<PathBuf>,

    /// URL reported for the tab (defaults to file://<page>)
    #[arg(long)]
    url: Option<String>,

    /// Settings file
    #[arg(short, long, env = "QUOTE_APP_CONFIG", default_value = platform::SETTINGS_FILE)]
    config: PathBuf,

    /// Generate once, print the quotes and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::run_app(&cli)
}
