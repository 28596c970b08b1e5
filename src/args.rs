use auto_apply::Session;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "auto-apply")]
#[command(about = "Applies to hh.ru job listings through a WebDriver-controlled browser")]
#[command(version)]
pub struct Args {
    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Visit listings without sending applications
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Search query (overrides HH_SEARCH_QUERY)
    #[arg(short, long)]
    pub query: Option<String>,

    /// JSON configuration file; environment variables are used without one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,
}

/// Layer the command-line flags over a loaded session
pub fn apply_overrides(args: &Args, mut session: Session) -> Session {
    if args.headless {
        session = session.with_headless(true);
    }
    if let Some(query) = args.query.as_deref().filter(|q| !q.trim().is_empty()) {
        session = session.with_query(query);
    }
    if let Some(url) = &args.webdriver_url {
        session = session.with_webdriver_url(url);
    }
    session.with_dry_run(args.dry_run)
}
