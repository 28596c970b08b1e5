// Re-export modules
pub mod apply;
pub mod browser;
pub mod config;
pub mod generator;
pub mod listing;
pub mod parsers;
pub mod report;
pub mod results;
pub mod runner;
pub mod seen;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use results::{ApplyOutcome, ListingResult, Stats};
pub use runner::{RunError, Runner};

use browser::web::WebBrowser;
use std::path::Path;
use std::sync::atomic::Ordering;

/// Main builder for an application run against hh.ru
pub struct Session {
    config: Config,
    dry_run: bool,
}

impl Session {
    /// Create a new Session from a complete configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Load the configuration from a JSON file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, RunError> {
        Ok(Self::new(Config::from_file(path)?))
    }

    /// Load the configuration from `HH_*` environment variables and `.env`
    pub fn from_env() -> Result<Self, RunError> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Visit listings without applying
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.browser.headless = headless;
        self
    }

    /// Replace the search query
    pub fn with_query(mut self, query: &str) -> Self {
        self.config.search.query = query.trim().to_string();
        self
    }

    pub fn with_webdriver_url(mut self, url: &str) -> Self {
        self.config.browser.webdriver_url = url.to_string();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connect to WebDriver and run until a limit is reached or Ctrl-C is pressed
    pub async fn run(self) -> Result<Stats, RunError> {
        let mut runner = Runner::prepare(self.config.clone(), self.dry_run).await?;

        let stop = runner.stop_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ::log::warn!("Interrupt received, finishing after the current step");
                stop.store(true, Ordering::SeqCst);
            }
        });

        ::log::info!("Connecting to WebDriver at {}", self.config.browser.webdriver_url);
        let browser = WebBrowser::connect(&self.config.browser).await?;
        let search_page = browser.main_page();

        let result = runner.run(&browser, &search_page).await;
        browser.shutdown().await;
        result
    }
}
