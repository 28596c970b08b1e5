use crate::apply::locator::{all_matches, first_visible};
use crate::apply::{selectors, Diagnostics, ListingWorkflow};
use crate::browser::{Browser, BrowserError, Element, Page};
use crate::config::{Config, ConfigError, SearchConfig};
use crate::generator::{GeneratorError, OpenRouterGenerator};
use crate::listing::ListingRef;
use crate::parsers::html;
use crate::report::{CsvReport, ReportError};
use crate::results::{ApplyOutcome, Counter, Stats};
use crate::seen::{SeenStore, StoreError};
use crate::utils::human_pause;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use url::Url;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(45);
const LOGIN_MARKER_TIMEOUT: Duration = Duration::from_millis(1200);

/// Slack on top of the HTTP timeout before a generation is abandoned
const GENERATION_GRACE: Duration = Duration::from_secs(15);

const SEARCH_FIELDS: [&str; 3] = ["name", "company_name", "description"];

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("cover letter generator unavailable: {0}")]
    Generator(#[from] GeneratorError),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("cannot create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("login prompt failed: {0}")]
    Prompt(std::io::Error),
}

/// One pass over the search results: visits listings page by page and
/// applies until a limit is hit or the run is interrupted.
pub struct Runner {
    config: Config,
    base_url: Url,
    workflow: ListingWorkflow,
    seen: SeenStore,
    report: CsvReport,
    cover_text: String,
    dry_run: bool,
    stop: Arc<AtomicBool>,
}

impl Runner {
    /// Opens the stores and reads the cover letter; fails on any missing input
    pub async fn prepare(config: Config, dry_run: bool) -> Result<Self, RunError> {
        let base_url = Url::parse(&config.search.base_url)?;

        let seen = SeenStore::open(&config.db_path)?;
        seen.cleanup(config.seen_ttl_days)?;

        tokio::fs::create_dir_all(&config.screenshots_dir)
            .await
            .map_err(|source| RunError::Io {
                path: config.screenshots_dir.clone(),
                source,
            })?;

        let cover_text = config.read_cover_letter()?;
        let report = CsvReport::create(&config.vacancies_csv)?;

        let mut workflow = ListingWorkflow::new(
            config.apply.clone(),
            Diagnostics::new(&config.screenshots_dir),
        );
        match OpenRouterGenerator::from_config(&config.generator) {
            Some(generator) => {
                ::log::info!("Cover letters are generated with {}", config.generator.model);
                let limit = Duration::from_secs(config.generator.timeout_secs) + GENERATION_GRACE;
                workflow = workflow.with_generator(Box::new(generator?), limit);
            }
            None if config.generator.enabled => {
                ::log::warn!("Cover letter generation is enabled but no API key is set, using the static letter")
            }
            None => {}
        }

        Ok(Self {
            config,
            base_url,
            workflow,
            seen,
            report,
            cover_text,
            dry_run,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Setting the flag ends the run after the current listing
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Searches from `search_page` and opens every listing in its own tab from `browser`
    pub async fn run<B: Browser>(
        &mut self,
        browser: &B,
        search_page: &B::Page,
    ) -> Result<Stats, RunError> {
        ensure_logged_in(search_page, &self.base_url).await?;

        let mut stats = Stats::default();
        let mut page_num = 0;
        let mut empty_pages = 0;

        while !self.stopped()
            && stats.applies_done < self.config.max_applies
            && page_num < self.config.search.max_pages
        {
            let search_url = build_search_url(&self.base_url, &self.config.search, page_num);
            ::log::info!("Search page: {}", search_url);

            let links = match timeout(SEARCH_TIMEOUT, search_page.goto(search_url.as_str())).await {
                Ok(Ok(())) => {
                    self.pause().await;
                    collect_listing_links(search_page, &search_url).await
                }
                Ok(Err(e)) => {
                    ::log::error!("Could not open search page {}: {}", page_num, e);
                    Vec::new()
                }
                Err(_) => {
                    ::log::error!("Timed out opening search page {}", page_num);
                    Vec::new()
                }
            };

            if links.is_empty() {
                empty_pages += 1;
                if empty_pages >= self.config.search.empty_pages_tolerance {
                    ::log::info!("{} empty search pages in a row, stopping", empty_pages);
                    break;
                }
                page_num += 1;
                continue;
            }

            empty_pages = 0;
            ::log::info!("Found {} listings on the page", links.len());
            stats.bump(Counter::FoundLinks, links.len());

            for listing in &links {
                if self.stopped() || stats.applies_done >= self.config.max_applies {
                    break;
                }
                self.visit(browser, listing, &mut stats).await;
            }
            page_num += 1;
        }

        if self.stopped() {
            ::log::warn!("Run interrupted");
        }
        stats.log_summary(self.config.max_applies);
        Ok(stats)
    }

    async fn visit<B: Browser>(&mut self, browser: &B, listing: &ListingRef, stats: &mut Stats) {
        if self.seen.is_seen(&listing.id) {
            stats.bump(Counter::SkippedSeen, 1);
            ::log::info!("Listing {} was visited before, skipping", listing.id);
            return;
        }
        stats.bump(Counter::Opened, 1);

        if self.dry_run {
            ::log::info!("[dry-run] Not applying to {}", listing.url);
            stats.record(ApplyOutcome::Success);
            self.pause().await;
            return;
        }

        let result = self
            .workflow
            .process_listing(browser, &listing.url, &self.cover_text)
            .await;
        self.seen.mark_seen(&listing.id);
        stats.record(result.outcome);

        match result.outcome {
            ApplyOutcome::Success => {
                let title = if result.title.is_empty() {
                    listing.url.as_str()
                } else {
                    result.title.as_str()
                };
                match self.report.append_row(title, &listing.url) {
                    Ok(()) => ::log::info!("Saved to CSV: {} ({})", title, listing.url),
                    Err(e) => ::log::warn!("Could not save to CSV: {}", e),
                }
            }
            ApplyOutcome::SkippedAlreadyApplied => {}
            ApplyOutcome::Error => {
                if let Some(reason) = &result.failure {
                    ::log::warn!("Listing {} failed: {}", listing.id, reason);
                }
            }
        }

        self.pause().await;
    }

    async fn pause(&self) {
        let timings = &self.config.apply.timings;
        human_pause(timings.min_sleep, timings.max_sleep).await;
    }
}

/// Search results URL for zero-based `page_num`
pub fn build_search_url(base_url: &Url, search: &SearchConfig, page_num: usize) -> Url {
    let mut url = base_url.clone();
    url.set_path("/search/vacancy");
    url.set_fragment(None);
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.append_pair("text", &search.query);
        query.append_pair("page", &page_num.to_string());
        for field in SEARCH_FIELDS {
            query.append_pair("search_field", field);
        }
        query.append_pair("order_by", "relevance");
        for area in &search.region_ids {
            query.append_pair("area", area);
        }
        if search.remote_only {
            query.append_pair("schedule", "remote");
        }
    }
    url
}

/// Checks for a profile marker and, failing that, waits for a manual login
pub async fn ensure_logged_in<P: Page>(page: &P, base_url: &Url) -> Result<(), RunError> {
    page.goto(base_url.as_str()).await?;
    if is_logged_in(page).await {
        ::log::info!("Already logged in");
        return Ok(());
    }

    ::log::warn!("Not logged in. Log in to hh.ru in the opened browser window.");
    let login_url = base_url.join("/account/login")?;
    page.goto(login_url.as_str()).await?;
    wait_for_enter("Press Enter here once logged in...").await?;

    page.goto(base_url.as_str()).await?;
    if !is_logged_in(page).await {
        ::log::warn!("Still no profile marker on the page, continuing anyway");
    }
    ::log::info!("Continuing");
    Ok(())
}

async fn is_logged_in<P: Page>(page: &P) -> bool {
    first_visible(page, &selectors::login_markers(), LOGIN_MARKER_TIMEOUT)
        .await
        .is_found()
}

async fn wait_for_enter(prompt: &'static str) -> Result<(), RunError> {
    tokio::task::spawn_blocking(move || {
        println!("{}", prompt);
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .map_err(|e| RunError::Prompt(std::io::Error::other(e)))?
    .map_err(RunError::Prompt)
}

/// Listing links on a search page, canonical and deduplicated, in page order.
///
/// Result titles are read first; broader queries and then the raw page source
/// are only consulted while nothing has been found.
pub async fn collect_listing_links<P: Page>(page: &P, page_url: &Url) -> Vec<ListingRef> {
    let mut links = LinkSet::new(page_url);

    for strategy in selectors::search_result_titles() {
        for card in all_matches(page, &strategy, None, usize::MAX).await {
            if let Ok(Some(href)) = card.attr("href").await {
                links.add(&href);
            }
        }
    }

    for (strategy, limit) in selectors::search_result_fallbacks() {
        if !links.is_empty() {
            break;
        }
        ::log::debug!("No result titles found, trying {}", strategy);
        for card in all_matches(page, &strategy, None, limit).await {
            if let Ok(Some(href)) = card.attr("href").await {
                links.add(&href);
            }
        }
    }

    if links.is_empty() {
        match page.source().await {
            Ok(source) => {
                for href in html::parse_listing_links(&source) {
                    links.add(&href);
                }
            }
            Err(e) => ::log::debug!("Could not read search page source: {}", e),
        }
    }

    links.into_vec()
}

/// Ordered set of listing references resolved against one page
struct LinkSet<'a> {
    base: &'a Url,
    seen: HashSet<String>,
    links: Vec<ListingRef>,
}

impl<'a> LinkSet<'a> {
    fn new(base: &'a Url) -> Self {
        Self {
            base,
            seen: HashSet::new(),
            links: Vec::new(),
        }
    }

    fn add(&mut self, href: &str) {
        if !href.contains("/vacancy/") {
            return;
        }
        let Some(listing) = ListingRef::resolve(self.base, href) else {
            ::log::debug!("Skipping unresolvable link {}", href);
            return;
        };
        if self.seen.insert(listing.url.clone()) {
            self.links.push(listing);
        }
    }

    fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn into_vec(self) -> Vec<ListingRef> {
        self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::tests::fake::{FakeBrowser, Node};
    use crate::apply::tests::{open_listing, COVER_TEXT};
    use crate::browser::Strategy;

    fn base() -> Url {
        Url::parse("https://hh.ru").unwrap()
    }

    fn search_config() -> SearchConfig {
        SearchConfig {
            query: "python developer".to_string(),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_search_url_has_fixed_parameters() {
        let url = build_search_url(&base(), &search_config(), 2);
        assert_eq!(
            url.as_str(),
            "https://hh.ru/search/vacancy?text=python+developer&page=2&search_field=name&search_field=company_name&search_field=description&order_by=relevance"
        );
    }

    #[test]
    fn test_search_url_regions_and_remote() {
        let search = SearchConfig {
            region_ids: vec!["1".to_string(), "2".to_string()],
            remote_only: true,
            ..search_config()
        };
        let url = build_search_url(&base(), &search, 0);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        let areas: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "area")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(areas, ["1", "2"]);
        assert!(pairs.contains(&("schedule".to_string(), "remote".to_string())));
        assert!(pairs.contains(&("page".to_string(), "0".to_string())));
    }

    fn card(strategy: Strategy, href: &str) -> Node {
        Node::matching(strategy).attr("href", href)
    }

    #[tokio::test(start_paused = true)]
    async fn test_title_links_are_canonical_and_unique() {
        let browser = FakeBrowser::new();
        let titles = selectors::search_result_titles();
        browser.add(card(titles[0].clone(), "/vacancy/1?from=serp"));
        browser.add(card(titles[1].clone(), "https://hh.ru/vacancy/2"));
        browser.add(card(titles[2].clone(), "https://hh.ru/vacancy/1#top"));
        browser.add(card(titles[2].clone(), "/employer/5"));
        browser.add(card(selectors::search_result_fallbacks()[1].0.clone(), "/vacancy/3"));

        let page_url = build_search_url(&base(), &search_config(), 0);
        let links = collect_listing_links(&browser.page(), &page_url).await;

        let ids: Vec<&str> = links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(links[0].url, "https://hh.ru/vacancy/1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_links_are_capped() {
        let browser = FakeBrowser::new();
        let (wrapper, limit) = selectors::search_result_fallbacks()[0].clone();
        for id in 0..(limit + 5) {
            browser.add(card(wrapper.clone(), &format!("/vacancy/{}", id)));
        }

        let page_url = build_search_url(&base(), &search_config(), 0);
        let links = collect_listing_links(&browser.page(), &page_url).await;
        assert_eq!(links.len(), limit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_source_is_last_resort() {
        let browser = FakeBrowser::new();
        browser.dom().source = r#"<html><body>
            <a href="/vacancy/77?query=rust">Rust developer</a>
            <a href="/employer/1">Employer</a>
        </body></html>"#
            .to_string();

        let page_url = build_search_url(&base(), &search_config(), 0);
        let links = collect_listing_links(&browser.page(), &page_url).await;
        assert_eq!(links, vec![ListingRef::parse("https://hh.ru/vacancy/77")]);
    }

    struct RunFixture {
        _dir: tempfile::TempDir,
        config: Config,
    }

    fn run_fixture() -> RunFixture {
        let dir = tempfile::tempdir().unwrap();
        let cover_letter = dir.path().join("cover_letter.txt");
        std::fs::write(&cover_letter, COVER_TEXT).unwrap();

        let mut config = Config::default();
        config.search.query = "python".to_string();
        config.search.max_pages = 2;
        config.cover_letter_path = cover_letter;
        config.db_path = dir.path().join("seen.sqlite");
        config.screenshots_dir = dir.path().join("screenshots");
        config.vacancies_csv = dir.path().join("vacancies.csv");
        RunFixture { _dir: dir, config }
    }

    /// A logged-in session whose search pages list two listings
    fn search_results(browser: &FakeBrowser) {
        browser.add(Node::matching(selectors::login_markers()[0].clone()));
        let title = selectors::search_result_titles()[0].clone();
        browser.add(card(title.clone(), "/vacancy/101"));
        browser.add(card(title, "/vacancy/102?from=serp"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_applies_and_records() {
        let fixture = run_fixture();
        let listing = open_listing("Python разработчик");
        search_results(&listing.browser);

        let mut runner = Runner::prepare(fixture.config.clone(), false).await.unwrap();
        let stats = runner
            .run(&listing.browser, &listing.browser.page())
            .await
            .unwrap();

        // The confirmation stays visible once the first application is sent
        assert_eq!(stats.found_links, 4);
        assert_eq!(stats.opened, 2);
        assert_eq!(stats.applies_done, 1);
        assert_eq!(stats.skipped_already, 1);
        assert_eq!(stats.skipped_seen, 2);
        assert_eq!(stats.errors, 0);

        let csv = std::fs::read_to_string(&fixture.config.vacancies_csv).unwrap();
        assert_eq!(csv, "title,link\nPython developer,https://hh.ru/vacancy/101\n");

        let seen = SeenStore::open(&fixture.config.db_path).unwrap();
        assert!(seen.is_seen("101"));
        assert!(seen.is_seen("102"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_at_max_applies() {
        let mut fixture = run_fixture();
        fixture.config.max_applies = 1;
        let listing = open_listing("Python разработчик");
        search_results(&listing.browser);

        let mut runner = Runner::prepare(fixture.config.clone(), false).await.unwrap();
        let stats = runner
            .run(&listing.browser, &listing.browser.page())
            .await
            .unwrap();

        assert_eq!(stats.applies_done, 1);
        assert_eq!(stats.opened, 1);
        assert_eq!(listing.browser.dom().opened_pages, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_leaves_no_trace() {
        let fixture = run_fixture();
        let listing = open_listing("Python разработчик");
        search_results(&listing.browser);

        let mut runner = Runner::prepare(fixture.config.clone(), true).await.unwrap();
        let stats = runner
            .run(&listing.browser, &listing.browser.page())
            .await
            .unwrap();

        assert_eq!(stats.applies_done, 4);
        assert_eq!(listing.browser.dom().opened_pages, 0);
        assert_eq!(listing.browser.node(listing.submit).clicks, 0);
        let csv = std::fs::read_to_string(&fixture.config.vacancies_csv).unwrap();
        assert_eq!(csv, "title,link\n");
        assert!(SeenStore::open(&fixture.config.db_path).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pages_end_the_run() {
        let mut fixture = run_fixture();
        fixture.config.search.max_pages = 100;
        let browser = FakeBrowser::new();
        browser.add(Node::matching(selectors::login_markers()[0].clone()));

        let mut runner = Runner::prepare(fixture.config.clone(), false).await.unwrap();
        let stats = runner.run(&browser, &browser.page()).await.unwrap();

        assert_eq!(stats, Stats::default());
        let searches = browser
            .dom()
            .visited
            .iter()
            .filter(|url| url.contains("/search/vacancy"))
            .count();
        assert_eq!(searches, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_flag_ends_run_before_searching() {
        let fixture = run_fixture();
        let browser = FakeBrowser::new();
        browser.add(Node::matching(selectors::login_markers()[0].clone()));

        let mut runner = Runner::prepare(fixture.config.clone(), false).await.unwrap();
        runner.stop_handle().store(true, Ordering::SeqCst);
        let stats = runner.run(&browser, &browser.page()).await.unwrap();

        assert_eq!(stats, Stats::default());
        assert_eq!(browser.dom().visited, vec!["https://hh.ru/".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_cover_letter_fails_preparation() {
        let mut fixture = run_fixture();
        fixture.config.cover_letter_path = fixture._dir.path().join("absent.txt");

        assert!(matches!(
            Runner::prepare(fixture.config.clone(), false).await,
            Err(RunError::Config(ConfigError::Io { .. }))
        ));
    }
}
