use crate::apply::consent::ConsentHandler;
use crate::apply::cover_letter::CoverLetterFiller;
use crate::apply::diagnostics::Diagnostics;
use crate::apply::locator::{first_visible, Probe};
use crate::apply::resume::ResumeSelector;
use crate::apply::selectors;
use crate::apply::status::{listing_state, ListingState};
use crate::apply::submit::SubmissionDriver;
use crate::browser::{Browser, BrowserError, Element, Page};
use crate::config::ApplyConfig;
use crate::generator::CoverLetterGenerator;
use crate::parsers::html::{self, MIN_DESCRIPTION_CHARS};
use crate::results::{FailureReason, ListingResult};
use crate::utils::human_pause;
use std::time::Duration;
use tokio::time::{sleep, timeout};

const AFTER_CLICK_WAIT: Duration = Duration::from_millis(1500);
const MODAL_TIMEOUT: Duration = Duration::from_secs(2);
const DESCRIPTION_TIMEOUT: Duration = Duration::from_millis(500);
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(75);

/// Applies to one listing from start to finish
pub struct ListingWorkflow {
    config: ApplyConfig,
    diagnostics: Diagnostics,
    generator: Option<Box<dyn CoverLetterGenerator>>,
    generation_timeout: Duration,
}

impl ListingWorkflow {
    pub fn new(config: ApplyConfig, diagnostics: Diagnostics) -> Self {
        Self {
            config,
            diagnostics,
            generator: None,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Regenerate the cover letter per listing, bounded by `limit`
    pub fn with_generator(mut self, generator: Box<dyn CoverLetterGenerator>, limit: Duration) -> Self {
        self.generator = Some(generator);
        self.generation_timeout = limit;
        self
    }

    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Opens `url` in a new tab, applies if needed and closes the tab.
    ///
    /// Never fails: every problem becomes an `Error` outcome, with a screenshot
    /// when the page could be reached.
    pub async fn process_listing<B: Browser>(
        &self,
        browser: &B,
        url: &str,
        fallback_cover_text: &str,
    ) -> ListingResult {
        ::log::info!("Opening listing: {}", url);

        let page = match browser.open_page().await {
            Ok(page) => page,
            Err(e) => {
                ::log::error!("Could not open a tab for {}: {}", url, e);
                return ListingResult::error(String::new(), FailureReason::Unexpected(e.to_string()));
            }
        };

        let mut title = String::new();
        let result = match self.run(&page, url, fallback_cover_text, &mut title).await {
            Ok(result) => result,
            Err(e) => {
                ::log::error!("Error while processing listing {}: {}", url, e);
                self.diagnostics
                    .capture(&page, &format!("error_{}", url_slug(url)))
                    .await;
                ListingResult::error(title, FailureReason::Unexpected(e.to_string()))
            }
        };

        if let Err(e) = page.close().await {
            ::log::warn!("Could not close listing tab: {}", e);
        }
        result
    }

    async fn run<P: Page>(
        &self,
        page: &P,
        url: &str,
        fallback_cover_text: &str,
        title: &mut String,
    ) -> Result<ListingResult, BrowserError> {
        let navigation_timeout = self.config.timings.navigation_timeout();
        match timeout(navigation_timeout, page.goto(url)).await {
            Ok(navigated) => navigated?,
            Err(_) => {
                ::log::error!("Timed out opening listing {}", url);
                let reason = FailureReason::NavigationTimeout;
                self.diagnostics.capture(page, reason.tag()).await;
                return Ok(ListingResult::error(String::new(), reason));
            }
        }
        self.pause().await;

        *title = read_title(page).await;

        match listing_state(page).await {
            ListingState::Confirmed => {
                ::log::info!("Already applied to this listing, skipping");
                return Ok(ListingResult::skipped(title.clone()));
            }
            ListingState::NoEntryPoint => {
                ::log::info!(
                    "No apply button on the listing (already applied or closed to applications), skipping"
                );
                return Ok(ListingResult::skipped(title.clone()));
            }
            ListingState::Open(button) => {
                if let Err(e) = button.click().await {
                    ::log::debug!("Apply button click failed, form may open by itself: {}", e);
                }
                sleep(AFTER_CLICK_WAIT).await;
            }
        }

        dismiss_relocation_warning(page).await;

        let cover_text = self.cover_text_for(page, fallback_cover_text).await;

        match self.submit_application(page, &cover_text).await {
            Ok(()) => Ok(ListingResult::success(title.clone())),
            Err(reason) => {
                self.diagnostics.capture(page, reason.tag()).await;
                Ok(ListingResult::error(title.clone(), reason))
            }
        }
    }

    /// Cover letter, resume, consent and submit, in that order
    async fn submit_application<P: Page>(
        &self,
        page: &P,
        cover_text: &str,
    ) -> Result<(), FailureReason> {
        let letter_ok = CoverLetterFiller::new().fill_and_verify(page, cover_text).await;
        if !letter_ok && self.config.require_cover_letter {
            ::log::warn!("Not applying: the cover letter could not be inserted");
            return Err(FailureReason::NoCoverLetter);
        }

        let resumes = ResumeSelector::new(&self.config.resume_match);
        if !resumes.select_specific(page).await {
            if self.config.fail_if_resume_not_found {
                ::log::warn!("Not applying: the required resume was not found");
                return Err(FailureReason::ResumeNotFound);
            }
            resumes.select_any_if_needed(page).await;
        }

        let consent = ConsentHandler::new();
        consent.check_all(page).await;

        if SubmissionDriver::new(&self.config.timings, consent)
            .submit(page)
            .await
        {
            Ok(())
        } else {
            Err(FailureReason::SubmitExhausted)
        }
    }

    /// The generated cover letter when a generator is set and succeeds, else the fallback
    async fn cover_text_for<P: Page>(&self, page: &P, fallback: &str) -> String {
        let Some(generator) = &self.generator else {
            return fallback.to_string();
        };

        ::log::info!("Generating a cover letter for this listing");
        let Some(description) = read_description(page).await else {
            ::log::warn!("No listing description found, using the static cover letter");
            return fallback.to_string();
        };

        match timeout(self.generation_timeout, generator.generate(&description)).await {
            Ok(Ok(letter)) if !letter.trim().is_empty() => letter,
            Ok(Ok(_)) => {
                ::log::warn!("Generated cover letter is empty, using the static one");
                fallback.to_string()
            }
            Ok(Err(e)) => {
                ::log::warn!("Cover letter generation failed: {}", e);
                fallback.to_string()
            }
            Err(_) => {
                ::log::warn!(
                    "Cover letter generation timed out after {:?}",
                    self.generation_timeout
                );
                fallback.to_string()
            }
        }
    }

    async fn pause(&self) {
        human_pause(self.config.timings.min_sleep, self.config.timings.max_sleep).await;
    }
}

/// Heading, then title attributes, then the document title
async fn read_title<P: Page>(page: &P) -> String {
    for strategy in selectors::listing_title() {
        let Ok(found) = page.find_all(&strategy, None).await else {
            continue;
        };
        let Some(first) = found.first() else {
            continue;
        };
        if let Ok(text) = first.text().await {
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    page.title()
        .await
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Confirms the "listing is in another country" dialog when it shows up
async fn dismiss_relocation_warning<P: Page>(page: &P) {
    if let Probe::Found(confirm) =
        first_visible(page, &selectors::foreign_country_confirm(), MODAL_TIMEOUT).await
    {
        ::log::info!("Listing is in another country, confirming the warning");
        match confirm.click().await {
            Ok(()) => sleep(AFTER_CLICK_WAIT).await,
            Err(e) => ::log::warn!("Could not confirm the relocation warning: {}", e),
        }
    }
}

/// Listing description from visible blocks, else from the page source
async fn read_description<P: Page>(page: &P) -> Option<String> {
    for strategy in selectors::description() {
        let Probe::Found(block) = first_visible(page, &[strategy], DESCRIPTION_TIMEOUT).await
        else {
            continue;
        };
        if let Ok(text) = block.text().await {
            let text = text.trim();
            if text.chars().count() > MIN_DESCRIPTION_CHARS {
                return Some(text.to_string());
            }
        }
    }

    let source = page.source().await.ok()?;
    html::parse_description(&source).map(|parsed| parsed.content)
}

/// Last path segment of a URL, shortened for file names
fn url_slug(url: &str) -> String {
    url.split('?')
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("listing")
        .chars()
        .take(30)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::url_slug;

    #[test]
    fn test_url_slug() {
        assert_eq!(url_slug("https://hh.ru/vacancy/123?from=x"), "123");
        assert_eq!(url_slug("https://hh.ru/vacancy/123/"), "123");
        assert_eq!(url_slug(""), "listing");
    }
}
