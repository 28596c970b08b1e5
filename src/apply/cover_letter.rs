use crate::apply::locator::{first_visible, wait_visible, Probe};
use crate::apply::{selectors, MAX_ATTEMPTS};
use crate::browser::{BrowserError, Element, Page};
use crate::utils::human_pause;
use std::time::Duration;

const TOGGLE_TIMEOUT: Duration = Duration::from_millis(800);
const FIELD_TIMEOUT: Duration = Duration::from_millis(900);

/// Minimum read-back length accepted for a cover letter of `text`.
///
/// The form may reformat whitespace, so this only guards against an empty or
/// truncated field.
pub fn min_readback_len(text: &str) -> usize {
    20.min(text.chars().count() / 2)
}

pub fn readback_accepted(text: &str, readback: &str) -> bool {
    readback.trim().chars().count() >= min_readback_len(text)
}

/// Writes the cover letter into the application form and checks it stuck
pub struct CoverLetterFiller;

impl CoverLetterFiller {
    pub fn new() -> Self {
        Self
    }

    pub async fn fill_and_verify<P: Page>(&self, page: &P, text: &str) -> bool {
        self.reveal(page).await;

        let strategies = selectors::cover_letter_input();
        for attempt in 1..=MAX_ATTEMPTS {
            for strategy in &strategies {
                let Probe::Found(field) = wait_visible(page, strategy, None, FIELD_TIMEOUT).await
                else {
                    continue;
                };

                match write(&field, text).await {
                    Ok(readback) if readback_accepted(text, &readback) => {
                        ::log::info!("Cover letter filled and verified");
                        return true;
                    }
                    Ok(readback) => ::log::debug!(
                        "Cover letter read back {} chars via {}, expected at least {}",
                        readback.trim().chars().count(),
                        strategy,
                        min_readback_len(text)
                    ),
                    Err(e) => ::log::warn!("Writing cover letter via {} failed: {}", strategy, e),
                }
            }
            ::log::debug!("Cover letter attempt {} of {} failed", attempt, MAX_ATTEMPTS);
            human_pause(0.4, 0.8).await;
        }

        ::log::warn!("Could not confirm the cover letter is present in the form");
        false
    }

    /// Opens the collapsed cover letter field when the form hides it
    async fn reveal<P: Page>(&self, page: &P) {
        if let Probe::Found(toggle) =
            first_visible(page, &selectors::cover_letter_toggle(), TOGGLE_TIMEOUT).await
        {
            match toggle.click().await {
                Ok(()) => human_pause(0.3, 0.6).await,
                Err(e) => ::log::warn!("Could not open cover letter field: {}", e),
            }
        }
    }
}

impl Default for CoverLetterFiller {
    fn default() -> Self {
        Self::new()
    }
}

async fn write<E: Element>(field: &E, text: &str) -> Result<String, BrowserError> {
    field.click().await?;
    field.fill(text).await?;
    human_pause(0.2, 0.4).await;
    field.value().await
}
