use crate::apply::consent::ConsentHandler;
use crate::apply::locator::{wait_visible, Probe};
use crate::apply::status::already_applied;
use crate::apply::{selectors, MAX_ATTEMPTS};
use crate::browser::{Element, Page};
use crate::config::Timings;
use crate::utils::human_pause;
use std::time::Duration;
use tokio::time::sleep;

const SUBMIT_TIMEOUT: Duration = Duration::from_millis(900);
const CONFIRMATION_WAIT: Duration = Duration::from_millis(1500);

/// Clicks the submit control until the page confirms the application.
///
/// The control is often disabled until client-side validation finishes, and a
/// click under an overlay can be swallowed, so each cycle re-probes the form
/// and checks the confirmation instead of trusting the click.
pub struct SubmissionDriver<'a> {
    timings: &'a Timings,
    consent: ConsentHandler,
}

impl<'a> SubmissionDriver<'a> {
    pub fn new(timings: &'a Timings, consent: ConsentHandler) -> Self {
        Self { timings, consent }
    }

    /// Returns `true` once a submission is confirmed, `false` after the cycle budget
    pub async fn submit<P: Page>(&self, page: &P) -> bool {
        for cycle in 1..=MAX_ATTEMPTS {
            let Some(button) = find_enabled_submit(page).await else {
                ::log::debug!("No enabled submit control in cycle {}", cycle);
                self.consent.check_all(page).await;
                human_pause(1.0, 2.0).await;
                continue;
            };

            if self.click_and_verify(page, &button).await {
                ::log::info!("Application sent");
                return true;
            }
            ::log::debug!("Submission not confirmed in cycle {} of {}", cycle, MAX_ATTEMPTS);
        }

        ::log::warn!("Could not submit the application (captcha or required fields?)");
        false
    }

    async fn click_and_verify<P: Page>(&self, page: &P, button: &P::Element) -> bool {
        if let Err(e) = button.scroll_into_view().await {
            ::log::debug!("Could not scroll submit control into view: {}", e);
        }
        human_pause(self.timings.min_sleep, self.timings.max_sleep).await;

        if let Err(e) = button.click().await {
            ::log::warn!("Clicking the submit control failed: {}", e);
            human_pause(2.0, 4.0).await;
            if let Err(e) = button.force_click().await {
                ::log::warn!("Forced click on the submit control failed: {}", e);
                return false;
            }
        }

        verify_submitted(page).await
    }
}

/// First visible submit control that is not disabled
pub async fn find_enabled_submit<P: Page>(page: &P) -> Option<P::Element> {
    for strategy in selectors::submit() {
        let Probe::Found(button) = wait_visible(page, &strategy, None, SUBMIT_TIMEOUT).await else {
            continue;
        };
        if is_enabled(&button).await {
            return Some(button);
        }
        ::log::trace!("Submit control via {} is disabled", strategy);
    }
    None
}

async fn is_enabled<E: Element>(button: &E) -> bool {
    let disabled = match button.attr("disabled").await {
        Ok(value) => value.is_some(),
        Err(_) => return false,
    };
    let aria_disabled = match button.attr("aria-disabled").await {
        Ok(value) => value.is_some_and(|v| v != "false"),
        Err(_) => return false,
    };
    !disabled && !aria_disabled
}

/// Gives the page two chances to show the confirmation after a click
async fn verify_submitted<P: Page>(page: &P) -> bool {
    for _ in 0..2 {
        sleep(CONFIRMATION_WAIT).await;
        if already_applied(page).await {
            return true;
        }
    }
    false
}
