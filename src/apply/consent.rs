use crate::apply::locator::{all_matches, is_visible};
use crate::apply::selectors;
use crate::browser::{BrowserError, Element, Page};
use std::time::Duration;

const CHECKBOX_TIMEOUT: Duration = Duration::from_millis(300);
const MAX_CHECKBOXES: usize = 6;

/// Ticks agreement checkboxes the form requires.
///
/// New checkboxes can appear after other fields change, so callers run this
/// more than once per form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsentHandler;

impl ConsentHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn check_all<P: Page>(&self, page: &P) {
        for strategy in selectors::consent_checkboxes() {
            for checkbox in all_matches(page, &strategy, None, MAX_CHECKBOXES).await {
                if !is_visible(&checkbox, CHECKBOX_TIMEOUT).await {
                    continue;
                }
                match tick(&checkbox).await {
                    Ok(true) => ::log::info!("Checked consent checkbox"),
                    Ok(false) => {}
                    Err(e) => ::log::warn!("Could not check consent checkbox {}: {}", strategy, e),
                }
            }
        }
    }
}

/// Returns whether the box had to be ticked
async fn tick<E: Element>(checkbox: &E) -> Result<bool, BrowserError> {
    if checkbox.is_checked().await? {
        return Ok(false);
    }
    checkbox.check().await?;
    Ok(true)
}
