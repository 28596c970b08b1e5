use crate::apply::locator::{all_matches, is_visible, wait_visible, Probe};
use crate::apply::selectors;
use crate::browser::{BrowserError, Element, Page};
use std::time::Duration;

const TEXT_MATCH_TIMEOUT: Duration = Duration::from_millis(700);
const CONTAINER_TIMEOUT: Duration = Duration::from_millis(400);
const FALLBACK_TIMEOUT: Duration = Duration::from_millis(800);

/// Containers read per strategy in the container pass
const MAX_CONTAINERS: usize = 10;

/// Picks the resume to attach to an application
pub struct ResumeSelector {
    criterion: String,
}

impl ResumeSelector {
    /// `criterion` is matched case-insensitively against resume titles
    pub fn new(criterion: &str) -> Self {
        Self {
            criterion: criterion.trim().to_lowercase(),
        }
    }

    pub fn criterion(&self) -> &str {
        &self.criterion
    }

    /// Activates the first resume whose text contains the criterion.
    ///
    /// Text-matching locators go first; then visible resume tiles are read one
    /// by one. At most one resume is activated.
    pub async fn select_specific<P: Page>(&self, page: &P) -> bool {
        if self.criterion.is_empty() {
            ::log::warn!("Resume criterion is empty, nothing to match");
            return false;
        }

        for strategy in selectors::resume_by_text(&self.criterion) {
            let Probe::Found(item) = wait_visible(page, &strategy, None, TEXT_MATCH_TIMEOUT).await
            else {
                continue;
            };
            match activate(page, &item, &self.criterion).await {
                Ok(true) => {
                    ::log::info!("Selected resume matching \"{}\"", self.criterion);
                    return true;
                }
                Ok(false) => ::log::debug!("Match via {} holds no single resume", strategy),
                Err(e) => ::log::warn!("Could not activate resume via {}: {}", strategy, e),
            }
        }

        for strategy in selectors::resume_containers() {
            for item in all_matches(page, &strategy, None, MAX_CONTAINERS).await {
                if !is_visible(&item, CONTAINER_TIMEOUT).await {
                    continue;
                }
                let text = match item.text().await {
                    Ok(text) => text.trim().to_lowercase(),
                    Err(_) => continue,
                };
                if !text.contains(&self.criterion) {
                    continue;
                }
                match activate(page, &item, &self.criterion).await {
                    Ok(true) => {
                        ::log::info!("Selected resume matching \"{}\"", self.criterion);
                        return true;
                    }
                    Ok(false) => continue,
                    Err(e) => ::log::warn!("Could not activate resume tile: {}", e),
                }
            }
        }

        ::log::warn!("No resume matching \"{}\" found", self.criterion);
        false
    }

    /// Activates the first resume control found, whatever its title
    pub async fn select_any_if_needed<P: Page>(&self, page: &P) -> bool {
        for strategy in selectors::resume_fallback() {
            let Probe::Found(item) = wait_visible(page, &strategy, None, FALLBACK_TIMEOUT).await
            else {
                continue;
            };

            let is_radio = matches!(
                item.attr("type").await,
                Ok(Some(kind)) if kind.eq_ignore_ascii_case("radio")
            );
            let result = if is_radio {
                item.check().await
            } else {
                item.click().await
            };

            match result {
                Ok(()) => {
                    ::log::info!("Selected the first available resume (fallback)");
                    return true;
                }
                Err(e) => ::log::warn!("Could not select fallback resume via {}: {}", strategy, e),
            }
        }
        false
    }
}

/// Activates the resume behind a matched entry.
///
/// An entry wrapping several resume tiles is narrowed to the first visible
/// tile whose text contains `criterion`. `Ok(false)` when no single resume
/// can be told apart.
async fn activate<P: Page>(
    page: &P,
    item: &P::Element,
    criterion: &str,
) -> Result<bool, BrowserError> {
    for strategy in selectors::resume_tiles() {
        let tiles = all_matches(page, &strategy, Some(item), MAX_CONTAINERS).await;
        if tiles.is_empty() {
            continue;
        }
        for tile in tiles {
            if !tile.is_visible().await.unwrap_or(false) {
                continue;
            }
            match tile.text().await {
                Ok(text) if text.to_lowercase().contains(criterion) => {
                    return activate_tile(page, &tile).await;
                }
                _ => {}
            }
        }
        return Ok(false);
    }
    activate_tile(page, item).await
}

/// Ticks the radio control inside a single resume tile, or clicks the tile
async fn activate_tile<P: Page>(page: &P, tile: &P::Element) -> Result<bool, BrowserError> {
    let radios = page
        .find_all(&selectors::radio(), Some(tile))
        .await
        .unwrap_or_default();

    match radios.as_slice() {
        [] => tile.click().await.map(|()| true),
        [radio] => {
            if radio.is_visible().await.unwrap_or(false) {
                radio.check().await.map(|()| true)
            } else {
                tile.click().await.map(|()| true)
            }
        }
        _ => Ok(false),
    }
}
