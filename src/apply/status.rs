use crate::apply::locator::{first_visible, Probe};
use crate::apply::selectors;
use crate::browser::Page;
use std::time::Duration;

const PHRASE_TIMEOUT: Duration = Duration::from_millis(500);
const ENTRY_POINT_TIMEOUT: Duration = Duration::from_millis(900);

/// Application state of an opened listing
#[derive(Debug)]
pub enum ListingState<E> {
    /// A confirmation phrase is on the page
    Confirmed,
    /// No apply control exists: already applied, or the listing is closed
    NoEntryPoint,
    /// The listing accepts applications through this control
    Open(E),
}

impl<E> ListingState<E> {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ListingState::Open(_))
    }
}

pub async fn apply_entry_point<P: Page>(page: &P) -> Probe<P::Element> {
    first_visible(page, &selectors::apply_entry_point(), ENTRY_POINT_TIMEOUT).await
}

pub async fn listing_state<P: Page>(page: &P) -> ListingState<P::Element> {
    if first_visible(page, &selectors::already_applied(), PHRASE_TIMEOUT)
        .await
        .is_found()
    {
        return ListingState::Confirmed;
    }

    match apply_entry_point(page).await {
        Probe::Found(button) => ListingState::Open(button),
        Probe::NotFound => ListingState::NoEntryPoint,
    }
}

/// Whether the page shows the listing as applied to
pub async fn already_applied<P: Page>(page: &P) -> bool {
    listing_state(page).await.is_applied()
}
