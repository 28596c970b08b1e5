use crate::browser::{Element, Page, Strategy};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Interval between visibility checks while waiting for an element
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of probing the page for an element
#[derive(Debug, Clone)]
pub enum Probe<E> {
    Found(E),
    NotFound,
}

impl<E> Probe<E> {
    pub fn found(self) -> Option<E> {
        match self {
            Probe::Found(element) => Some(element),
            Probe::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }
}

/// Waits up to `timeout` for the first match of `strategy` to be visible.
///
/// Driver errors while probing count as "not yet visible"; they never escape.
pub async fn wait_visible<P: Page>(
    page: &P,
    strategy: &Strategy,
    within: Option<&P::Element>,
    timeout: Duration,
) -> Probe<P::Element> {
    let deadline = Instant::now() + timeout;
    loop {
        match page.find_all(strategy, within).await {
            Ok(found) => {
                if let Some(first) = found.into_iter().next() {
                    if first.is_visible().await.unwrap_or(false) {
                        return Probe::Found(first);
                    }
                }
            }
            Err(e) => ::log::trace!("Probe {} failed: {}", strategy, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Probe::NotFound;
        }
        sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// Tries each strategy in order and returns the first one that yields a visible element
pub async fn first_visible<P: Page>(
    page: &P,
    strategies: &[Strategy],
    timeout: Duration,
) -> Probe<P::Element> {
    first_visible_within(page, None, strategies, timeout).await
}

/// Same as [`first_visible`], restricted to the descendants of `within`
pub async fn first_visible_within<P: Page>(
    page: &P,
    within: Option<&P::Element>,
    strategies: &[Strategy],
    timeout: Duration,
) -> Probe<P::Element> {
    for strategy in strategies {
        if let Probe::Found(element) = wait_visible(page, strategy, within, timeout).await {
            ::log::debug!("Located element via {}", strategy);
            return Probe::Found(element);
        }
    }
    Probe::NotFound
}

/// Up to `limit` matches of `strategy`, or none if the query fails
pub async fn all_matches<P: Page>(
    page: &P,
    strategy: &Strategy,
    within: Option<&P::Element>,
    limit: usize,
) -> Vec<P::Element> {
    match page.find_all(strategy, within).await {
        Ok(mut found) => {
            found.truncate(limit);
            found
        }
        Err(e) => {
            ::log::trace!("Query {} failed: {}", strategy, e);
            Vec::new()
        }
    }
}

/// Waits for an element of `candidate` to become visible
pub async fn is_visible<E: Element>(candidate: &E, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if candidate.is_visible().await.unwrap_or(false) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}
