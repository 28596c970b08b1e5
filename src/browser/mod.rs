pub mod web;
pub mod xpath;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser driver
#[derive(Debug, Error)]
pub enum BrowserError {
    /// A WebDriver command was rejected or failed in transit
    #[error("webdriver command failed: {0}")]
    Command(String),

    /// The element is no longer attached to the document
    #[error("element is detached from the page")]
    Stale,

    /// An operation did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// No WebDriver server accepted the session
    #[error("failed to connect to webdriver: {0}")]
    Connect(String),
}

/// Kind of interactive control addressed by its visible label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Button,
    Link,
}

/// One way of selecting elements on a page.
///
/// A strategy can match zero, one or many elements. Callers keep ordered
/// lists of strategies, from the most precise selector to the most generic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
    /// Any element whose own text contains the phrase, ignoring case
    Text(String),
    /// A button or link whose label contains the text
    Role(Role, String),
}

impl Strategy {
    pub fn css(selector: &str) -> Self {
        Strategy::Css(selector.to_string())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Strategy::XPath(expr.into())
    }

    pub fn text(phrase: &str) -> Self {
        Strategy::Text(phrase.to_string())
    }

    pub fn button(label: &str) -> Self {
        Strategy::Role(Role::Button, label.to_string())
    }

    pub fn link(label: &str) -> Self {
        Strategy::Role(Role::Link, label.to_string())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Css(s) => write!(f, "css={}", s),
            Strategy::XPath(s) => write!(f, "xpath={}", s),
            Strategy::Text(s) => write!(f, "text={}", s),
            Strategy::Role(Role::Button, s) => write!(f, "button={}", s),
            Strategy::Role(Role::Link, s) => write!(f, "link={}", s),
        }
    }
}

/// A handle to one element of an open page
#[async_trait]
pub trait Element: Clone + Send + Sync {
    async fn is_visible(&self) -> Result<bool, BrowserError>;

    async fn attr(&self, name: &str) -> Result<Option<String>, BrowserError>;

    /// Rendered text of the element and its descendants
    async fn text(&self) -> Result<String, BrowserError>;

    /// Current value of a form field
    async fn value(&self) -> Result<String, BrowserError>;

    async fn is_checked(&self) -> Result<bool, BrowserError>;

    async fn click(&self) -> Result<(), BrowserError>;

    /// Click dispatched from script, bypassing overlays covering the element
    async fn force_click(&self) -> Result<(), BrowserError>;

    /// Replace the field content with `text`
    async fn fill(&self, text: &str) -> Result<(), BrowserError>;

    async fn scroll_into_view(&self) -> Result<(), BrowserError>;

    /// Tick a checkbox or radio control if it is not already ticked
    async fn check(&self) -> Result<(), BrowserError> {
        if !self.is_checked().await? {
            self.click().await?;
        }
        Ok(())
    }
}

/// One browser tab
#[async_trait]
pub trait Page: Send + Sync {
    type Element: Element;

    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// All elements matching `strategy`, in document order, optionally
    /// restricted to the descendants of `within`
    async fn find_all(
        &self,
        strategy: &Strategy,
        within: Option<&Self::Element>,
    ) -> Result<Vec<Self::Element>, BrowserError>;

    async fn title(&self) -> Result<String, BrowserError>;

    async fn source(&self) -> Result<String, BrowserError>;

    /// PNG screenshot of the page
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;

    async fn close(&self) -> Result<(), BrowserError>;
}

/// A browser session able to open new tabs
#[async_trait]
pub trait Browser: Send + Sync {
    type Page: Page;

    async fn open_page(&self) -> Result<Self::Page, BrowserError>;
}
