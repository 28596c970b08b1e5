use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static VACANCY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/vacancy/(\d+)").expect("vacancy id pattern is valid"));

/// Identity of one listing: the id used by the seen-store and its canonical URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRef {
    pub id: String,
    pub url: String,
}

impl ListingRef {
    /// Builds a reference from a listing URL. Query string and fragment are dropped.
    pub fn parse(url: &str) -> Self {
        let canonical = canonical_url(url);
        Self {
            id: extract_id(&canonical),
            url: canonical,
        }
    }

    /// Resolves a possibly relative link against the page it was found on
    pub fn resolve(base: &Url, href: &str) -> Option<Self> {
        let resolved = base.join(href).ok()?;
        Some(Self::parse(resolved.as_str()))
    }
}

impl fmt::Display for ListingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

/// Listing id: the number after `/vacancy/`, else the last non-empty path segment
pub fn extract_id(url: &str) -> String {
    if let Some(caps) = VACANCY_ID.captures(url) {
        return caps[1].to_string();
    }

    strip_query(url)
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// The URL without query string and fragment
pub fn canonical_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => strip_query(url).to_string(),
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
