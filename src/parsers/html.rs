use crate::apply::selectors::DESCRIPTION_SELECTORS;
use crate::parsers::{text, ParseResult};
use scraper::{ElementRef, Html, Selector};

/// Descriptions shorter than this are treated as placeholders
pub const MIN_DESCRIPTION_CHARS: usize = 50;

/// Finds the listing description in a page source.
///
/// Selectors are tried in order; the first block with enough text wins.
pub fn parse_description(html: &str) -> Option<ParseResult> {
    let doc = Html::parse_document(html);

    for css in DESCRIPTION_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            ::log::debug!("Skipping unparseable selector {}", css);
            continue;
        };

        for block in doc.select(&selector) {
            let content = text::normalize(&block_text(block));
            if content.chars().count() > MIN_DESCRIPTION_CHARS {
                return Some(ParseResult::new(content, hrefs(block)));
            }
        }
    }

    None
}

/// Links to listings on a search results page, in document order
pub fn parse_listing_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(link_selector) = Selector::parse(r#"a[href*="/vacancy/"]"#) else {
        return Vec::new();
    };

    let links = doc
        .select(&link_selector)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} listing links", links.len());
    links
}

/// Text of a block with each child node as its own paragraph
fn block_text(block: ElementRef<'_>) -> String {
    let paragraphs = block
        .children()
        .map(|child| match ElementRef::wrap(child) {
            Some(element) => element.text().collect::<Vec<_>>().join(" "),
            None => child
                .value()
                .as_text()
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
        })
        .filter(|para| !para.trim().is_empty())
        .collect::<Vec<_>>();

    if paragraphs.is_empty() {
        block.text().collect::<Vec<_>>().join(" ")
    } else {
        paragraphs.join("\n\n")
    }
}

fn hrefs(block: ElementRef<'_>) -> Vec<String> {
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };
    block
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect()
}
