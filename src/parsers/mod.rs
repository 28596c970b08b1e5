//! Text extraction from listing pages that the locators could not read.

pub mod html;
pub mod text;


/// Text pulled out of a page source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Extracted text content, paragraphs separated by one blank line
    pub content: String,
    /// Links found in the same region of the page
    pub links: Vec<String>,
}

impl ParseResult {
    pub fn new(content: String, links: Vec<String>) -> Self {
        Self { content, links }
    }
}
