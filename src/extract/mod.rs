//! Extraction of listing candidates and recipe fields from fetched pages
//!
//! Two extractors read the same page independently:
//! - [`StructuredExtractor`] reads embedded JSON-LD metadata
//! - [`MarkupExtractor`] applies selector heuristics to the rendered markup
//!
//! [`PageExtractor`] runs both and combines their results, structured first.

mod markup;
mod shape;
mod structured;

pub use markup::MarkupExtractor;
pub use shape::{clean_text, first_text, has_type, text_list, url_of, Shape};
pub use structured::StructuredExtractor;

use crate::record::{merge, PartialRecord};
use scraper::Html;
use url::Url;

/// What a listing page yields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    /// Detail locators: structured results first, then markup, deduplicated
    pub candidates: Vec<Url>,

    /// The next listing page, if one is linked
    pub next: Option<Url>,
}

/// Runs both extractors over one page
#[derive(Debug, Clone)]
pub struct PageExtractor {
    structured: StructuredExtractor,
    markup: MarkupExtractor,
}

impl PageExtractor {
    /// Creates extractors that accept detail locators whose path contains `detail_path_pattern`
    pub fn new(detail_path_pattern: &str) -> Self {
        Self {
            structured: StructuredExtractor::new(detail_path_pattern),
            markup: MarkupExtractor::new(detail_path_pattern),
        }
    }

    /// Extracts detail candidates and the next-page link from a listing page
    pub fn listing(&self, body: &str, base: &Url) -> ListingPage {
        let document = Html::parse_document(body);

        let mut candidates = self.structured.extract_list(&document, base);
        for url in self.markup.extract_list(&document, base) {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }

        ListingPage {
            candidates,
            next: self.markup.find_next_page(&document, base),
        }
    }

    /// Extracts recipe fields from a detail page, structured data taking precedence
    pub fn detail(&self, body: &str) -> PartialRecord {
        let document = Html::parse_document(body);

        let structured = self.structured.extract_detail(&document);
        let markup = self.markup.extract_detail(&document);

        match structured {
            Some(record) => merge(record, Some(&markup)),
            None => markup,
        }
    }
}
