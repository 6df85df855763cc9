//! Markup heuristics
//!
//! The low-confidence fallback layer: every field has an ordered list of
//! selectors and the first one that yields non-empty text wins. Nothing here
//! returns an error; a field that matches nothing is simply absent.

use super::shape::clean_text;
use crate::record::{dedup_ordered, PartialRecord};
use crate::url::{is_detail_locator, normalize, strip_query};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// Where a heuristic reads its value from
#[derive(Debug, Clone, Copy)]
enum Source {
    /// The element's text content
    Text(&'static str),
    /// One of the element's attributes
    Attr(&'static str, &'static str),
}

const TITLE: &[Source] = &[
    Source::Text("h1"),
    Source::Text("[class*='recipe-title']"),
    Source::Text("[itemprop='name']"),
    Source::Attr("meta[property='og:title']", "content"),
    Source::Text("title"),
];

const AUTHOR: &[Source] = &[
    Source::Text("[itemprop='author'] [itemprop='name']"),
    Source::Text("[itemprop='author']"),
    Source::Text("[rel='author']"),
    Source::Text("[class*='author-name']"),
    Source::Attr("meta[name='author']", "content"),
];

const DESCRIPTION: &[Source] = &[
    Source::Attr("meta[name='description']", "content"),
    Source::Attr("meta[property='og:description']", "content"),
    Source::Text("[itemprop='description']"),
];

const INGREDIENTS: &[Source] = &[
    Source::Text("[itemprop='recipeIngredient']"),
    Source::Text("[itemprop='ingredients']"),
    Source::Text("li[class*='ingredient']"),
    Source::Text("[class*='ingredient'] li"),
];

const INSTRUCTIONS: &[Source] = &[
    Source::Text("[itemprop='recipeInstructions'] li"),
    Source::Text("[itemprop='recipeInstructions']"),
    Source::Text("[class*='instruction'] li"),
    Source::Text("[class*='direction'] li"),
    Source::Text("li[class*='step']"),
    Source::Text("[class*='method'] li"),
    Source::Text("ol li"),
];

const PREP_TIME: &[Source] = &[
    Source::Attr("[itemprop='prepTime']", "datetime"),
    Source::Attr("[itemprop='prepTime']", "content"),
];

const COOK_TIME: &[Source] = &[
    Source::Attr("[itemprop='cookTime']", "datetime"),
    Source::Attr("[itemprop='cookTime']", "content"),
];

const TOTAL_TIME: &[Source] = &[
    Source::Attr("[itemprop='totalTime']", "datetime"),
    Source::Attr("[itemprop='totalTime']", "content"),
];

const SERVINGS: &[Source] = &[
    Source::Attr("[itemprop='recipeYield']", "content"),
    Source::Text("[itemprop='recipeYield']"),
    Source::Text("[class*='servings']"),
    Source::Text("[class*='yield']"),
];

const TAGS: &[Source] = &[
    Source::Text("a[rel~='tag']"),
    Source::Attr("meta[property='article:tag']", "content"),
    Source::Text("[class*='tags'] a"),
];

const IMAGE: &[Source] = &[
    Source::Attr("meta[property='og:image']", "content"),
    Source::Attr("[itemprop='image']", "content"),
    Source::Attr("[itemprop='image']", "src"),
];

const CUISINE: &[Source] = &[Source::Text("[itemprop='recipeCuisine']")];

const CATEGORY: &[Source] = &[Source::Text("[itemprop='recipeCategory']")];

const RATING_VALUE: &[Source] = &[
    Source::Attr("[itemprop='ratingValue']", "content"),
    Source::Text("[itemprop='ratingValue']"),
];

const RATING_COUNT: &[Source] = &[
    Source::Attr("[itemprop='ratingCount']", "content"),
    Source::Text("[itemprop='ratingCount']"),
    Source::Attr("[itemprop='reviewCount']", "content"),
    Source::Text("[itemprop='reviewCount']"),
];

const DATE_PUBLISHED: &[Source] = &[
    Source::Attr("[itemprop='datePublished']", "content"),
    Source::Attr("[itemprop='datePublished']", "datetime"),
    Source::Attr("meta[property='article:published_time']", "content"),
];

/// Extracts list locators and recipe fields from rendered markup
#[derive(Debug, Clone)]
pub struct MarkupExtractor {
    detail_path_pattern: String,
}

impl MarkupExtractor {
    pub fn new(detail_path_pattern: impl Into<String>) -> Self {
        Self {
            detail_path_pattern: detail_path_pattern.into(),
        }
    }

    /// Detail locators linked from anchors, in document order, query stripped
    pub fn extract_list(&self, document: &Html, base: &Url) -> Vec<Url> {
        let mut locators: Vec<Url> = Vec::new();

        let Ok(selector) = Selector::parse("a[href]") else {
            return locators;
        };

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = normalize(href, base).map(|u| strip_query(&u)) else {
                continue;
            };
            if is_detail_locator(&url, &self.detail_path_pattern) && !locators.contains(&url) {
                locators.push(url);
            }
        }

        locators
    }

    /// Recipe fields found by selector heuristics; never fails
    pub fn extract_detail(&self, document: &Html) -> PartialRecord {
        PartialRecord {
            title: first_match(document, TITLE),
            author: first_match(document, AUTHOR),
            description: first_match(document, DESCRIPTION),
            prep_time: first_match(document, PREP_TIME),
            cook_time: first_match(document, COOK_TIME),
            total_time: first_match(document, TOTAL_TIME),
            servings: first_match(document, SERVINGS),
            ingredients: all_matches(document, INGREDIENTS),
            instructions: all_matches(document, INSTRUCTIONS),
            tags: all_matches(document, TAGS),
            image_url: first_match(document, IMAGE),
            cuisine: all_matches(document, CUISINE),
            category: all_matches(document, CATEGORY),
            rating_value: first_match(document, RATING_VALUE).map(Value::String),
            rating_count: first_match(document, RATING_COUNT).map(Value::String),
            rating_best: None,
            rating_worst: None,
            nutrition: None,
            date_published: first_match(document, DATE_PUBLISHED),
        }
    }
}

impl MarkupExtractor {
    /// Locates the listing's "next page" link
    ///
    /// Precedence: a `rel=next` relation link, then a control labelled "next"
    /// (aria-label, title or class), then an anchor whose text reads like
    /// next/›/»/>. A candidate pointing back at `base` is ignored, and the two
    /// label-based tiers never accept a detail locator.
    pub fn find_next_page(&self, document: &Html, base: &Url) -> Option<Url> {
        let resolve = |raw: &str| normalize(raw, base).filter(|url| url != base);
        let resolve_listing = |raw: &str| {
            resolve(raw).filter(|url| !is_detail_locator(url, &self.detail_path_pattern))
        };

        if let Ok(selector) = Selector::parse("link[rel~='next'][href], a[rel~='next'][href]") {
            if let Some(url) = document
                .select(&selector)
                .filter_map(|el| el.value().attr("href"))
                .find_map(resolve)
            {
                return Some(url);
            }
        }

        if let Ok(selector) = Selector::parse("a[href], button, [role='button']") {
            if let Some(url) = document
                .select(&selector)
                .filter(is_next_control)
                .filter_map(control_target)
                .find_map(resolve_listing)
            {
                return Some(url);
            }
        }

        if let Ok(selector) = Selector::parse("a[href]") {
            return document
                .select(&selector)
                .filter(|el| is_next_label(&element_text(el)))
                .filter_map(|el| el.value().attr("href"))
                .find_map(resolve_listing);
        }

        None
    }
}

fn is_next_control(element: &ElementRef) -> bool {
    let value = element.value();
    ["aria-label", "title", "class"].iter().any(|attr| {
        value.attr(attr).is_some_and(|v| {
            let v = v.to_ascii_lowercase();
            v.contains("next") && !v.contains("prev")
        })
    })
}

fn control_target<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    let value = element.value();
    value
        .attr("href")
        .or_else(|| value.attr("data-href"))
        .or_else(|| value.attr("data-url"))
}

fn is_next_label(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    text.starts_with("next")
        || matches!(text.as_str(), ">" | ">>" | "›" | "»" | "→")
        || text.starts_with('›')
        || text.starts_with('»')
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

fn read(element: &ElementRef, source: Source) -> Option<String> {
    match source {
        Source::Text(_) => clean_text(&element_text(element)),
        Source::Attr(_, attr) => element.value().attr(attr).and_then(clean_text),
    }
}

fn selector_of(source: Source) -> Option<Selector> {
    let css = match source {
        Source::Text(css) | Source::Attr(css, _) => css,
    };
    Selector::parse(css).ok()
}

/// First non-empty value across the heuristics, in order
fn first_match(document: &Html, sources: &[Source]) -> Option<String> {
    sources.iter().find_map(|&source| {
        let selector = selector_of(source)?;
        document
            .select(&selector)
            .find_map(|element| read(&element, source))
    })
}

/// Every matching element's value for the first heuristic that matches anything
fn all_matches(document: &Html, sources: &[Source]) -> Vec<String> {
    for &source in sources {
        let Some(selector) = selector_of(source) else {
            continue;
        };
        let values: Vec<String> = document
            .select(&selector)
            .filter_map(|element| read(&element, source))
            .collect();
        if !values.is_empty() {
            return dedup_ordered(values);
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> MarkupExtractor {
        MarkupExtractor::new("/recipe/")
    }

    fn base() -> Url {
        Url::parse("https://recipes.example.com/recipes/?page=1").unwrap()
    }

    const DETAIL: &str = r#"
        <html><head>
            <title>Garlic Bread | Example Kitchen</title>
            <meta name="description" content="  Crispy   and buttery. ">
            <meta property="og:image" content="https://img.example.com/bread.jpg">
        </head><body>
            <h1>  Garlic
                Bread </h1>
            <span class="author-name">Jo Baker</span>
            <time itemprop="prepTime" datetime="PT10M">10 min</time>
            <span class="recipe-servings">Serves 4</span>
            <ul class="ingredients-list">
                <li>1 baguette</li>
                <li>  4 cloves garlic </li>
                <li></li>
                <li>1 baguette</li>
            </ul>
            <div class="instructions">
                <ol><li>Slice bread.</li><li>Spread <b>butter</b>.</li><li>Bake.</li></ol>
            </div>
            <a rel="tag" href="/tag/bread">Bread</a>
            <a rel="tag" href="/tag/sides">Sides</a>
        </body></html>"#;

    #[test]
    fn test_extract_detail_heuristics() {
        let record = extractor().extract_detail(&Html::parse_document(DETAIL));

        assert_eq!(record.title.as_deref(), Some("Garlic Bread"));
        assert_eq!(record.author.as_deref(), Some("Jo Baker"));
        assert_eq!(record.description.as_deref(), Some("Crispy and buttery."));
        assert_eq!(record.prep_time.as_deref(), Some("PT10M"));
        assert_eq!(record.servings.as_deref(), Some("Serves 4"));
        assert_eq!(record.ingredients, vec!["1 baguette", "4 cloves garlic"]);
        assert_eq!(record.instructions, vec!["Slice bread.", "Spread butter.", "Bake."]);
        assert_eq!(record.tags, vec!["Bread", "Sides"]);
        assert_eq!(record.image_url.as_deref(), Some("https://img.example.com/bread.jpg"));
    }

    #[test]
    fn test_extract_detail_empty_page() {
        let record = extractor().extract_detail(&Html::parse_document("<html><body></body></html>"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let html = "<html><head><title> Pie </title></head><body><h1>  </h1></body></html>";
        let record = extractor().extract_detail(&Html::parse_document(html));
        assert_eq!(record.title.as_deref(), Some("Pie"));
    }

    #[test]
    fn test_ordered_list_fallback_for_instructions() {
        let html = "<html><body><ol><li>Boil.</li><li>Serve.</li></ol></body></html>";
        let record = extractor().extract_detail(&Html::parse_document(html));
        assert_eq!(record.instructions, vec!["Boil.", "Serve."]);
    }

    #[test]
    fn test_extract_list_filters_and_dedups() {
        let html = r##"<html><body>
            <a href="/recipe/1/soup?ref=list">Soup</a>
            <a href="/recipe/1/soup#comments">Soup comments</a>
            <a href="https://recipes.example.com/recipe/2/stew">Stew</a>
            <a href="/about">About</a>
            <a href="mailto:hi@example.com">Mail</a>
        </body></html>"##;
        let urls: Vec<String> = extractor()
            .extract_list(&Html::parse_document(html), &base())
            .iter()
            .map(Url::to_string)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://recipes.example.com/recipe/1/soup",
                "https://recipes.example.com/recipe/2/stew",
            ]
        );
    }

    #[test]
    fn test_next_page_prefers_relation_link() {
        let html = r#"<html><head><link rel="next" href="/recipes/?page=3"></head><body>
            <a href="/recipes/?page=2">Next</a>
        </body></html>"#;
        let next = extractor().find_next_page(&Html::parse_document(html), &base()).unwrap();
        assert_eq!(next.as_str(), "https://recipes.example.com/recipes/?page=3");
    }

    #[test]
    fn test_next_page_from_labelled_control() {
        let html = r#"<html><body>
            <a class="pagination-prev" href="/recipes/?page=0">Back</a>
            <a aria-label="Next page" href="/recipes/?page=2">2</a>
        </body></html>"#;
        let next = extractor().find_next_page(&Html::parse_document(html), &base()).unwrap();
        assert_eq!(next.as_str(), "https://recipes.example.com/recipes/?page=2");
    }

    #[test]
    fn test_next_page_from_button_data_href() {
        let html = r#"<html><body><button class="load-next" data-href="/recipes/?page=2">More</button></body></html>"#;
        let next = extractor().find_next_page(&Html::parse_document(html), &base()).unwrap();
        assert_eq!(next.as_str(), "https://recipes.example.com/recipes/?page=2");
    }

    #[test]
    fn test_next_page_from_anchor_text() {
        for label in ["Next »", "›", "»", ">"] {
            let html = format!(
                r#"<html><body><a href="/recipes/?page=1">1</a><a href="/recipes/?page=2">{}</a></body></html>"#,
                label
            );
            let next = extractor().find_next_page(&Html::parse_document(&html), &base());
            assert_eq!(
                next.map(|u| u.to_string()),
                Some("https://recipes.example.com/recipes/?page=2".to_string()),
                "label {}",
                label
            );
        }
    }

    #[test]
    fn test_next_page_ignores_self_link() {
        let html = r#"<html><body><a rel="next" href="/recipes/?page=1">Next</a></body></html>"#;
        assert!(extractor().find_next_page(&Html::parse_document(html), &base()).is_none());
    }

    #[test]
    fn test_next_control_skips_recipe_cards() {
        let html = r#"<html><body>
            <a class="next-recipe" href="/recipe/9/lemon-tart">Up next: Lemon Tart</a>
            <a href="/recipes/?page=2">Next »</a>
        </body></html>"#;
        let next = extractor()
            .find_next_page(&Html::parse_document(html), &base())
            .unwrap();
        assert_eq!(next.as_str(), "https://recipes.example.com/recipes/?page=2");
    }

    #[test]
    fn test_no_next_page() {
        let html = "<html><body><a href='/recipe/1/soup'>Soup</a></body></html>";
        assert!(extractor().find_next_page(&Html::parse_document(html), &base()).is_none());
    }
}
