//! URL handling module for Recipe-Harvest
//!
//! This module provides locator normalization, alternate-endpoint construction,
//! detail-path matching and locator-derived fallback titles.

mod alternates;
mod normalize;

use percent_encoding::percent_decode_str;
use url::Url;

// Re-export main functions
pub use alternates::{alternates_for, AMP_SEGMENT, PRINT_PARAM, SINGLE_PAGE_PARAM};
pub use normalize::{normalize, parse_locator, strip_query};

/// Returns true if the locator's path looks like a detail page
///
/// `pattern` is a plain substring of the path, e.g. `/recipe/`.
pub fn is_detail_locator(url: &Url, pattern: &str) -> bool {
    url.path().contains(pattern)
}

/// Derives a human-readable title from a locator's path
///
/// Uses the last path segment that contains a letter, so numeric ids are
/// skipped: `/recipe/1234/best-lemon-bars/` becomes `Best Lemon Bars`.
/// Falls back to the host name when no segment qualifies.
///
/// # Examples
///
/// ```
/// use recipe_harvest::url::fallback_title;
/// use url::Url;
///
/// let url = Url::parse("https://recipes.example.com/recipe/1234/best-lemon-bars/").unwrap();
/// assert_eq!(fallback_title(&url), "Best Lemon Bars");
/// ```
pub fn fallback_title(url: &Url) -> String {
    let slug = url
        .path_segments()
        .and_then(|segments| {
            segments
                .map(|s| percent_decode_str(s).decode_utf8_lossy())
                .filter(|s| s.chars().any(|c| c.is_alphabetic()))
                .filter(|s| &**s != AMP_SEGMENT)
                .last()
        })
        .map(|segment| title_case_slug(&segment))
        .filter(|t| !t.is_empty());

    match slug {
        Some(title) => title,
        None => url.host_str().unwrap_or("untitled").to_string(),
    }
}

fn title_case_slug(segment: &str) -> String {
    let segment = segment
        .rsplit_once('.')
        .filter(|(_, ext)| matches!(*ext, "html" | "htm" | "php" | "aspx"))
        .map(|(stem, _)| stem)
        .unwrap_or(segment);

    segment
        .split(|c: char| c == '-' || c == '_' || c == '+' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_fallback_title_skips_numeric_segments() {
        assert_eq!(
            fallback_title(&url("https://r.example.com/recipe/99/garlic-bread/")),
            "Garlic Bread"
        );
    }

    #[test]
    fn test_fallback_title_trailing_id() {
        assert_eq!(
            fallback_title(&url("https://r.example.com/recipe/garlic_bread/12345")),
            "Garlic Bread"
        );
    }

    #[test]
    fn test_fallback_title_strips_extension() {
        assert_eq!(
            fallback_title(&url("https://r.example.com/recipes/pad-thai.html")),
            "Pad Thai"
        );
    }

    #[test]
    fn test_fallback_title_ignores_amp_segment() {
        assert_eq!(
            fallback_title(&url("https://r.example.com/recipe/pad-thai/amp")),
            "Pad Thai"
        );
    }

    #[test]
    fn test_fallback_title_decodes_escapes() {
        assert_eq!(
            fallback_title(&url("https://r.example.com/recipe/1/crème-brûlée")),
            "Crème Brûlée"
        );
        assert_eq!(
            fallback_title(&url("https://r.example.com/recipe/2/mac%20and%20cheese")),
            "Mac And Cheese"
        );
    }

    #[test]
    fn test_fallback_title_uses_host_for_root() {
        assert_eq!(fallback_title(&url("https://r.example.com/")), "r.example.com");
        assert_eq!(
            fallback_title(&url("https://r.example.com/123/456")),
            "r.example.com"
        );
    }

    #[test]
    fn test_is_detail_locator() {
        assert!(is_detail_locator(
            &url("https://r.example.com/recipe/1/soup"),
            "/recipe/"
        ));
        assert!(!is_detail_locator(
            &url("https://r.example.com/recipes/soups"),
            "/recipe/"
        ));
    }
}
