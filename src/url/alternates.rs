//! Alternate endpoints for a detail page
//!
//! When a detail page yields an incomplete record, the same recipe is usually
//! reachable through other renderings of that page. Each one is tried in turn.

use super::normalize::strip_query;
use url::Url;

/// Query marker for the print rendering (all sections on one page)
pub const PRINT_PARAM: (&str, &str) = ("print", "1");

/// Query marker that asks paginated articles to render as a single page
pub const SINGLE_PAGE_PARAM: (&str, &str) = ("page", "all");

/// Path suffix of the lightweight (AMP) rendering
pub const AMP_SEGMENT: &str = "amp";

/// Produces the ordered list of variant locators for one detail page
///
/// Order: bare canonical URL, print variant, single-page variant, AMP variant.
/// Variants that coincide are listed once. The function is pure.
///
/// # Example
///
/// ```
/// use recipe_harvest::url::alternates_for;
/// use url::Url;
///
/// let url = Url::parse("https://recipes.example.com/recipe/42/soup/").unwrap();
/// let alts: Vec<String> = alternates_for(&url).iter().map(|u| u.to_string()).collect();
/// assert_eq!(alts, vec![
///     "https://recipes.example.com/recipe/42/soup/",
///     "https://recipes.example.com/recipe/42/soup/?print=1",
///     "https://recipes.example.com/recipe/42/soup/?page=all",
///     "https://recipes.example.com/recipe/42/soup/amp/",
/// ]);
/// ```
pub fn alternates_for(locator: &Url) -> Vec<Url> {
    let bare = strip_query(locator);

    let candidates = [
        bare.clone(),
        with_param(&bare, PRINT_PARAM),
        with_param(&bare, SINGLE_PAGE_PARAM),
        amp_variant(&bare),
    ];

    let mut alternates: Vec<Url> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !alternates.contains(&candidate) {
            alternates.push(candidate);
        }
    }
    alternates
}

fn with_param(bare: &Url, (key, value): (&str, &str)) -> Url {
    let mut url = bare.clone();
    url.query_pairs_mut().append_pair(key, value);
    url
}

fn amp_variant(bare: &Url) -> Url {
    let path = bare.path();
    if path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|last| last == AMP_SEGMENT)
    {
        return bare.clone();
    }

    let mut url = bare.clone();
    let amp_path = if path.ends_with('/') {
        format!("{}{}/", path, AMP_SEGMENT)
    } else {
        format!("{}/{}", path, AMP_SEGMENT)
    };
    url.set_path(&amp_path);
    url
}
