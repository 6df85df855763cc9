use crate::UrlError;
use url::Url;

/// Query parameters that never change which page is served
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
    "ocid",
];

/// Schemes that can appear in an href but never point at a fetchable page
const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves a possibly-relative reference against `base` into a canonical locator
///
/// # Normalization Steps
///
/// 1. Reject empty references and non-navigational schemes
/// 2. Resolve against the base locator (dot segments are removed here)
/// 3. Reject anything that is not HTTP(S) or has no host
/// 4. Remove the fragment
/// 5. Remove tracking query parameters
/// 6. Sort remaining query parameters by key
/// 7. Remove an empty query string
///
/// Page-identity markers such as `page=2` or `print=1` survive normalization.
/// Returns `None` instead of an error so callers can drop bad candidates silently.
///
/// # Examples
///
/// ```
/// use recipe_harvest::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://recipes.example.com/list/").unwrap();
/// let url = normalize("../recipe/42/soup?utm_source=feed#steps", &base).unwrap();
/// assert_eq!(url.as_str(), "https://recipes.example.com/recipe/42/soup");
/// ```
pub fn normalize(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if IGNORED_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        return None;
    }

    let mut url = base.join(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;

    canonicalize(&mut url);
    Some(url)
}

/// Parses an absolute locator (e.g. from configuration) and canonicalizes it
pub fn parse_locator(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    canonicalize(&mut url);
    Ok(url)
}

/// Returns a copy of the locator with its whole query removed
///
/// Listing-link discovery uses this so that sort/filter parameters on detail
/// links do not create duplicates.
pub fn strip_query(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped
}

fn canonicalize(url: &mut Url) {
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params.iter());
        }
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    // Stable sort keeps repeated keys in source order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
