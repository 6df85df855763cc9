use serde::{Deserialize, Deserializer};

/// Main configuration structure for Recipe-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Derives the immutable crawl budget from the crawl section
    pub fn budget(&self) -> CrawlBudget {
        CrawlBudget {
            results_wanted: self.crawl.results_wanted,
            max_pages: self.crawl.max_pages,
            collect_details: self.crawl.collect_details,
            dedupe: self.crawl.dedupe,
        }
    }
}

/// Crawl behaviour configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// First listing page to visit
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum number of records to emit; `None` means unbounded
    #[serde(
        rename = "results-wanted",
        default = "default_results_wanted",
        deserialize_with = "deserialize_results_wanted"
    )]
    pub results_wanted: Option<u64>,

    /// Maximum number of listing pages to visit
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Whether detail pages are fetched at all
    #[serde(rename = "collect-details", default = "default_true")]
    pub collect_details: bool,

    /// Whether locators are deduplicated across the crawl
    #[serde(default = "default_true")]
    pub dedupe: bool,

    /// Label attached verbatim to every emitted record
    #[serde(rename = "recipe-type", default)]
    pub recipe_type: String,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

/// Site-specific heuristics
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Substring a locator's path must contain to be treated as a detail page
    #[serde(rename = "detail-path-pattern", default = "default_detail_path_pattern")]
    pub detail_path_pattern: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            detail_path_pattern: default_detail_path_pattern(),
        }
    }
}

/// User agent identification and transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Optional proxy every request is routed through
    #[serde(rename = "proxy-url", default)]
    pub proxy_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON-lines file records are appended to
    #[serde(rename = "records-path", default = "default_records_path")]
    pub records_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: default_records_path(),
        }
    }
}

/// Immutable limits a single crawl runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    /// Records wanted; `None` is unbounded
    pub results_wanted: Option<u64>,
    pub max_pages: u32,
    pub collect_details: bool,
    pub dedupe: bool,
}

impl Default for CrawlBudget {
    fn default() -> Self {
        Self {
            results_wanted: default_results_wanted(),
            max_pages: default_max_pages(),
            collect_details: true,
            dedupe: true,
        }
    }
}

fn default_results_wanted() -> Option<u64> {
    Some(50)
}

fn default_max_pages() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> u32 {
    5
}

fn default_detail_path_pattern() -> String {
    "/recipe/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_records_path() -> String {
    "./recipes.jsonl".to_string()
}

/// Accepts an integer, or a float where any non-finite value means "no limit"
fn deserialize_results_wanted<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) if n >= 0 => Ok(Some(n as u64)),
        Raw::Int(n) => Err(serde::de::Error::custom(format!(
            "results-wanted must not be negative, got {}",
            n
        ))),
        Raw::Float(f) if !f.is_finite() => Ok(None),
        Raw::Float(f) if f >= 0.0 => Ok(Some(f.floor() as u64)),
        Raw::Float(f) => Err(serde::de::Error::custom(format!(
            "results-wanted must not be negative, got {}",
            f
        ))),
    }
}
