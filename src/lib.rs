//! Recipe-Harvest: a two-phase recipe crawler
//!
//! This crate walks a recipe site's listing pages, follows the detail pages they
//! link to, and reconciles the embedded JSON-LD metadata with what can be read
//! from the rendered markup into one canonical record per recipe.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod url;

use thiserror::Error;

/// Main error type for Recipe-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Could not fetch the first listing page {url}: {reason}")]
    StartupFetch { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Recipe-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlBudget};
pub use crawler::{harvest, Coordinator, Fetcher, Frontier, HttpFetcher};
pub use output::{CrawlSummary, JsonLinesSink, MemorySink, RecordSink};
pub use record::{merge, CanonicalRecord, PartialRecord};
pub use crate::url::{alternates_for, normalize, parse_locator};
