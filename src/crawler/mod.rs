//! Crawler module for listing and detail page processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Crawl-wide dedup and budget tracking ([`Frontier`])
//! - Overall crawl coordination across listing and detail pages

mod coordinator;
mod fetcher;
mod frontier;

pub use coordinator::{harvest, Coordinator};
pub use fetcher::{
    build_http_client, user_agent_string, FetchError, FetchResponse, Fetcher, HttpFetcher,
};
pub use frontier::Frontier;
