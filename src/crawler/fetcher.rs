//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent, proxy and timeouts
//! - GET requests for listing, detail and alternate pages
//! - Classifying transport failures and unusable responses

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Proxy};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with status {status}")]
    Unsuccessful { url: String, status: u16 },

    #[error("{url} returned an empty body")]
    EmptyBody { url: String },

    #[error("Task fetching {url} aborted: {reason}")]
    Aborted { url: String, reason: String },
}

/// A received HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub final_url: String,
    /// Page body content
    pub body: String,
}

impl FetchResponse {
    /// Accepted status range is [200, 400) and the body must carry content
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status) && !self.body.trim().is_empty()
    }

    /// Turns an unusable response into the matching [`FetchError`]
    pub fn ensure_success(self, url: &Url) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        if !(200..400).contains(&self.status) {
            return Err(FetchError::Unsuccessful {
                url: url.to_string(),
                status: self.status,
            });
        }
        Err(FetchError::EmptyBody {
            url: url.to_string(),
        })
    }

    /// Base for resolving relative links found in the body
    pub fn base_url(&self, requested: &Url) -> Url {
        Url::parse(&self.final_url).unwrap_or_else(|_| requested.clone())
    }
}

/// Source of page content for the crawler
///
/// Any received response is returned as `Ok`, whatever its status; only
/// transport failures are errors. Callers decide what counts as usable.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

/// Formats the user agent string: `Name/Version (+ContactURL)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (bad proxy, TLS backend)
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = &config.proxy_url {
        builder = builder.proxy(Proxy::all(proxy_url.as_str())?);
    }

    builder.build()
}

/// Production [`Fetcher`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        };

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(classify)?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchResponse {
            status,
            final_url,
            body,
        })
    }
}
