//! Policy retrieval and HTML-to-text reduction.
//!
//! The fetcher is the pipeline's first network hop. Every failure here is
//! typed and pipeline-terminating, which guarantees the system never spends
//! a model call on a policy it could not retrieve.

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigError;

/// Browser-like User-Agent. Policy pages frequently bot-block default
/// library agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text content is never policy text.
const SKIP_TAGS: [&str; 5] = ["script", "style", "noscript", "head", "template"];

/// Errors retrieving a policy page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error fetching '{url}': {reason}")]
    Network { url: String, reason: String },

    #[error("'{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("'{url}' returned an empty body")]
    EmptyContent { url: String },
}

/// The fetched page could not be reduced to plain text.
#[derive(Error, Debug)]
#[error("could not reduce '{url}' to plain text")]
pub struct ParseError {
    pub url: String,
}

/// Retrieves a policy URL as extracted plain text.
///
/// Implementations hold no per-run state; one instance is shared by every
/// concurrent pipeline run.
#[async_trait]
pub trait PolicyFetcher: Send + Sync {
    /// Fetch `url` and return its extracted plain text.
    ///
    /// The text may be empty when the page carried markup but no content;
    /// the fetch stage turns that into a [`ParseError`].
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher backed by a pooled reqwest client.
pub struct HttpPolicyFetcher {
    client: reqwest::Client,
}

impl HttpPolicyFetcher {
    /// Build a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PolicyFetcher for HttpPolicyFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            FetchError::Network {
                url: url.to_string(),
                reason,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if body.trim().is_empty() {
            return Err(FetchError::EmptyContent {
                url: url.to_string(),
            });
        }

        let text = extract_text(&body);
        debug!(url, html_len = body.len(), text_len = text.len(), "policy page reduced to text");
        Ok(text)
    }
}

/// Reduce an HTML document to plain text.
///
/// Text inside [`SKIP_TAGS`] subtrees is dropped; surviving lines are
/// trimmed, blank lines removed, and the rest joined with newlines.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let scraper::Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| SKIP_TAGS.contains(&el.name()))
                .unwrap_or(false)
        });
        if !skipped {
            raw.push_str(text);
            raw.push('\n');
        }
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
