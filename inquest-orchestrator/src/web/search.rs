//! Brave Search client
//!
//! Read-through cached search with exponential backoff on rate limits.

use async_trait::async_trait;
use inquest_core::async_utils::{retry_async, RetryConfig};
use inquest_core::error::{ErrorContext, InquestError, InquestResult};
use inquest_core::traits::{SearchCache, SearchProvider};
use inquest_core::types::{SearchResultItem, SearchSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const BRAVE_SEARCH_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
/// Hard cap imposed by the Brave API
const MAX_RESULTS_PER_REQUEST: usize = 20;

pub struct BraveSearchClient {
    client: reqwest::Client,
    api_key: String,
    cache: Arc<dyn SearchCache>,
    retry: RetryConfig,
}

impl BraveSearchClient {
    /// Build a client from settings, falling back to the BRAVE_API_KEY
    /// environment variable when no key is configured.
    pub fn new(settings: &SearchSettings, cache: Arc<dyn SearchCache>) -> InquestResult<Self> {
        let api_key = match settings.api_key.clone() {
            Some(key) if !key.is_empty() => key,
            _ => std::env::var("BRAVE_API_KEY").map_err(|_| {
                inquest_core::config_error!(
                    "Brave Search API key missing: set search.api_key or BRAVE_API_KEY",
                    "search"
                )
            })?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| InquestError::Config {
                message: format!("Failed to build HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("search").with_operation("build_client"),
            })?;

        Ok(Self {
            client,
            api_key,
            cache,
            retry: RetryConfig {
                max_attempts: settings.max_retries + 1,
                initial_delay_ms: 1000,
                max_delay_ms: 16000,
                backoff_multiplier: 2.0,
                jitter: false,
            },
        })
    }

    async fn request(&self, query: &str, count: usize) -> InquestResult<Vec<SearchResultItem>> {
        let response = self
            .client
            .get(BRAVE_SEARCH_ENDPOINT)
            .header("Accept", "application/json")
            .header("Accept-Encoding", "gzip")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", query),
                ("count", &count.min(MAX_RESULTS_PER_REQUEST).to_string()),
                ("search_lang", "en"),
                ("country", "US"),
                ("safesearch", "moderate"),
                ("freshness", "all"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InquestError::Timeout {
                        operation: "brave_search".to_string(),
                        duration_ms: 0,
                        context: ErrorContext::new("search").with_operation("request"),
                    }
                } else {
                    InquestError::Search {
                        message: format!("Search request failed: {}", e),
                        source: Some(Box::new(e)),
                        context: ErrorContext::new("search").with_operation("request"),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(InquestError::RateLimit {
                message: "Brave Search rate limit exceeded".to_string(),
                retry_after_ms,
                context: ErrorContext::new("search")
                    .with_operation("request")
                    .with_suggestion("Reduce concurrent jobs or upgrade the API plan"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InquestError::Search {
                message: format!("Search API returned status {}: {}", status, body),
                source: None,
                context: ErrorContext::new("search")
                    .with_operation("request")
                    .with_metadata("status", status.as_str()),
            });
        }

        let data: serde_json::Value = response.json().await.map_err(|e| InquestError::Search {
            message: format!("Failed to decode search response: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("search").with_operation("decode"),
        })?;

        let results = data["web"]["results"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| SearchResultItem {
                        title: item["title"].as_str().unwrap_or_default().to_string(),
                        url: item["url"].as_str().unwrap_or_default().to_string(),
                        snippet: item["description"].as_str().unwrap_or_default().to_string(),
                    })
                    .filter(|item| !item.url.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for BraveSearchClient {
    async fn search(&self, query: &str, count: usize) -> InquestResult<Vec<SearchResultItem>> {
        if let Some(cached) = self.cache.get(query, count) {
            debug!(query = query, "Search cache hit");
            return Ok(cached);
        }

        let results = retry_async(
            || self.request(query, count),
            &self.retry,
            "brave_search",
        )
        .await?;

        debug!(query = query, results = results.len(), "Search completed");
        self.cache.set(query, count, results.clone());
        Ok(results)
    }
}
