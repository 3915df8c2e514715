//! Collaborator traits
//!
//! Every external capability the orchestrator depends on sits behind one
//! of these seams so that tests can substitute scripted implementations.

use crate::error::InquestResult;
use crate::types::{AgentResponse, FetchedPage, SearchResultItem};
use async_trait::async_trait;

/// A conversational research agent. One prompt in, one response out;
/// the implementation owns any provider-specific session state.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn ask(&self, prompt: &str) -> InquestResult<AgentResponse>;
}

/// Web search capability
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query and return up to `count` ranked results
    async fn search(&self, query: &str, count: usize) -> InquestResult<Vec<SearchResultItem>>;
}

/// Full-text page retrieval. Failures are reported inside
/// [`FetchedPage`] so batch callers never have to unwind.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchedPage;

    /// Fetch several URLs concurrently, preserving input order
    async fn fetch_batch(&self, urls: &[String]) -> Vec<FetchedPage>;
}

/// Read-through cache for search results. Synchronous on purpose; the
/// in-memory implementation never blocks long enough to warrant async.
pub trait SearchCache: Send + Sync {
    fn get(&self, query: &str, count: usize) -> Option<Vec<SearchResultItem>>;
    fn set(&self, query: &str, count: usize, results: Vec<SearchResultItem>);
}
