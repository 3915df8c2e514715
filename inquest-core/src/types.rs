//! Core data structures shared across the Inquest system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One ranked hit returned by the search collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Result of fetching one URL. Fetch failures are carried in the record
/// rather than as errors so that one bad URL never faults a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    pub url: String,
    pub success: bool,
    pub title: String,
    pub content: String,
    pub error: Option<String>,
}

impl FetchedPage {
    pub fn failure(url: &str, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            title: String::new(),
            content: String::new(),
            error: Some(error.into()),
        }
    }

    /// Whether the page carries text worth showing to an agent
    pub fn is_usable(&self) -> bool {
        self.success && !self.content.trim().is_empty()
    }
}

/// Tagged agent output. Models respond with either plain text or a
/// reasoning-wrapped payload; both collapse through [`AgentResponse::text`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentResponse {
    Text(String),
    Reasoning(String),
}

impl AgentResponse {
    /// Total extraction: every variant yields its text
    pub fn text(self) -> String {
        match self {
            AgentResponse::Text(text) => text,
            AgentResponse::Reasoning(text) => text,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentResponse::Text(text) => text,
            AgentResponse::Reasoning(text) => text,
        }
    }
}

/// One unit of fan-out work: a sub-query bound to a pooled worker.
/// Lives only for the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct ResearchTask {
    pub query: String,
    pub worker_index: usize,
}

/// Outcome of one dispatched research task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub query: String,
    pub text: String,
    pub ok: bool,
    pub error: Option<String>,
}

impl TaskResult {
    pub fn success(query: &str, text: String) -> Self {
        Self {
            query: query.to_string(),
            text,
            ok: true,
            error: None,
        }
    }

    pub fn failure(query: &str, error: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            text: String::new(),
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Final research output. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    /// Original research topic
    pub topic: String,
    /// Processed synthesis text with deduplicated citations
    pub synthesis: String,
    /// Human-readable summary with source statistics
    pub summary: String,
    /// Number of unique sources consulted during the run
    pub unique_source_count: usize,
    /// Every source URL touched during the run, sorted
    pub sources_used: Vec<String>,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
}

/// Progress snapshot emitted by the coordinator while a job runs
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub total: usize,
    pub completed: usize,
    pub current: Option<String>,
}

/// Callback invoked by the coordinator on progress changes. Only the
/// background unit owning a job installs one.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquestConfig {
    pub research: ResearchSettings,
    pub search: SearchSettings,
    pub fetch: FetchSettings,
    pub jobs: JobSettings,
    pub logging: crate::logging::LoggingConfig,
}

/// Coordinator and fan-out tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSettings {
    /// Minimum number of sub-queries a decomposition must produce
    pub min_subtopics: usize,
    /// Maximum number of sub-queries a decomposition may produce
    pub max_subtopics: usize,
    /// Fixed worker pool size, independent of sub-query count
    pub worker_pool_size: usize,
    /// Bounded follow-up rounds after the initial fan-out (0-2)
    pub followup_rounds: usize,
    /// Maximum follow-up sub-queries generated per round
    pub max_followup_queries: usize,
    /// Search results requested per sub-query
    pub search_count: usize,
    /// How many top search hits get their full text fetched
    pub fetch_top_results: usize,
}

/// Search collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// API key; falls back to the BRAVE_API_KEY environment variable
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Retry attempts on rate limiting
    pub max_retries: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

/// Page fetch collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    /// Extracted page text is truncated beyond this length
    pub max_content_length: usize,
}

/// Job retention policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    /// Retention after successful completion
    pub completed_ttl_secs: u64,
    /// Retention after failure
    pub failed_ttl_secs: u64,
    /// Absolute retention regardless of status
    pub max_age_secs: u64,
    /// Period of the reclamation sweep
    pub sweep_interval_secs: u64,
}
