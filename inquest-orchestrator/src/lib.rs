//! Inquest Orchestrator
//!
//! Parallel deep-research orchestration: a lead agent decomposes a
//! topic into sub-queries, a fixed pool of research agents works them
//! concurrently against live search and page content, and the merged
//! synthesis gets its citations deduplicated and renumbered into one
//! consistent bibliography. Runs execute as background jobs polled by
//! id.

pub mod agents;
pub mod jobs;
pub mod processing;
pub mod research;
pub mod web;

pub use agents::AgentPool;
pub use jobs::{Job, JobManager, JobStatus, JobStore, JobSummary};
pub use processing::{CitationProcessor, ResultFormatter, SourceTracker};
pub use research::ResearchCoordinator;
pub use web::{BraveSearchClient, PageFetcher, SearchResultCache};

pub use inquest_core;
