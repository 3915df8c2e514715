//! Async job tracking
//!
//! Research runs execute in the background; callers get a job id back
//! immediately and poll for status, progress, and the final report.

pub mod manager;
pub mod progress;
pub mod store;

pub use manager::JobManager;
pub use store::JobStore;

use chrono::{DateTime, Utc};
use inquest_core::types::ResearchReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal jobs never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Progress of a running job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub total: usize,
    pub completed: usize,
    /// Sub-query most recently finished
    pub current: Option<String>,
    /// Estimated seconds remaining, absent until measurable
    pub eta_secs: Option<u64>,
}

/// One tracked research job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub topic: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: Option<JobProgress>,
    pub result: Option<ResearchReport>,
    pub error: Option<String>,
}

/// Listing view of a job, without the payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub topic: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            topic: job.topic.clone(),
            status: job.status,
            created_at: job.created_at,
        }
    }
}
