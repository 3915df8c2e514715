//! Job state storage
//!
//! In-memory job map with forward-only status transitions. Methods are
//! synchronous so the coordinator's progress callback can write without
//! an async hop; no lock is ever held across an await point.

use super::progress::estimate_remaining;
use super::{Job, JobProgress, JobStatus, JobSummary};
use chrono::{DateTime, Utc};
use inquest_core::error::{InquestError, InquestResult};
use inquest_core::not_found_error;
use inquest_core::types::{JobSettings, ResearchReport};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

fn invalid_transition(id: &str, from: JobStatus, to: JobStatus) -> InquestError {
    InquestError::Job {
        message: format!("Job {} cannot move from {:?} to {:?}", id, from, to),
        context: inquest_core::ErrorContext::new("job_store").with_operation("transition"),
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending job and return its id
    pub fn create(&self, topic: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let job = Job {
            id: id.clone(),
            topic: topic.to_string(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            progress: None,
            result: None,
            error: None,
        };
        self.jobs.write().unwrap().insert(id.clone(), job);
        info!(job_id = %id, topic = topic, "Job created");
        id
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().unwrap().get(id).cloned()
    }

    pub fn list(&self) -> Vec<JobSummary> {
        let mut summaries: Vec<JobSummary> = self
            .jobs
            .read()
            .unwrap()
            .values()
            .map(JobSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Pending -> InProgress
    pub fn mark_in_progress(&self, id: &str) -> InquestResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| not_found_error!(format!("job {}", id), "job_store"))?;
        if job.status != JobStatus::Pending {
            return Err(invalid_transition(id, job.status, JobStatus::InProgress));
        }
        job.status = JobStatus::InProgress;
        job.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record progress on a running job. Updates on jobs in any other
    /// state are ignored; a late callback must not disturb a terminal
    /// job.
    pub fn update_progress(&self, id: &str, total: usize, completed: usize, current: Option<String>) {
        let mut jobs = self.jobs.write().unwrap();
        let job = match jobs.get_mut(id) {
            Some(job) if job.status == JobStatus::InProgress => job,
            _ => return,
        };

        let completed = completed.min(total);
        let eta_secs = job.started_at.and_then(|started| {
            estimate_remaining(started, total, completed, Utc::now())
                .map(|eta| eta.num_seconds().max(0) as u64)
        });
        job.progress = Some(JobProgress {
            total,
            completed,
            current,
            eta_secs,
        });
        debug!(job_id = id, completed = completed, total = total, "Job progress");
    }

    /// InProgress -> Completed, attaching the report
    pub fn complete(&self, id: &str, report: ResearchReport) -> InquestResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| not_found_error!(format!("job {}", id), "job_store"))?;
        if job.status != JobStatus::InProgress {
            return Err(invalid_transition(id, job.status, JobStatus::Completed));
        }
        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        job.result = Some(report);
        info!(job_id = id, "Job completed");
        Ok(())
    }

    /// InProgress -> Failed, attaching the error message
    pub fn fail(&self, id: &str, error: &str) -> InquestResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| not_found_error!(format!("job {}", id), "job_store"))?;
        if job.status != JobStatus::InProgress {
            return Err(invalid_transition(id, job.status, JobStatus::Failed));
        }
        job.status = JobStatus::Failed;
        job.completed_at = Some(Utc::now());
        job.error = Some(error.to_string());
        info!(job_id = id, error = error, "Job failed");
        Ok(())
    }

    /// Drop jobs past their retention window. Completed jobs expire
    /// after their TTL, failed jobs sooner, and everything has an
    /// absolute age cap.
    pub fn sweep(&self, now: DateTime<Utc>, settings: &JobSettings) -> usize {
        let mut jobs = self.jobs.write().unwrap();
        let before = jobs.len();
        jobs.retain(|_, job| {
            let age = now.signed_duration_since(job.created_at).num_seconds();
            if age > settings.max_age_secs as i64 {
                return false;
            }
            if let Some(completed_at) = job.completed_at {
                let since = now.signed_duration_since(completed_at).num_seconds();
                match job.status {
                    JobStatus::Completed => since <= settings.completed_ttl_secs as i64,
                    JobStatus::Failed => since <= settings.failed_ttl_secs as i64,
                    _ => true,
                }
            } else {
                true
            }
        });
        let removed = before - jobs.len();
        if removed > 0 {
            info!(removed = removed, remaining = jobs.len(), "Swept expired jobs");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn report(topic: &str) -> ResearchReport {
        ResearchReport {
            topic: topic.to_string(),
            synthesis: "text".to_string(),
            summary: "summary".to_string(),
            unique_source_count: 0,
            sources_used: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn lifecycle_happy_path() {
        let store = JobStore::new();
        let id = store.create("topic");

        assert_eq!(store.get(&id).unwrap().status, JobStatus::Pending);
        store.mark_in_progress(&id).unwrap();
        assert!(store.get(&id).unwrap().started_at.is_some());

        store.update_progress(&id, 4, 1, Some("subtopic".to_string()));
        let progress = store.get(&id).unwrap().progress.unwrap();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 4);

        store.complete(&id, report("topic")).unwrap();
        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.result.is_some());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn repeated_reads_of_a_terminal_job_are_identical() {
        let store = JobStore::new();
        let id = store.create("topic");
        store.mark_in_progress(&id).unwrap();
        store.complete(&id, report("topic")).unwrap();

        let first = store.get(&id).unwrap();
        store.update_progress(&id, 9, 9, None);
        let second = store.get(&id).unwrap();
        assert_eq!(first.status, second.status);
        assert!(second.progress.is_none());
        assert_eq!(
            first.result.as_ref().unwrap().synthesis,
            second.result.as_ref().unwrap().synthesis
        );
    }

    #[test]
    fn terminal_jobs_reject_further_transitions() {
        let store = JobStore::new();
        let id = store.create("topic");
        store.mark_in_progress(&id).unwrap();
        store.fail(&id, "boom").unwrap();

        assert!(store.complete(&id, report("topic")).is_err());
        assert!(store.fail(&id, "again").is_err());
        assert!(store.mark_in_progress(&id).is_err());
        assert_eq!(store.get(&id).unwrap().error.as_deref(), Some("boom"));
    }

    #[test]
    fn completion_requires_a_running_job() {
        let store = JobStore::new();
        let id = store.create("topic");
        assert!(store.complete(&id, report("topic")).is_err());
        assert!(store.fail(&id, "err").is_err());
    }

    #[test]
    fn progress_is_clamped_to_total() {
        let store = JobStore::new();
        let id = store.create("topic");
        store.mark_in_progress(&id).unwrap();
        store.update_progress(&id, 3, 7, None);
        assert_eq!(store.get(&id).unwrap().progress.unwrap().completed, 3);
    }

    #[test]
    fn sweep_honors_per_status_ttls() {
        let store = JobStore::new();
        let settings = JobSettings::default();

        let done = store.create("done");
        store.mark_in_progress(&done).unwrap();
        store.complete(&done, report("done")).unwrap();

        let failed = store.create("failed");
        store.mark_in_progress(&failed).unwrap();
        store.fail(&failed, "boom").unwrap();

        let running = store.create("running");
        store.mark_in_progress(&running).unwrap();

        // 30 minutes on: failed is past its 10 minute TTL, completed is not
        let now = Utc::now() + Duration::seconds(30 * 60);
        assert_eq!(store.sweep(now, &settings), 1);
        assert!(store.get(&failed).is_none());
        assert!(store.get(&done).is_some());

        // 2 hours on: completed expires too
        let now = Utc::now() + Duration::seconds(2 * 60 * 60);
        assert_eq!(store.sweep(now, &settings), 1);
        assert!(store.get(&done).is_none());
        assert!(store.get(&running).is_some());

        // Past the absolute cap everything goes
        let now = Utc::now() + Duration::seconds(25 * 60 * 60);
        assert_eq!(store.sweep(now, &settings), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn list_is_newest_first() {
        let store = JobStore::new();
        let a = store.create("first");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = store.create("second");

        let listing = store.list();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id, b);
        assert_eq!(listing[1].id, a);
    }
}
