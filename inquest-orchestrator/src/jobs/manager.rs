//! Background job execution
//!
//! Owns the store, runs each accepted topic on a spawned task, and
//! periodically sweeps expired jobs.

use super::store::JobStore;
use super::{Job, JobSummary};
use crate::research::ResearchCoordinator;
use chrono::Utc;
use inquest_core::types::{JobSettings, ProgressCallback, ProgressUpdate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct JobManager {
    store: Arc<JobStore>,
    coordinator: Arc<ResearchCoordinator>,
}

impl JobManager {
    /// Create a manager and start its retention sweep. Must be called
    /// from within a tokio runtime.
    pub fn new(coordinator: Arc<ResearchCoordinator>, settings: JobSettings) -> Self {
        let store = Arc::new(JobStore::new());

        let sweep_store = store.clone();
        let interval = Duration::from_secs(settings.sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                sweep_store.sweep(Utc::now(), &settings);
            }
        });

        Self { store, coordinator }
    }

    /// Accept a topic and return the job id immediately; the research
    /// run proceeds in the background.
    pub fn create_job(&self, topic: &str) -> String {
        let id = self.store.create(topic);

        let store = self.store.clone();
        let coordinator = self.coordinator.clone();
        let job_id = id.clone();
        let topic = topic.to_string();

        tokio::spawn(async move {
            Self::execute(store, coordinator, job_id, topic).await;
        });

        id
    }

    async fn execute(
        store: Arc<JobStore>,
        coordinator: Arc<ResearchCoordinator>,
        job_id: String,
        topic: String,
    ) {
        if let Err(err) = store.mark_in_progress(&job_id) {
            error!(job_id = %job_id, error = %err, "Failed to start job");
            return;
        }

        let progress_store = store.clone();
        let progress_id = job_id.clone();
        let progress: ProgressCallback = Arc::new(move |update: ProgressUpdate| {
            progress_store.update_progress(
                &progress_id,
                update.total,
                update.completed,
                update.current,
            );
        });

        match coordinator.run(&topic, Some(progress)).await {
            Ok(report) => {
                if let Err(err) = store.complete(&job_id, report) {
                    error!(job_id = %job_id, error = %err, "Failed to record completion");
                }
            }
            Err(err) => {
                err.log();
                if let Err(store_err) = store.fail(&job_id, &err.to_string()) {
                    error!(job_id = %job_id, error = %store_err, "Failed to record failure");
                }
            }
        }
        info!(job_id = %job_id, "Job finished");
    }

    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.store.get(id)
    }

    pub fn list_jobs(&self) -> Vec<JobSummary> {
        self.store.list()
    }

    pub fn store(&self) -> Arc<JobStore> {
        self.store.clone()
    }
}
