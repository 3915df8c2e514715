//! Research run coordination
//!
//! Drives one topic end to end: decompose, fan the sub-queries out
//! across the agent pool, optionally run follow-up rounds, then
//! synthesize and post-process into a report. Leaf failures degrade the
//! run; only decomposition, synthesis, or a fully failed fan-out abort
//! it.

use crate::agents::{prompts, AgentPool};
use crate::processing::{ResultFormatter, SourceTracker};
use crate::research::planner::ResearchPlanner;
use crate::research::synthesizer::ResearchSynthesizer;
use inquest_core::error::{ErrorContext, InquestError, InquestResult};
use inquest_core::logging::performance::measure_async;
use inquest_core::traits::{Agent, ContentFetcher, SearchProvider};
use inquest_core::types::{
    ProgressCallback, ProgressUpdate, ResearchReport, ResearchSettings, ResearchTask, TaskResult,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub struct ResearchCoordinator {
    planner: ResearchPlanner,
    synthesizer: ResearchSynthesizer,
    pool: Arc<AgentPool>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ContentFetcher>,
    settings: ResearchSettings,
}

/// Progress bookkeeping local to one run. The coordinator is the only
/// writer; tasks report back through the join loop.
struct ProgressState {
    total: usize,
    completed: usize,
    callback: Option<ProgressCallback>,
}

impl ProgressState {
    fn emit(&self, current: Option<String>) {
        if let Some(callback) = &self.callback {
            callback(ProgressUpdate {
                total: self.total,
                completed: self.completed,
                current,
            });
        }
    }
}

impl ResearchCoordinator {
    pub fn new(
        lead: Arc<dyn Agent>,
        pool: AgentPool,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn ContentFetcher>,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            planner: ResearchPlanner::new(lead.clone(), settings.clone()),
            synthesizer: ResearchSynthesizer::new(lead),
            pool: Arc::new(pool),
            search,
            fetcher,
            settings,
        }
    }

    /// Run a full research workflow for `topic`. Every fatal error is
    /// wrapped with the topic it belonged to.
    pub async fn run(
        &self,
        topic: &str,
        progress: Option<ProgressCallback>,
    ) -> InquestResult<ResearchReport> {
        self.run_inner(topic, progress)
            .await
            .map_err(|err| err.into_workflow(topic))
    }

    async fn run_inner(
        &self,
        topic: &str,
        progress: Option<ProgressCallback>,
    ) -> InquestResult<ResearchReport> {
        let tracker = Arc::new(SourceTracker::new());

        let subtopics = self.planner.decompose(topic).await?;
        info!(topic = topic, subtopics = subtopics.len(), "Research plan ready");

        let mut state = ProgressState {
            total: subtopics.len(),
            completed: 0,
            callback: progress,
        };
        state.emit(None);

        // Worker assignment continues across rounds so follow-up tasks
        // keep rotating through the pool.
        let mut dispatched = 0usize;
        let mut results =
            self.run_round(topic, &subtopics, &mut dispatched, &tracker, &mut state)
                .await;

        for round in 0..self.settings.followup_rounds {
            let queries = match self.planner.followup_queries(topic, &results).await {
                Ok(queries) => queries,
                Err(err) => {
                    warn!(
                        topic = topic,
                        round = round,
                        error = %err,
                        "Follow-up planning failed, continuing with current findings"
                    );
                    break;
                }
            };
            if queries.is_empty() {
                break;
            }

            info!(topic = topic, round = round, queries = queries.len(), "Follow-up round");
            state.total += queries.len();
            state.emit(None);

            let round_results = self
                .run_round(topic, &queries, &mut dispatched, &tracker, &mut state)
                .await;
            results.extend(round_results);
        }

        if results.iter().all(|r| !r.ok) {
            return Err(InquestError::Internal {
                message: format!(
                    "All {} research tasks failed, nothing to synthesize",
                    results.len()
                ),
                source: None,
                context: ErrorContext::new("coordinator")
                    .with_operation("fan_out")
                    .with_suggestion("Check search provider credentials and agent availability"),
            });
        }

        let synthesis = measure_async(
            "synthesis",
            self.synthesizer.synthesize(topic, &results),
        )
        .await?;

        let report = ResultFormatter::build_report(topic, &synthesis, &tracker);
        info!(
            topic = topic,
            sources = report.unique_source_count,
            "Research run complete"
        );
        Ok(report)
    }

    /// Fan one batch of queries out over the pool and collect results
    /// in input order. A panicked task becomes a failed result.
    async fn run_round(
        &self,
        topic: &str,
        queries: &[String],
        dispatched: &mut usize,
        tracker: &Arc<SourceTracker>,
        state: &mut ProgressState,
    ) -> Vec<TaskResult> {
        let mut join_set = JoinSet::new();

        for (idx, query) in queries.iter().enumerate() {
            let task = ResearchTask {
                query: query.clone(),
                worker_index: *dispatched % self.pool.len(),
            };
            *dispatched += 1;

            let topic = topic.to_string();
            let pool = self.pool.clone();
            let search = self.search.clone();
            let fetcher = self.fetcher.clone();
            let tracker = tracker.clone();
            let settings = self.settings.clone();

            join_set.spawn(async move {
                let result =
                    Self::research_one(&topic, task, pool, search, fetcher, tracker, &settings)
                        .await;
                (idx, result)
            });
        }

        let mut slots: Vec<Option<TaskResult>> = vec![None; queries.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    state.completed += 1;
                    state.emit(Some(result.query.clone()));
                    slots[idx] = Some(result);
                }
                Err(join_err) => {
                    warn!(error = %join_err, "Research task panicked");
                    state.completed += 1;
                    state.emit(None);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| TaskResult::failure(&queries[idx], "task panicked"))
            })
            .collect()
    }

    /// One leaf task: search, track sources, fetch the top hits, and
    /// hand the package to a pooled agent. Never propagates an error;
    /// failures come back as failed results.
    async fn research_one(
        topic: &str,
        task: ResearchTask,
        pool: Arc<AgentPool>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn ContentFetcher>,
        tracker: Arc<SourceTracker>,
        settings: &ResearchSettings,
    ) -> TaskResult {
        let query = task.query.as_str();
        // Anchor the sub-query in its topic so searches stay on subject
        let contextual_query = format!("{} {}", topic, query);

        let results = match search.search(&contextual_query, settings.search_count).await {
            Ok(results) => results,
            Err(err) => {
                warn!(query = query, error = %err, "Search failed for sub-query");
                return TaskResult::failure(query, format!("search failed: {}", err));
            }
        };

        tracker.add_many(results.iter().map(|r| r.url.as_str()));

        let top_urls: Vec<String> = results
            .iter()
            .take(settings.fetch_top_results)
            .map(|r| r.url.clone())
            .collect();
        let pages = fetcher.fetch_batch(&top_urls).await;

        let prompt = prompts::research_prompt(query, &results, &pages);
        match pool.ask(task.worker_index, &prompt).await {
            Ok(response) => TaskResult::success(query, response.text()),
            Err(err) => {
                warn!(query = query, error = %err, "Agent failed for sub-query");
                TaskResult::failure(query, format!("agent failed: {}", err))
            }
        }
    }
}
