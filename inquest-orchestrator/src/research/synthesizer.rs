//! Master synthesis
//!
//! Merges the successful task results into one report via the lead
//! agent. Synthesis failure is fatal to the run; there is no partial
//! report to fall back on.

use crate::agents::prompts;
use inquest_core::error::InquestResult;
use inquest_core::traits::Agent;
use inquest_core::types::TaskResult;
use std::sync::Arc;
use tracing::info;

pub struct ResearchSynthesizer {
    lead: Arc<dyn Agent>,
}

impl ResearchSynthesizer {
    pub fn new(lead: Arc<dyn Agent>) -> Self {
        Self { lead }
    }

    pub async fn synthesize(&self, topic: &str, results: &[TaskResult]) -> InquestResult<String> {
        let successful = results.iter().filter(|r| r.ok).count();
        info!(
            topic = topic,
            successful = successful,
            failed = results.len() - successful,
            "Synthesizing research results"
        );

        let response = self
            .lead
            .ask(&prompts::synthesis_prompt(topic, results))
            .await?;
        Ok(response.text())
    }
}
