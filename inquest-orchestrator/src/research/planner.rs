//! Topic decomposition
//!
//! The lead agent answers planning prompts in free text; the planner
//! digs the JSON array out of that text and validates it. Decomposition
//! is strict (a bad plan aborts the run), follow-up generation is
//! lenient (a bad answer just means no follow-ups).

use crate::agents::prompts;
use inquest_core::error::InquestResult;
use inquest_core::traits::Agent;
use inquest_core::types::{ResearchSettings, TaskResult};
use inquest_core::validation_error;
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn json_array_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[(?:\s*"[^"]*"\s*,?\s*)+\]"#).unwrap())
}

/// Pull the last JSON string-array out of free text. Models often emit
/// preamble or a fenced block; the last match is the actual answer.
fn extract_json_array(text: &str) -> Option<&str> {
    json_array_regex()
        .find_iter(text)
        .last()
        .map(|m| m.as_str())
}

fn parse_string_array(raw: &str) -> Option<Vec<String>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            serde_json::Value::String(s) => out.push(s),
            _ => return None,
        }
    }
    Some(out)
}

pub struct ResearchPlanner {
    lead: Arc<dyn Agent>,
    settings: ResearchSettings,
}

impl ResearchPlanner {
    pub fn new(lead: Arc<dyn Agent>, settings: ResearchSettings) -> Self {
        Self { lead, settings }
    }

    /// Break `topic` into validated sub-queries.
    ///
    /// The plan is rejected, never repaired: anything other than 2-5
    /// (per settings) non-empty strings is a validation error carrying
    /// the raw response for diagnosis.
    pub async fn decompose(&self, topic: &str) -> InquestResult<Vec<String>> {
        let response = self
            .lead
            .ask(&prompts::decomposition_prompt(topic))
            .await?
            .text();

        let raw = extract_json_array(&response).ok_or_else(|| {
            validation_error!(
                format!(
                    "No JSON array found in decomposition response for topic '{}'. Full response: {}",
                    topic, response
                ),
                "subtopics",
                "planner"
            )
        })?;

        let subtopics = parse_string_array(raw).ok_or_else(|| {
            validation_error!(
                format!(
                    "Decomposition for topic '{}' is not an array of strings: {}",
                    topic, raw
                ),
                "subtopics",
                "planner"
            )
        })?;

        let min = self.settings.min_subtopics;
        let max = self.settings.max_subtopics;
        if subtopics.len() < min || subtopics.len() > max {
            return Err(validation_error!(
                format!(
                    "Decomposition for topic '{}' produced {} subtopics, expected {}-{}",
                    topic,
                    subtopics.len(),
                    min,
                    max
                ),
                "subtopics",
                "planner"
            ));
        }

        let cleaned: Vec<String> = subtopics
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect();
        if cleaned.iter().any(|s| s.is_empty()) {
            return Err(validation_error!(
                format!("Decomposition for topic '{}' contains an empty subtopic", topic),
                "subtopics",
                "planner"
            ));
        }

        debug!(topic = topic, count = cleaned.len(), "Topic decomposed");
        Ok(cleaned)
    }

    /// Ask for gap-filling follow-up queries. Malformed answers are
    /// treated as "no follow-ups"; only the agent call itself can fail.
    pub async fn followup_queries(
        &self,
        topic: &str,
        results: &[TaskResult],
    ) -> InquestResult<Vec<String>> {
        let max = self.settings.max_followup_queries;
        if max == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .lead
            .ask(&prompts::followup_prompt(topic, results, max))
            .await?
            .text();

        let queries = match extract_json_array(&response).and_then(parse_string_array) {
            Some(queries) => queries,
            None => {
                warn!(
                    topic = topic,
                    "Follow-up response had no parsable query list, skipping round"
                );
                return Ok(Vec::new());
            }
        };

        let mut cleaned: Vec<String> = queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        cleaned.truncate(max);
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inquest_core::types::AgentResponse;

    struct ScriptedAgent {
        reply: String,
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn ask(&self, _prompt: &str) -> InquestResult<AgentResponse> {
            Ok(AgentResponse::Text(self.reply.clone()))
        }
    }

    fn planner(reply: &str) -> ResearchPlanner {
        ResearchPlanner::new(
            Arc::new(ScriptedAgent {
                reply: reply.to_string(),
            }),
            ResearchSettings::default(),
        )
    }

    #[test]
    fn extraction_takes_the_last_array() {
        let text = r#"Here is an example: ["not", "this"]. My answer: ["a", "b", "c"]"#;
        assert_eq!(extract_json_array(text), Some(r#"["a", "b", "c"]"#));
    }

    #[test]
    fn extraction_handles_fenced_blocks() {
        let text = "```json\n[\"one\", \"two\"]\n```";
        let raw = extract_json_array(text).unwrap();
        assert_eq!(parse_string_array(raw).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn non_string_elements_are_rejected() {
        assert!(parse_string_array(r#"["a", "2"]"#).is_some());
        assert!(parse_string_array(r#"[1, 2]"#).is_none());
    }

    #[tokio::test]
    async fn decompose_accepts_a_valid_plan() {
        let planner = planner(r#"Sure! ["History of X", "Applications of X", "Risks of X"]"#);
        let subtopics = planner.decompose("X").await.unwrap();
        assert_eq!(subtopics.len(), 3);
        assert_eq!(subtopics[0], "History of X");
    }

    #[tokio::test]
    async fn decompose_rejects_too_many_subtopics() {
        let planner = planner(r#"["a", "b", "c", "d", "e", "f"]"#);
        assert!(planner.decompose("X").await.is_err());
    }

    #[tokio::test]
    async fn decompose_rejects_prose_without_an_array() {
        let planner = planner("I would research the history and the applications.");
        let err = planner.decompose("X").await.unwrap_err();
        assert!(err.to_string().contains("Validation"));
    }

    #[tokio::test]
    async fn decompose_rejects_empty_subtopic_strings() {
        let planner = planner(r#"["valid", "   "]"#);
        assert!(planner.decompose("X").await.is_err());
    }

    #[tokio::test]
    async fn followups_are_lenient_and_capped() {
        let planner = planner(r#"["q1", "q2", "q3", "q4", "q5"]"#);
        let queries = planner.followup_queries("X", &[]).await.unwrap();
        assert_eq!(queries.len(), 3);

        let planner = self::planner("no gaps remain");
        let queries = planner.followup_queries("X", &[]).await.unwrap();
        assert!(queries.is_empty());
    }
}
