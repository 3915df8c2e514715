//! Final report assembly
//!
//! Post-processes the synthesized text (citation consolidation plus an
//! appendix of uncited sources) and packages it into a report.

use super::citation::{CitationProcessor, DeduplicationResult};
use super::source_tracker::SourceTracker;
use chrono::Utc;
use inquest_core::types::ResearchReport;
use tracing::info;

const TRUNCATION_HEADER: &str = "## Additional Research Sources";

pub struct ResultFormatter;

impl ResultFormatter {
    /// Append an appendix listing consulted-but-uncited sources. A run
    /// with nothing uncited gets no appendix.
    pub fn append_additional_sources(synthesis: &str, tracker: &SourceTracker) -> String {
        let additional = tracker.additional_sources(synthesis);
        if additional.is_empty() {
            return synthesis.to_string();
        }

        let mut out = String::with_capacity(synthesis.len() + additional.len() * 48);
        out.push_str(synthesis.trim_end());
        out.push_str("\n\n");
        out.push_str(TRUNCATION_HEADER);
        out.push_str("\n\nThe following sources were consulted during research but not directly cited above:\n\n");
        for url in &additional {
            out.push_str("- ");
            out.push_str(url);
            out.push('\n');
        }
        out.push_str(&format!("\nAdditional sources: {}", additional.len()));
        out
    }

    /// Full post-processing pipeline: deduplicate citations, append the
    /// uncited-source appendix, and close with the consultation tally.
    pub fn process_synthesis(
        synthesis: &str,
        tracker: &SourceTracker,
    ) -> (String, DeduplicationResult) {
        let dedup = CitationProcessor::deduplicate_citation_urls(synthesis);
        let with_appendix = Self::append_additional_sources(&dedup.updated_text, tracker);

        let stats = tracker.statistics(&dedup.updated_text);
        let processed = if stats.additional > 0 {
            format!(
                "{} | Total sources consulted: {}",
                with_appendix, stats.total
            )
        } else if stats.total > 0 {
            format!(
                "{}\n\nTotal sources consulted: {}",
                with_appendix.trim_end(),
                stats.total
            )
        } else {
            with_appendix
        };

        info!(
            cited = stats.cited,
            additional = stats.additional,
            total = stats.total,
            deduplicated = dedup.deduplicated_count,
            "Post-processed synthesis"
        );

        (processed, dedup)
    }

    /// Build the immutable report for a finished run
    pub fn build_report(topic: &str, synthesis: &str, tracker: &SourceTracker) -> ResearchReport {
        let (processed, dedup) = Self::process_synthesis(synthesis, tracker);
        let stats = tracker.statistics(&processed);

        let summary = format!(
            "Research on '{}' drew on {} unique sources ({} cited, {} additional); \
             {} duplicate citations were consolidated.",
            topic, stats.total, stats.cited, stats.additional, dedup.deduplicated_count
        );

        ResearchReport {
            topic: topic.to_string(),
            synthesis: processed,
            summary,
            unique_source_count: stats.total,
            sources_used: tracker.all(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesis() -> &'static str {
        concat!(
            "Finding [1]. Repeat [2].\n",
            "\n",
            "## Sources\n",
            "\n",
            "[1] A – \"Entry\" – https://a.org/y\n",
            "[2] A – \"Entry dup\" – https://a.org/y/\n",
        )
    }

    #[test]
    fn no_uncited_sources_means_no_appendix() {
        let tracker = SourceTracker::new();
        tracker.add("https://a.org/y");
        let out = ResultFormatter::append_additional_sources(synthesis(), &tracker);
        assert!(!out.contains("Additional Research Sources"));
    }

    #[test]
    fn appendix_lists_uncited_sources() {
        let tracker = SourceTracker::new();
        tracker.add_many(["https://a.org/y", "https://b.org/x", "https://c.net/z"]);
        let out = ResultFormatter::append_additional_sources(synthesis(), &tracker);
        assert!(out.contains("## Additional Research Sources"));
        assert!(out.contains("- https://b.org/x"));
        assert!(out.contains("- https://c.net/z"));
        assert!(out.contains("Additional sources: 2"));
        assert!(!out.contains("- https://a.org/y"));
    }

    #[test]
    fn process_synthesis_dedupes_and_tallies() {
        let tracker = SourceTracker::new();
        tracker.add_many(["https://a.org/y", "https://b.org/x"]);
        let (processed, dedup) = ResultFormatter::process_synthesis(synthesis(), &tracker);
        assert_eq!(dedup.deduplicated_count, 1);
        assert_eq!(dedup.final_count, 1);
        assert!(processed.contains("Finding [1]. Repeat [1]."));
        assert!(processed.contains("Total sources consulted: 2"));
    }

    #[test]
    fn report_carries_sorted_sources_and_counts() {
        let tracker = SourceTracker::new();
        tracker.add_many(["https://b.org/x", "https://a.org/y"]);
        let report = ResultFormatter::build_report("test topic", synthesis(), &tracker);
        assert_eq!(report.topic, "test topic");
        assert_eq!(report.unique_source_count, 2);
        assert_eq!(
            report.sources_used,
            vec!["https://a.org/y".to_string(), "https://b.org/x".to_string()]
        );
        assert!(report.summary.contains("2 unique sources"));
        assert!(report.summary.contains("1 duplicate citations"));
    }
}
