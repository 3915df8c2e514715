//! Prompt builders for the lead agent and research workers

use inquest_core::types::{FetchedPage, SearchResultItem, TaskResult};

/// Ask the lead agent to break a topic into focused sub-queries.
/// The response must be a bare JSON array of strings.
pub fn decomposition_prompt(topic: &str) -> String {
    format!(
        r#"As a lead researcher, break down the topic "{topic}" into 2-5 specific subtopics that would provide comprehensive coverage of the subject.

Each subtopic should be:
- Specific and focused
- Researchable with web searches
- Complementary to the other subtopics
- Contributing to a complete understanding of the main topic

Return ONLY a JSON list of subtopic strings, nothing else.
Example format: ["Subtopic 1", "Subtopic 2", "Subtopic 3"]"#
    )
}

/// Research prompt for one worker: the sub-query plus numbered search
/// results and any fetched page text. The worker must cite by number.
pub fn research_prompt(
    query: &str,
    results: &[SearchResultItem],
    pages: &[FetchedPage],
) -> String {
    let mut sources = String::new();
    if results.is_empty() {
        sources.push_str("No search results available.\n");
    } else {
        for (i, result) in results.iter().enumerate() {
            sources.push_str(&format!(
                "[{}] **{}**\n    URL: {}\n    Description: {}\n\n",
                i + 1,
                result.title,
                result.url,
                result.snippet
            ));
        }
    }

    let mut page_text = String::new();
    for page in pages.iter().filter(|p| p.is_usable()) {
        page_text.push_str(&format!(
            "--- Page content from {} ---\n{}\n\n",
            page.url, page.content
        ));
    }
    if page_text.is_empty() {
        page_text.push_str("No page content could be fetched; rely on the result descriptions.\n");
    }

    format!(
        r#"Research the topic: "{query}"

Based on these search results:
{sources}
Fetched page content:
{page_text}
Provide a comprehensive research summary. Requirements:
- Use only information from the provided sources
- Cite every factual claim by source number, e.g. [1], [2]
- Keep the summary factual and concise
- End with a numbered list of the sources you actually used, one per line:
  [1] Site Name – "Page Title" – https://full.url.here"#
    )
}

/// Ask the lead agent for gap-filling follow-up queries after reviewing
/// the findings so far. The response must be a bare JSON array; an
/// empty array means nothing is missing.
pub fn followup_prompt(topic: &str, results: &[TaskResult], max_queries: usize) -> String {
    let mut findings = String::new();
    for result in results.iter().filter(|r| r.ok) {
        findings.push_str(&format!(
            "SUBTOPIC: {}\n{}\n\n",
            result.query, result.text
        ));
    }

    format!(
        r#"You are the lead researcher for the topic "{topic}".

Findings gathered so far:

{findings}
Identify the most important gaps left by these findings. Propose at most {max_queries} follow-up search queries that would fill them.

Return ONLY a JSON list of query strings, nothing else. Return [] if the coverage is already sufficient."#
    )
}

/// Master synthesis prompt combining every successful task result. The
/// bibliography contract here is what the citation processor parses.
pub fn synthesis_prompt(topic: &str, results: &[TaskResult]) -> String {
    let successful: Vec<&TaskResult> = results.iter().filter(|r| r.ok).collect();

    let mut findings = String::new();
    for result in &successful {
        findings.push_str(&format!(
            "SUBTOPIC: {}\n{}\n\n",
            result.query, result.text
        ));
    }

    format!(
        r###"Write a master synthesis report for: {topic}

Research data from {count} subtopics:

{findings}
Output format:

# Comprehensive Research Report: {topic}

## Executive Summary
[Combine key findings from all subtopics - 3-4 sentences]

## Key Findings by Area
[One subsection per subtopic with the main findings]

## Conclusion
[Overall summary - 2-3 sentences]

## Sources

[1] Site Name – "Page Title" – https://full.url.here
[2] Site Name – "Page Title" – https://full.url.here

Requirements:
- Use only provided research content
- Cite every factual claim with its source number [1], [2], ...
- The Sources section must list one citation per line in exactly the format shown, with the full URL
- Leave one blank line after the "## Sources" heading and none between citation lines
- Combine information, don't repeat it
- Use factual language only"###,
        count = successful.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_prompt_numbers_sources_from_one() {
        let results = vec![
            SearchResultItem {
                title: "First".to_string(),
                url: "https://a.org".to_string(),
                snippet: "about a".to_string(),
            },
            SearchResultItem {
                title: "Second".to_string(),
                url: "https://b.org".to_string(),
                snippet: "about b".to_string(),
            },
        ];
        let prompt = research_prompt("test query", &results, &[]);
        assert!(prompt.contains("[1] **First**"));
        assert!(prompt.contains("[2] **Second**"));
        assert!(prompt.contains("No page content could be fetched"));
    }

    #[test]
    fn research_prompt_includes_usable_pages_only() {
        let pages = vec![
            FetchedPage {
                url: "https://a.org".to_string(),
                success: true,
                title: "A".to_string(),
                content: "body text".to_string(),
                error: None,
            },
            FetchedPage::failure("https://b.org", "timed out"),
        ];
        let prompt = research_prompt("q", &[], &pages);
        assert!(prompt.contains("Page content from https://a.org"));
        assert!(!prompt.contains("Page content from https://b.org"));
    }

    #[test]
    fn synthesis_prompt_skips_failed_tasks() {
        let results = vec![
            TaskResult::success("alpha", "alpha findings".to_string()),
            TaskResult::failure("beta", "search failed"),
        ];
        let prompt = synthesis_prompt("topic", &results);
        assert!(prompt.contains("SUBTOPIC: alpha"));
        assert!(!prompt.contains("SUBTOPIC: beta"));
        assert!(prompt.contains("Research data from 1 subtopics"));
    }
}
