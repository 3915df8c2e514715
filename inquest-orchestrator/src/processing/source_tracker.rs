//! Run-scoped source tracking
//!
//! Every URL a research run touches, cited or not, is recorded here so
//! the final report can account for the full set of consulted sources.

use super::citation::CitationProcessor;
use std::collections::BTreeSet;
use std::sync::RwLock;

/// Source usage breakdown for one research run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatistics {
    pub total: usize,
    /// Sources that appear in the synthesis bibliography
    pub cited: usize,
    /// Consulted sources the synthesis never cited
    pub additional: usize,
}

impl SourceStatistics {
    /// Fraction of consulted sources that made it into the bibliography
    pub fn citation_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cited as f64 / self.total as f64
        }
    }
}

/// Append-only union of normalized source URLs. Shared across the
/// concurrent leaf tasks of one run; one instance per run, never reused.
#[derive(Debug, Default)]
pub struct SourceTracker {
    urls: RwLock<BTreeSet<String>>,
}

impl SourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one consulted URL. Duplicates (after normalization) are
    /// absorbed silently.
    pub fn add(&self, url: &str) {
        let normalized = CitationProcessor::normalize_url(url);
        if normalized.is_empty() {
            return;
        }
        self.urls.write().unwrap().insert(normalized);
    }

    pub fn add_many<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut guard = self.urls.write().unwrap();
        for url in urls {
            let normalized = CitationProcessor::normalize_url(url.as_ref());
            if !normalized.is_empty() {
                guard.insert(normalized);
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        let normalized = CitationProcessor::normalize_url(url);
        self.urls.read().unwrap().contains(&normalized)
    }

    pub fn len(&self) -> usize {
        self.urls.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.read().unwrap().is_empty()
    }

    /// Every tracked URL, sorted
    pub fn all(&self) -> Vec<String> {
        self.urls.read().unwrap().iter().cloned().collect()
    }

    /// Tracked URLs that the given synthesis does not cite, sorted
    pub fn additional_sources(&self, synthesis: &str) -> Vec<String> {
        let cited: BTreeSet<String> =
            CitationProcessor::cited_urls(synthesis).into_iter().collect();
        self.urls
            .read()
            .unwrap()
            .iter()
            .filter(|url| !cited.contains(*url))
            .cloned()
            .collect()
    }

    /// Partition tracked sources against a synthesis. Cited sources the
    /// tracker never saw still count toward `cited`, so `cited +
    /// additional` can exceed `total` only when an agent fabricated a
    /// URL; tracked sources always satisfy cited + additional == total.
    pub fn statistics(&self, synthesis: &str) -> SourceStatistics {
        let cited: BTreeSet<String> =
            CitationProcessor::cited_urls(synthesis).into_iter().collect();
        let guard = self.urls.read().unwrap();
        let cited_tracked = guard.iter().filter(|url| cited.contains(*url)).count();
        SourceStatistics {
            total: guard.len(),
            cited: cited_tracked,
            additional: guard.len() - cited_tracked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_absorbed() {
        let tracker = SourceTracker::new();
        tracker.add("https://example.com/a");
        tracker.add("https://EXAMPLE.com/a/");
        tracker.add("https://example.com/a?utm=x");
        assert_eq!(tracker.len(), 1);
        assert!(tracker.contains("https://example.com/a/"));
    }

    #[test]
    fn all_returns_sorted_urls() {
        let tracker = SourceTracker::new();
        tracker.add_many(["https://b.org/x", "https://a.org/y"]);
        assert_eq!(
            tracker.all(),
            vec!["https://a.org/y".to_string(), "https://b.org/x".to_string()]
        );
    }

    fn synthesis_citing_a() -> &'static str {
        concat!(
            "Body [1].\n",
            "\n",
            "## Sources\n",
            "\n",
            "[1] A – \"Entry\" – https://a.org/y\n",
        )
    }

    #[test]
    fn additional_sources_excludes_cited() {
        let tracker = SourceTracker::new();
        tracker.add_many(["https://a.org/y", "https://b.org/x"]);
        assert_eq!(
            tracker.additional_sources(synthesis_citing_a()),
            vec!["https://b.org/x".to_string()]
        );
    }

    #[test]
    fn statistics_partition_the_tracked_set() {
        let tracker = SourceTracker::new();
        tracker.add_many(["https://a.org/y", "https://b.org/x", "https://c.net/z"]);
        let stats = tracker.statistics(synthesis_citing_a());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.cited, 1);
        assert_eq!(stats.additional, 2);
        assert_eq!(stats.cited + stats.additional, stats.total);
        assert!((stats.citation_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_tracker_has_zero_rate() {
        let tracker = SourceTracker::new();
        assert!(tracker.is_empty());
        assert_eq!(tracker.statistics("no sources here").citation_rate(), 0.0);
    }
}
