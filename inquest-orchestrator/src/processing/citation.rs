//! Citation consolidation
//!
//! Agents research sub-queries independently and each numbers its own
//! citations from [1], so a merged synthesis arrives with colliding and
//! duplicated labels. This module parses the bibliography, collapses
//! entries that point at the same source, and renumbers every reference
//! in the text to match the consolidated list.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info};

/// One parsed bibliography line: `[label] Site Name – "Title" – https://url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationEntry {
    pub label: usize,
    pub site_name: String,
    pub title: String,
    pub url: String,
}

/// Outcome of a deduplication pass
#[derive(Debug, Clone)]
pub struct DeduplicationResult {
    pub updated_text: String,
    /// Entries removed because they duplicated an earlier source
    pub deduplicated_count: usize,
    /// Entries remaining in the consolidated bibliography
    pub final_count: usize,
}

fn citation_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\[(\d+)\]\s+([^–\n]+)\s+–\s+"([^"]+)"\s+–\s+(https?://[^\s]+)"#).unwrap()
    })
}

fn sources_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"##[ \t]*Sources[ \t]*\n\s*\n").unwrap())
}

fn section_terminator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n\s*(##|\*\*)").unwrap())
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d+)\]").unwrap())
}

/// Byte range of the bibliography body within a synthesis text
#[derive(Debug, Clone, Copy)]
struct SourcesSection {
    start: usize,
    end: usize,
}

pub struct CitationProcessor;

impl CitationProcessor {
    /// Canonicalize a URL so that cosmetic variants compare equal.
    ///
    /// Scheme, host, and path are lowercased, a trailing path slash is
    /// dropped, and query plus fragment are discarded. Strings that do
    /// not parse as absolute URLs fall back to trimmed lowercase so the
    /// function is total.
    pub fn normalize_url(raw: &str) -> String {
        let trimmed = raw.trim();
        match url::Url::parse(trimmed) {
            Ok(parsed) => {
                let host = match parsed.host_str() {
                    Some(host) => host.to_lowercase(),
                    None => return trimmed.to_lowercase(),
                };
                let scheme = parsed.scheme().to_lowercase();
                let path = parsed.path().trim_end_matches('/').to_lowercase();
                match parsed.port() {
                    Some(port) => format!("{}://{}:{}{}", scheme, host, port, path),
                    None => format!("{}://{}{}", scheme, host, path),
                }
            }
            Err(_) => trimmed.to_lowercase(),
        }
    }

    /// Parse every well-formed citation line in `text`. Malformed lines
    /// are skipped, never errors.
    pub fn extract_citations(text: &str) -> Vec<CitationEntry> {
        citation_line_regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let label: usize = caps[1].parse().ok()?;
                Some(CitationEntry {
                    label,
                    site_name: caps[2].trim().to_string(),
                    title: caps[3].to_string(),
                    url: caps[4].to_string(),
                })
            })
            .collect()
    }

    /// Locate the body of the `## Sources` section: from the blank line
    /// after the header up to the next section break (a following `##`
    /// heading or bold marker separated by a blank line) or end of text.
    fn locate_sources_section(text: &str) -> Option<SourcesSection> {
        let header = sources_header_regex().find(text)?;
        let start = header.end();
        let end = match section_terminator_regex().find(&text[start..]) {
            Some(terminator) => start + terminator.start(),
            None => text.len(),
        };
        Some(SourcesSection { start, end })
    }

    /// Normalized URLs of every citation in the bibliography, in order
    pub fn cited_urls(text: &str) -> Vec<String> {
        match Self::locate_sources_section(text) {
            Some(section) => Self::extract_citations(&text[section.start..section.end])
                .iter()
                .map(|entry| Self::normalize_url(&entry.url))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Collapse duplicate sources and renumber the whole text.
    ///
    /// Entries sharing a normalized URL keep the first occurrence; the
    /// survivors are renumbered contiguously from [1] in first-seen
    /// order. Inline references are rewritten in a single pass over the
    /// original text, then the rebuilt bibliography is spliced in, so a
    /// swap like old [3] becoming new [1] can never cascade.
    ///
    /// Text without a `## Sources` section is returned unchanged.
    pub fn deduplicate_citation_urls(text: &str) -> DeduplicationResult {
        let section = match Self::locate_sources_section(text) {
            Some(section) => section,
            None => {
                debug!("No sources section found, skipping citation deduplication");
                return DeduplicationResult {
                    updated_text: text.to_string(),
                    deduplicated_count: 0,
                    final_count: 0,
                };
            }
        };

        let citations = Self::extract_citations(&text[section.start..section.end]);
        if citations.is_empty() {
            return DeduplicationResult {
                updated_text: text.to_string(),
                deduplicated_count: 0,
                final_count: 0,
            };
        }

        // First-seen order per normalized URL; later duplicates only
        // contribute a label remapping.
        let mut kept: Vec<CitationEntry> = Vec::new();
        let mut new_label_by_url: HashMap<String, usize> = HashMap::new();
        let mut label_map: HashMap<usize, usize> = HashMap::new();

        for citation in &citations {
            let normalized = Self::normalize_url(&citation.url);
            let new_label = match new_label_by_url.get(&normalized) {
                Some(&existing) => existing,
                None => {
                    let assigned = kept.len() + 1;
                    new_label_by_url.insert(normalized, assigned);
                    kept.push(CitationEntry {
                        label: assigned,
                        ..citation.clone()
                    });
                    assigned
                }
            };
            label_map.entry(citation.label).or_insert(new_label);
        }

        let deduplicated_count = citations.len() - kept.len();

        // Single-pass rewrite of every [n] reference. Labels absent from
        // the bibliography are left untouched.
        let renumbered = label_regex().replace_all(text, |caps: &regex::Captures| {
            let old: usize = caps[1].parse().unwrap_or(0);
            match label_map.get(&old) {
                Some(new) => format!("[{}]", new),
                None => caps[0].to_string(),
            }
        });

        let rebuilt_lines: Vec<String> = kept
            .iter()
            .map(|entry| {
                format!(
                    "[{}] {} – \"{}\" – {}",
                    entry.label, entry.site_name, entry.title, entry.url
                )
            })
            .collect();

        // Relocate the section in the renumbered text; offsets are
        // unchanged in practice since labels only shrink or stay equal,
        // but relocating keeps the splice correct either way.
        let updated_text = match Self::locate_sources_section(&renumbered) {
            Some(section) => {
                let mut out = String::with_capacity(renumbered.len());
                out.push_str(&renumbered[..section.start]);
                out.push_str(&rebuilt_lines.join("\n"));
                out.push_str(&renumbered[section.end..]);
                out
            }
            None => renumbered.into_owned(),
        };

        if deduplicated_count > 0 {
            info!(
                removed = deduplicated_count,
                remaining = kept.len(),
                "Collapsed duplicate citations"
            );
        }

        DeduplicationResult {
            updated_text,
            deduplicated_count,
            final_count: kept.len(),
        }
    }
}
