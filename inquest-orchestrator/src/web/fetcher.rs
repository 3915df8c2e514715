//! Web content fetching
//!
//! Retrieves page text for the top search hits. Sends browser-like
//! headers, retries once on rate limiting, strips markup down to plain
//! text, and truncates long pages. All failures are carried inside the
//! returned record so callers can keep going.

use async_trait::async_trait;
use futures::future::join_all;
use inquest_core::traits::ContentFetcher;
use inquest_core::types::{FetchSettings, FetchedPage};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const TRUNCATION_MARKER: &str = "\n\n... [Content truncated for brevity]";

fn script_style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<!--.*?-->").unwrap()
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]*\n[ \t\n]*\n[ \t]*").unwrap())
}

fn spaces_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap())
}

pub struct PageFetcher {
    client: reqwest::Client,
    max_content_length: usize,
}

impl PageFetcher {
    pub fn new(settings: &FetchSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_content_length: settings.max_content_length,
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "identity")
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Cache-Control", "max-age=0")
    }

    /// Strip markup down to readable text and pull the page title
    fn parse_html(&self, url: &str, html: &str) -> FetchedPage {
        let title = title_regex()
            .captures(html)
            .map(|caps| decode_entities(caps[1].trim()))
            .unwrap_or_default();

        let without_scripts = script_style_regex().replace_all(html, " ");
        let without_tags = tag_regex().replace_all(&without_scripts, " ");
        let decoded = decode_entities(&without_tags);
        let collapsed = whitespace_regex().replace_all(&decoded, "\n\n");
        let mut content = spaces_regex()
            .replace_all(&collapsed, " ")
            .trim()
            .to_string();

        if content.len() > self.max_content_length {
            let mut cut = self.max_content_length;
            while !content.is_char_boundary(cut) {
                cut -= 1;
            }
            content.truncate(cut);
            content.push_str(TRUNCATION_MARKER);
        }

        FetchedPage {
            url: url.to_string(),
            success: true,
            title,
            content,
            error: None,
        }
    }

    async fn fetch_inner(&self, url: &str) -> FetchedPage {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return FetchedPage::failure(
                url,
                "Invalid URL format. Must start with http:// or https://",
            );
        }

        let response = match self.request(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchedPage::failure(url, format!("Request failed: {}", e));
            }
        };

        let response = if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            // Rate limited, try once more after a brief wait
            tokio::time::sleep(Duration::from_secs(2)).await;
            match self.request(url).send().await {
                Ok(retry) if retry.status().is_success() => retry,
                _ => {
                    return FetchedPage::failure(url, "Rate limited (HTTP 429)");
                }
            }
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            return FetchedPage::failure(url, format!("HTTP {}", status));
        }

        match response.text().await {
            Ok(html) => {
                let page = self.parse_html(url, &html);
                debug!(url = url, chars = page.content.len(), "Fetched page");
                page
            }
            Err(e) => FetchedPage::failure(url, format!("Failed to read body: {}", e)),
        }
    }
}

/// Decode the handful of entities that survive tag stripping
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[async_trait]
impl ContentFetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> FetchedPage {
        self.fetch_inner(url).await
    }

    async fn fetch_batch(&self, urls: &[String]) -> Vec<FetchedPage> {
        if urls.is_empty() {
            return Vec::new();
        }

        info!(count = urls.len(), "Starting batch fetch");
        let pages = join_all(urls.iter().map(|url| self.fetch(url))).await;

        let success = pages.iter().filter(|p| p.success).count();
        if success < pages.len() {
            warn!(
                success = success,
                failed = pages.len() - success,
                "Batch fetch finished with failures"
            );
        } else {
            info!(success = success, "Batch fetch completed");
        }
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(max_len: usize) -> PageFetcher {
        PageFetcher::new(&FetchSettings {
            timeout_secs: 5,
            max_content_length: max_len,
        })
    }

    #[test]
    fn html_is_reduced_to_text() {
        let html = concat!(
            "<html><head><title>My Page</title>",
            "<style>body { color: red; }</style>",
            "<script>alert('x');</script></head>",
            "<body><h1>Heading</h1><p>First &amp; second.</p>",
            "<!-- hidden --></body></html>"
        );
        let page = fetcher(12_000).parse_html("https://example.com", html);
        assert!(page.success);
        assert_eq!(page.title, "My Page");
        assert!(page.content.contains("Heading"));
        assert!(page.content.contains("First & second."));
        assert!(!page.content.contains("alert"));
        assert!(!page.content.contains("color: red"));
        assert!(!page.content.contains("hidden"));
    }

    #[test]
    fn long_content_is_truncated_with_marker() {
        let body = "word ".repeat(200);
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let page = fetcher(100).parse_html("https://example.com", &html);
        assert!(page.content.ends_with(TRUNCATION_MARKER));
        assert!(page.content.len() <= 100 + TRUNCATION_MARKER.len());
    }

    #[tokio::test]
    async fn invalid_scheme_fails_without_a_request() {
        let page = fetcher(100).fetch("ftp://example.com/file").await;
        assert!(!page.success);
        assert!(page.error.as_deref().unwrap_or("").contains("Invalid URL"));
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let pages = fetcher(100).fetch_batch(&[]).await;
        assert!(pages.is_empty());
    }
}
