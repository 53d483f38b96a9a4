//! Webpage fetching and metadata extraction.

use regex::Regex;
use reqwest::{Client, Response};
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;

/// Upper bound on readable text handed to an LLM.
pub const MAX_CONTENT_CHARS: usize = 8000;

/// Bytes of a page body read before the rest is dropped.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ArsenalBot/0.1; +https://github.com)";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static NON_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<noscript[^>]*>.*?</noscript>|<!--.*?-->")
        .unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: String,
}

/// Fetch a URL, retrying network errors and 5xx responses a fixed number of times.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    attempts: u32,
    delay: Duration,
) -> Result<Response, reqwest::Error> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = client.get(url).send().await;
        let retryable = match &result {
            Ok(resp) => resp.status().is_server_error(),
            Err(e) => !e.is_builder(),
        };
        if !retryable || attempt >= attempts {
            return result;
        }
        tracing::debug!("Fetch of {url} failed (attempt {attempt}/{attempts}), retrying");
        attempt += 1;
        tokio::time::sleep(delay).await;
    }
}

#[derive(Clone)]
pub struct WebFetcher {
    client: Client,
    attempts: u32,
    delay: Duration,
}

impl WebFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            attempts: config.fetch_attempts,
            delay: config.fetch_retry_delay,
        })
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String, AppError> {
        let resp = fetch_with_retry(&self.client, url, self.attempts, self.delay)
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to fetch webpage: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Failed to fetch webpage: {url} returned {status}"
            )));
        }

        read_capped(resp, MAX_PAGE_BYTES)
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read webpage body: {e}")))
    }

    pub async fn fetch_page(&self, url: &str) -> Result<PageSummary, AppError> {
        let html = self.fetch_html(url).await?;
        let page = extract_page(url, &html);
        tracing::info!(
            "Fetched {url}: title={:?}, {} chars of content",
            page.title,
            page.content.len()
        );
        Ok(page)
    }
}

/// Read at most `limit` bytes of a response body as lossy UTF-8.
async fn read_capped(mut resp: Response, limit: usize) -> Result<String, reqwest::Error> {
    if let Some(len) = resp.content_length().filter(|&len| len > limit as u64) {
        tracing::debug!("Page is {len} bytes, reading the first {limit}");
    }

    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Strip a trailing site name after `|`, `-` or `–` and collapse whitespace.
///
/// Best effort: a product whose own name contains " - " loses its tail.
pub fn clean_title(raw: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ").to_string();
    let cut = [" | ", " - ", " – "]
        .iter()
        .filter_map(|delim| collapsed.find(delim))
        .min();
    match cut {
        Some(idx) if idx > 0 => collapsed[..idx].trim().to_string(),
        _ => collapsed,
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn meta_tags(html: &str) -> Vec<(String, String)> {
    META_RE
        .find_iter(html)
        .filter_map(|m| {
            let mut key = None;
            let mut content = None;
            for cap in ATTR_RE.captures_iter(m.as_str()) {
                let name = cap[1].to_lowercase();
                let value = cap.get(2).or_else(|| cap.get(3)).map(|v| v.as_str().to_string());
                match name.as_str() {
                    "name" | "property" => key = value.map(|v| v.to_lowercase()),
                    "content" => content = value,
                    _ => {}
                }
            }
            Some((key?, content?))
        })
        .collect()
}

fn first_meta(metas: &[(String, String)], keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        metas
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| decode_entities(v.trim()))
    })
}

pub fn page_text(html: &str) -> String {
    let without_scripts = NON_CONTENT_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    let collapsed = WHITESPACE_RE.replace_all(decoded.trim(), " ");
    collapsed.chars().take(MAX_CONTENT_CHARS).collect()
}

pub fn extract_page(url: &str, html: &str) -> PageSummary {
    let metas = meta_tags(html);

    let title = first_meta(&metas, &["og:title", "twitter:title"])
        .or_else(|| {
            TITLE_RE
                .captures(html)
                .map(|c| decode_entities(c[1].trim()))
        })
        .map(|t| clean_title(&t))
        .filter(|t| !t.is_empty());

    let description = first_meta(&metas, &["og:description", "description", "twitter:description"]);

    PageSummary {
        url: url.to_string(),
        title,
        description,
        content: page_text(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_site_suffix() {
        assert_eq!(clean_title("Cursor | The AI Code Editor"), "Cursor");
        assert_eq!(clean_title("  Perplexity   -  Ask anything "), "Perplexity");
        assert_eq!(clean_title("Claude – Anthropic"), "Claude");
    }

    #[test]
    fn clean_title_keeps_plain_titles() {
        assert_eq!(clean_title("Midjourney"), "Midjourney");
        assert_eq!(clean_title("GPT-4o mini"), "GPT-4o mini");
        assert_eq!(clean_title("| Leading delimiter"), "| Leading delimiter");
    }

    #[test]
    fn extracts_og_metadata_first() {
        let html = r#"<html><head>
            <title>Fallback Title - Site</title>
            <meta property="og:title" content="Open Graph Title | Site">
            <meta name="description" content="Plain description">
            <meta property='og:description' content='OG &amp; description'>
        </head><body><p>Hello</p></body></html>"#;
        let page = extract_page("https://example.com", html);
        assert_eq!(page.title.as_deref(), Some("Open Graph Title"));
        assert_eq!(page.description.as_deref(), Some("OG & description"));
    }

    #[test]
    fn falls_back_to_title_tag() {
        let html = "<html><head><TITLE>\n  My Tool \n - Home</TITLE></head></html>";
        let page = extract_page("https://example.com", html);
        assert_eq!(page.title.as_deref(), Some("My Tool"));
        assert_eq!(page.description, None);
    }

    #[test]
    fn content_drops_scripts_and_tags() {
        let html = "<body><script>var x = 1;</script><style>p{}</style><h1>Hi</h1>\n<p>there &amp; you</p></body>";
        assert_eq!(page_text(html), "Hi there & you");
    }

    #[test]
    fn content_is_truncated() {
        let html = format!("<p>{}</p>", "é".repeat(MAX_CONTENT_CHARS + 100));
        assert_eq!(page_text(&html).chars().count(), MAX_CONTENT_CHARS);
    }

    #[tokio::test]
    async fn page_body_is_capped() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let page = format!("<title>Big</title>{}", "a".repeat(MAX_PAGE_BYTES));
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(page, "text/html"))
            .mount(&server)
            .await;

        let config = Config {
            fetch_attempts: 1,
            ..Config::default()
        };
        let fetcher = WebFetcher::new(&config).unwrap();
        let html = fetcher.fetch_html(&format!("{}/big", server.uri())).await.unwrap();
        assert_eq!(html.len(), MAX_PAGE_BYTES);
        assert!(html.starts_with("<title>Big</title>"));

        let summary = fetcher.fetch_page(&format!("{}/big", server.uri())).await.unwrap();
        assert_eq!(summary.title.as_deref(), Some("Big"));
        assert_eq!(summary.content.chars().count(), MAX_CONTENT_CHARS);
    }
}
