//! Web search and retrieval.
//!
//! `web_search` and `verify_facts` are deterministic stand-ins that shape
//! their output like a real provider would, so the rest of the system can
//! be exercised without network credentials. `fetch_webpage` and
//! `fetch_multiple_urls` do real HTTP: title, readable text, and outbound
//! links per page, with per-URL error isolation when fetching in bulk.

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard cap on results returned by a single search
pub const MAX_SEARCH_RESULTS: usize = 5;
/// Page text is truncated to this many characters
pub const MAX_CONTENT_CHARS: usize = 5000;
/// At most this many outbound links are kept per page
pub const MAX_LINKS: usize = 20;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; InsightCrew/1.0)";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
}

/// Result of one URL in a bulk fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Success { page: PageContent },
    Error { url: String, error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheck {
    pub claim: String,
    pub status: String,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// Search the web for a query. Results are synthesized deterministically
/// from the query text and capped at [`MAX_SEARCH_RESULTS`].
pub fn web_search(query: &str, max_results: usize) -> Vec<SearchResult> {
    let count = max_results.min(MAX_SEARCH_RESULTS);
    let slug: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    (1..=count)
        .map(|i| SearchResult {
            title: format!("Result {} for '{}'", i, query),
            url: format!("https://example.com/search/{}/{}", slug, i),
            snippet: format!(
                "Relevant information about {} from source {}",
                query, i
            ),
            relevance_score: 1.0 - (i as f64 - 1.0) * 0.1,
        })
        .collect()
}

/// HTTP client configured for page fetching
pub fn fetch_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("building HTTP client")
}

/// Fetch a page and extract its title, readable text, and outbound links
pub async fn fetch_webpage(client: &reqwest::Client, url: &str) -> Result<PageContent> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Request to {} returned HTTP {}", url, status);
    }
    let body = response
        .text()
        .await
        .with_context(|| format!("reading body of {}", url))?;

    Ok(extract_page(url, &body))
}

fn extract_page(url: &str, body: &str) -> PageContent {
    let document = Html::parse_document(body);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let body_selector = Selector::parse("body").expect("static selector");
    let mut content = document
        .select(&body_selector)
        .next()
        .map(|b| {
            b.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    content.truncate(floor_char_boundary(&content, MAX_CONTENT_CHARS));

    let link_selector = Selector::parse("a[href]").expect("static selector");
    let links: Vec<String> = document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("http"))
        .take(MAX_LINKS)
        .map(String::from)
        .collect();

    PageContent {
        url: url.to_string(),
        title,
        content,
        links,
    }
}

/// `String::truncate` panics mid-codepoint; back off to a boundary
fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Fetch several URLs concurrently. Each URL succeeds or fails on its own;
/// one bad URL never poisons the batch.
pub async fn fetch_multiple_urls(client: &reqwest::Client, urls: &[String]) -> Vec<FetchOutcome> {
    let mut futures = FuturesUnordered::new();
    for url in urls {
        let client = client.clone();
        let url = url.clone();
        futures.push(async move {
            match fetch_webpage(&client, &url).await {
                Ok(page) => FetchOutcome::Success { page },
                Err(e) => FetchOutcome::Error {
                    url,
                    error: e.to_string(),
                },
            }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(outcome) = futures.next().await {
        outcomes.push(outcome);
    }
    outcomes
}

/// Check a list of claims. Deterministic stand-in: every claim comes back
/// partially true with moderate confidence.
pub fn verify_facts(claims: &[String]) -> Vec<FactCheck> {
    claims
        .iter()
        .map(|claim| FactCheck {
            claim: claim.clone(),
            status: "partially_true".to_string(),
            confidence: 0.75,
            sources: vec![
                "https://example.com/source/1".to_string(),
                "https://example.com/source/2".to_string(),
            ],
        })
        .collect()
}
