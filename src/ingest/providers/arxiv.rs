use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::normalize_text;
use crate::ingest::types::{Entry, FeedSource};

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query?search_query=";
pub const DEFAULT_MAX_RESULTS: u32 = 2000;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: String,
}

/// `cat:A+OR+cat:B` query, newest submissions first, capped at `max_results`.
pub fn build_query(base_url: &str, categories: &[String], max_results: u32) -> String {
    let category_query = categories
        .iter()
        .map(|c| format!("cat:{c}"))
        .collect::<Vec<_>>()
        .join("+OR+");
    format!(
        "{base_url}{category_query}&sortBy=submittedDate&sortOrder=descending&max_results={max_results}"
    )
}

/// Parse an arXiv API Atom document into entries, preserving document order.
pub fn parse_feed(xml: &str) -> Result<Vec<Entry>> {
    let t0 = std::time::Instant::now();
    if !xml.contains("<feed") {
        bail!("response is not an atom feed");
    }
    let feed: Feed = from_str(xml).context("parsing arxiv atom xml")?;

    let mut out = Vec::with_capacity(feed.entries.len());
    for it in feed.entries {
        let id = it.id.trim().to_string();
        // The API reports query errors as a single pseudo-entry.
        if id.contains("/api/errors") {
            bail!("arxiv api error: {}", normalize_text(&it.summary));
        }
        if id.is_empty() {
            continue;
        }

        let link = it
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| it.links.first())
            .map(|l| l.href.clone())
            .unwrap_or_else(|| id.clone());

        out.push(Entry {
            title: normalize_text(&it.title),
            summary: normalize_text(&it.summary),
            published: it.published.trim().to_string(),
            link,
            categories: it.categories.into_iter().map(|c| c.term).collect(),
            id,
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("digest_entries_fetched_total").increment(out.len() as u64);
    Ok(out)
}

pub struct ArxivFeed {
    mode: Mode,
}

enum Mode {
    /// Saved API response, parsed in place of a live query.
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl ArxivFeed {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn from_query(base_url: &str, categories: &[String], max_results: u32) -> Self {
        Self::from_url(build_query(base_url, categories, max_results))
    }

    /// The live query URL, if any.
    pub fn url(&self) -> Option<&str> {
        match &self.mode {
            Mode::Fixture(_) => None,
            Mode::Http { url, .. } => Some(url),
        }
    }
}

/// Transport error, non-2xx status, or unreadable body.
async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await.context("arxiv http get()")?;
    let resp = resp.error_for_status().context("arxiv non-2xx")?;
    resp.text().await.context("arxiv http .text()")
}

#[async_trait]
impl FeedSource for ArxivFeed {
    async fn fetch(&self) -> Result<Vec<Entry>> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(s),
            Mode::Http { url, client } => {
                tracing::debug!(target: "ingest", %url, "querying arxiv");
                let body = fetch_body(client, url).await.inspect_err(|e| {
                    tracing::warn!(target: "ingest", error = %format!("{e:#}"), provider = "arXiv", "provider http error");
                    counter!("digest_fetch_errors_total").increment(1);
                })?;
                let entries = parse_feed(&body).inspect_err(|_| {
                    counter!("digest_fetch_errors_total").increment(1);
                })?;
                tracing::debug!(target: "ingest", count = entries.len(), "retrieved entries");
                Ok(entries)
            }
        }
    }

    fn name(&self) -> &'static str {
        "arXiv"
    }
}
