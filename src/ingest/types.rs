// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, FixedOffset};

/// One catalog listing as fetched. Never mutated after parsing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Timestamp exactly as the source reported it (timezone included).
    pub published: String,
    pub link: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Entry {
    /// Parse `published` as RFC 3339, falling back to RFC 2822.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.published.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .ok()
    }
}

#[async_trait::async_trait]
pub trait FeedSource {
    /// Newest first, bounded by the source's result cap.
    async fn fetch(&self) -> Result<Vec<Entry>>;
    fn name(&self) -> &'static str;
}
