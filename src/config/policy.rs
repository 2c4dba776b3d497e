// src/config/policy.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::providers::arxiv::{DEFAULT_BASE_URL, DEFAULT_MAX_RESULTS};
use crate::relevance::{RelevancePolicy, DEFAULT_RECENCY_DAYS};

pub const DEFAULT_POLICY_PATH: &str = "config/policy.toml";
pub const ENV_POLICY_PATH: &str = "ARXIV_POLICY_PATH";
pub const DEFAULT_SUBJECT: &str = "New arXiv papers";

/// Everything a run needs besides mail credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub policy: RelevancePolicy,
    pub query: QueryConfig,
    pub digest: DigestConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub base_url: String,
    pub max_results: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub subject: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

/* ----------------------------
File schema (TOML or JSON); any omitted key keeps the built-in default
---------------------------- */

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    keywords: Option<Vec<String>>,
    excluded_keywords: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    excluded_categories: Option<Vec<String>>,
    recency_days: Option<i64>,
    #[serde(default)]
    query: QueryConfig,
    #[serde(default)]
    digest: DigestConfig,
}

impl Settings {
    /// Resolve the policy file: explicit path, then $ARXIV_POLICY_PATH, then
    /// `config/policy.toml`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from(p);
        }
        if let Ok(p) = std::env::var(ENV_POLICY_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_POLICY_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_POLICY_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        tracing::debug!(target: "pipeline", "no policy file, using built-in defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading policy from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let settings = Self::from_str_with_hint(&content, &ext)
            .with_context(|| format!("parsing policy {}", path.display()))?;
        tracing::info!(target: "pipeline", path = %path.display(), "loaded policy");
        Ok(settings)
    }

    /// JSON when hinted by extension, TOML otherwise.
    pub fn from_str_with_hint(s: &str, hint_ext: &str) -> Result<Self> {
        let file: SettingsFile = if hint_ext == "json" {
            serde_json::from_str(s)?
        } else {
            toml::from_str(s)?
        };
        file.into_settings()
    }
}

impl SettingsFile {
    fn into_settings(self) -> Result<Settings> {
        let base = RelevancePolicy::default();

        let recency_days = self.recency_days.unwrap_or(DEFAULT_RECENCY_DAYS);
        if recency_days <= 0 {
            bail!("recency_days must be positive, got {recency_days}");
        }
        let recency_window = Duration::try_days(recency_days)
            .ok_or_else(|| anyhow!("recency_days out of range: {recency_days}"))?;

        let policy = RelevancePolicy {
            keywords: self.keywords.map(clean_list).unwrap_or(base.keywords),
            excluded_keywords: self
                .excluded_keywords
                .map(clean_list)
                .unwrap_or(base.excluded_keywords),
            categories: self.categories.map(clean_list).unwrap_or(base.categories),
            excluded_categories: self
                .excluded_categories
                .map(clean_list)
                .unwrap_or(base.excluded_categories),
            recency_window,
        };
        if policy.categories.is_empty() {
            bail!("categories must not be empty");
        }
        if self.query.max_results == 0 {
            bail!("query.max_results must be positive");
        }

        Ok(Settings {
            policy,
            query: self.query,
            digest: self.digest,
        })
    }
}

/// Trim, drop blanks, drop repeats; first occurrence keeps its position.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}
