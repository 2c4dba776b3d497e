// src/relevance.rs
//! Relevance filter: dedup, recency window, category/keyword exclusion, keyword inclusion.
//!
//! `filter` is pure. Every entry gets exactly one [`Verdict`], returned alongside the
//! selected entries so callers can trace decisions without the filter doing any I/O.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ingest::types::Entry;

pub const DEFAULT_RECENCY_DAYS: i64 = 7;

/// Keyword/category rules plus the recency window. Static for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevancePolicy {
    pub keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    /// Only used to build the catalog query; never an inclusion rule here.
    pub categories: Vec<String>,
    pub excluded_categories: Vec<String>,
    pub recency_window: Duration,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            keywords: to_owned(&[
                "cdex",
                "xenonnt",
                "lz",
                "pandax",
                "hydrox",
                "tesseract",
                "dark matter",
                "direct detection",
                "neutrinoless double beta",
                "double-weak",
                "xenon",
                "neutrino physics",
                "2νββ",
            ]),
            excluded_keywords: to_owned(&["alice", "LHC"]),
            categories: to_owned(&["hep-ex", "hep-ph", "nucl-ex"]),
            excluded_categories: to_owned(&[
                "astro-ph.GA",
                "astro-ph.CO",
                "astro-ph.SR",
                "astro-ph.HE",
                "astro-ph.EP",
                "astro-ph.IM",
            ]),
            recency_window: Duration::days(DEFAULT_RECENCY_DAYS),
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Why an entry was kept or dropped. Evaluated in declaration order; first hit wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    AlreadySeen,
    UnparseableTimestamp,
    TooOld { published: String },
    ExcludedCategory { category: String },
    ExcludedKeyword { keyword: String },
    NoKeywordMatch,
    Matched { keywords: Vec<String> },
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matched { .. })
    }

    /// Stable label for counters and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::AlreadySeen => "already_seen",
            Verdict::UnparseableTimestamp => "unparseable_timestamp",
            Verdict::TooOld { .. } => "too_old",
            Verdict::ExcludedCategory { .. } => "excluded_category",
            Verdict::ExcludedKeyword { .. } => "excluded_keyword",
            Verdict::NoKeywordMatch => "no_keyword_match",
            Verdict::Matched { .. } => "matched",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDecision {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Selected entries, in fetch order.
    pub relevant: Vec<Entry>,
    /// Ids of `relevant`, same order; what gets marked seen after delivery.
    pub new_ids: Vec<String>,
    /// One decision per input entry, in fetch order.
    pub decisions: Vec<EntryDecision>,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        self.relevant.is_empty()
    }
}

/// Decide a single entry. `seen` must already include ids accepted earlier in the batch.
pub fn evaluate(
    entry: &Entry,
    seen: &HashSet<String>,
    policy: &RelevancePolicy,
    now: DateTime<Utc>,
) -> Verdict {
    // 1) Dedup
    if seen.contains(&entry.id) {
        return Verdict::AlreadySeen;
    }

    // 2) Recency (UTC)
    let Some(published) = entry.published_at() else {
        return Verdict::UnparseableTimestamp;
    };
    if now.signed_duration_since(published.with_timezone(&Utc)) > policy.recency_window {
        return Verdict::TooOld {
            published: entry.published.clone(),
        };
    }

    // 3) Category exclusion: exact, case-sensitive tag match
    if let Some(cat) = entry
        .categories
        .iter()
        .find(|c| policy.excluded_categories.contains(*c))
    {
        return Verdict::ExcludedCategory {
            category: cat.clone(),
        };
    }

    // 4) Keyword exclusion, then 5) inclusion: unanchored, case-insensitive substring
    let text = format!("{} {}", entry.title, entry.summary).to_lowercase();
    if let Some(kw) = policy
        .excluded_keywords
        .iter()
        .find(|kw| text.contains(&kw.to_lowercase()))
    {
        return Verdict::ExcludedKeyword {
            keyword: kw.clone(),
        };
    }

    let matched: Vec<String> = policy
        .keywords
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .cloned()
        .collect();
    if matched.is_empty() {
        Verdict::NoKeywordMatch
    } else {
        Verdict::Matched { keywords: matched }
    }
}

/// Run the policy over a fetched batch.
///
/// An id seen earlier in the same batch counts as already seen, so `new_ids`
/// never holds duplicates.
pub fn filter(
    entries: &[Entry],
    seen_ids: &HashSet<String>,
    policy: &RelevancePolicy,
    now: DateTime<Utc>,
) -> FilterOutcome {
    let mut out = FilterOutcome::default();
    let mut accepted: HashSet<String> = HashSet::new();

    for entry in entries {
        let verdict = if accepted.contains(&entry.id) {
            Verdict::AlreadySeen
        } else {
            evaluate(entry, seen_ids, policy, now)
        };

        if verdict.is_match() {
            accepted.insert(entry.id.clone());
            out.relevant.push(entry.clone());
            out.new_ids.push(entry.id.clone());
        }
        out.decisions.push(EntryDecision {
            id: entry.id.clone(),
            title: entry.title.clone(),
            verdict,
        });
    }
    out
}
