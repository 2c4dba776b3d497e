// src/pipeline.rs
//! One run: load seen ids → fetch → filter → (empty | format → notify) → persist.
//!
//! Ids are appended to the store only after the digest was delivered, so a failed
//! send leaves every matched entry eligible for the next run.

use chrono::{DateTime, Utc};
use metrics::counter;
use std::collections::HashSet;
use std::fmt;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ingest::ensure_metrics_described;
use crate::ingest::types::{Entry, FeedSource};
use crate::notify::{format_digest, Notifier};
use crate::relevance::{self, EntryDecision, FilterOutcome};
use crate::seen::SeenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Filtering,
    Empty,
    Notifying,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Filtering => "filtering",
            RunState::Empty => "empty",
            RunState::Notifying => "notifying",
            RunState::Persisting => "persisting",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a run that did not fail.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// `Empty` or `Done`.
    pub state: RunState,
    pub fetched: usize,
    /// Ids delivered and persisted in this run.
    pub sent_ids: Vec<String>,
    pub decisions: Vec<EntryDecision>,
}

impl RunReport {
    pub fn sent(&self) -> usize {
        self.sent_ids.len()
    }

    /// One-line summary for the invoking shell.
    pub fn summary(&self) -> String {
        match self.state {
            RunState::Done => format!("Sent {} paper(s).", self.sent()),
            _ => "No new relevant papers found.".to_string(),
        }
    }
}

/// Fetch and filter without side effects. Used by dry runs.
#[derive(Debug, Clone)]
pub struct Preview {
    pub fetched: usize,
    pub outcome: FilterOutcome,
    pub html: Option<String>,
}

fn enter(state: RunState) {
    tracing::debug!(target: "pipeline", %state, "state");
}

fn fail(err: Error) -> Error {
    tracing::error!(target: "pipeline", state = %RunState::Failed, kind = err.kind(), error = %err, "run failed");
    counter!("digest_runs_total", "outcome" => "failed").increment(1);
    err
}

/// Emit the filter's decision list as trace events plus per-reason counters.
fn trace_decisions(decisions: &[EntryDecision]) {
    for d in decisions {
        if d.verdict.is_match() {
            counter!("digest_entries_matched_total").increment(1);
        } else {
            counter!("digest_entries_rejected_total", "reason" => d.verdict.reason())
                .increment(1);
        }
        tracing::debug!(
            target: "relevance",
            id = %d.id,
            title = %d.title,
            reason = d.verdict.reason(),
            detail = ?d.verdict,
            "decision"
        );
    }
}

fn load_seen(store: &dyn SeenStore) -> Result<HashSet<String>> {
    store.load().map_err(|e| Error::StoreRead {
        path: store.describe().into(),
        reason: e,
    })
}

async fn fetch_and_filter(
    feed: &dyn FeedSource,
    seen: &HashSet<String>,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<(usize, FilterOutcome)> {
    enter(RunState::Fetching);
    let entries: Vec<Entry> = feed.fetch().await.map_err(Error::Fetch)?;
    tracing::info!(target: "ingest", provider = feed.name(), count = entries.len(), "fetched entries");

    enter(RunState::Filtering);
    let outcome = relevance::filter(&entries, seen, &settings.policy, now);
    trace_decisions(&outcome.decisions);
    Ok((entries.len(), outcome))
}

/// Execute one complete run. Each call is an independent attempt; nothing is retried.
pub async fn run_once(
    feed: &dyn FeedSource,
    store: &dyn SeenStore,
    notifier: &dyn Notifier,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    ensure_metrics_described();
    enter(RunState::Idle);

    let seen = load_seen(store).map_err(fail)?;
    let (fetched, outcome) = fetch_and_filter(feed, &seen, settings, now)
        .await
        .map_err(fail)?;

    if outcome.is_empty() {
        enter(RunState::Empty);
        counter!("digest_runs_total", "outcome" => "empty").increment(1);
        tracing::info!(target: "pipeline", fetched, "no new relevant papers");
        return Ok(RunReport {
            state: RunState::Empty,
            fetched,
            sent_ids: Vec::new(),
            decisions: outcome.decisions,
        });
    }

    enter(RunState::Notifying);
    let html = format_digest(&outcome.relevant);
    notifier
        .notify(&settings.digest.subject, &html)
        .await
        .map_err(|e| fail(Error::Delivery(e)))?;

    enter(RunState::Persisting);
    store
        .append(&outcome.new_ids)
        .map_err(|e| fail(Error::StoreWrite(e)))?;

    enter(RunState::Done);
    counter!("digest_runs_total", "outcome" => "sent").increment(1);
    tracing::info!(
        target: "pipeline",
        fetched,
        sent = outcome.new_ids.len(),
        notifier = notifier.name(),
        store = %store.describe(),
        "digest delivered"
    );
    Ok(RunReport {
        state: RunState::Done,
        fetched,
        sent_ids: outcome.new_ids,
        decisions: outcome.decisions,
    })
}

/// Fetch and filter, render the digest if non-empty; never notifies or writes.
pub async fn preview(
    feed: &dyn FeedSource,
    store: &dyn SeenStore,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Preview> {
    ensure_metrics_described();
    let seen = load_seen(store)?;
    let (fetched, outcome) = fetch_and_filter(feed, &seen, settings, now).await?;
    let html = (!outcome.is_empty()).then(|| format_digest(&outcome.relevant));
    Ok(Preview {
        fetched,
        outcome,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lines() {
        let mut r = RunReport {
            state: RunState::Done,
            fetched: 3,
            sent_ids: vec!["a".into(), "b".into()],
            decisions: vec![],
        };
        assert_eq!(r.summary(), "Sent 2 paper(s).");
        r.state = RunState::Empty;
        r.sent_ids.clear();
        assert_eq!(r.summary(), "No new relevant papers found.");
    }

    #[test]
    fn state_names() {
        assert_eq!(RunState::Persisting.to_string(), "persisting");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }
}
