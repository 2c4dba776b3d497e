// src/ingest/mod.rs
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up if a recorder is installed).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_entries_fetched_total",
            "Entries parsed from the catalog feed."
        );
        describe_counter!(
            "digest_entries_rejected_total",
            "Entries dropped by the relevance filter, by reason."
        );
        describe_counter!(
            "digest_entries_matched_total",
            "Entries selected for the digest."
        );
        describe_counter!("digest_fetch_errors_total", "Catalog fetch/parse errors.");
        describe_counter!("digest_runs_total", "Pipeline runs, by outcome.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Collapse whitespace in feed text (titles and abstracts arrive hard-wrapped).
/// Input is already entity-decoded by the XML reader and must not be decoded again.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}
