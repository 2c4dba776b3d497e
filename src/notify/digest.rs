// src/notify/digest.rs
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::ingest::types::Entry;

/// Abstract characters shown per item; the ellipsis is always appended.
pub const SUMMARY_PREVIEW_CHARS: usize = 500;

pub const DIGEST_HEADING: &str = "New arXiv Papers";

/// Render entries as an HTML digest: one `<li>` per entry, input order kept.
///
/// Each item links the title to the entry URL, shows the published timestamp as
/// reported, and the first [`SUMMARY_PREVIEW_CHARS`] characters of the summary.
pub fn format_digest(entries: &[Entry]) -> String {
    let mut html = format!("<h2>{DIGEST_HEADING}</h2><ul>");
    for e in entries {
        let preview: String = e.summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        html.push_str(&format!(
            "<li><a href=\"{}\"><b>{}</b></a><br><i>{}</i><br>{}...</li><br><br>",
            encode_double_quoted_attribute(&e.link),
            encode_text(&e.title),
            encode_text(&e.published),
            encode_text(&preview),
        ));
    }
    html.push_str("</ul>");
    html
}
