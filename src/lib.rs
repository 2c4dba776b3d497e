// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod relevance;
pub mod seen;

// ---- Re-exports for stable public API ----
pub use crate::error::{Error, Result};
pub use crate::ingest::types::{Entry, FeedSource};
pub use crate::notify::Notifier;
pub use crate::pipeline::{run_once, RunReport, RunState};
pub use crate::relevance::{filter, RelevancePolicy, Verdict};
pub use crate::seen::{FileSeenStore, MemorySeenStore, SeenStore};
