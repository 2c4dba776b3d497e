//! Run-level error taxonomy.
//!
//! Collaborators (fetcher, notifier, store) report `anyhow` errors with context;
//! the pipeline classifies them here by the stage they happened in.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration missing or malformed. Raised before any network I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// Seen-ID file exists but could not be read.
    #[error("failed to load seen ids from {}: {reason:#}", .path.display())]
    StoreRead {
        path: PathBuf,
        reason: anyhow::Error,
    },

    /// Catalog unreachable or returned a payload we could not parse.
    #[error("fetch failure: {0:#}")]
    Fetch(anyhow::Error),

    /// Transport, authentication or send error.
    #[error("delivery failure: {0:#}")]
    Delivery(anyhow::Error),

    /// New ids could not be persisted after a successful send.
    #[error("failed to persist seen ids (digest was already sent): {0:#}")]
    StoreWrite(anyhow::Error),
}

impl Error {
    /// Short label for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::StoreRead { .. } => "store_read",
            Error::Fetch(_) => "fetch",
            Error::Delivery(_) => "delivery",
            Error::StoreWrite(_) => "store_write",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
