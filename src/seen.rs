//! seen.rs — append-only record of identifiers already mailed.
//!
//! On disk: UTF-8, one identifier per line, newline-terminated. Single process,
//! single run; there is no locking, so concurrent runs against one file are unsupported.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_SEEN_IDS_PATH: &str = "seen_ids.txt";
pub const ENV_SEEN_IDS_PATH: &str = "SEEN_IDS_PATH";

pub trait SeenStore {
    /// All known ids. No prior state is an empty set, not an error.
    fn load(&self) -> Result<HashSet<String>>;
    /// Add ids; never removes or rewrites existing ones.
    fn append(&self, ids: &[String]) -> Result<()>;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileSeenStore {
    path: PathBuf,
}

impl FileSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file exists, is non-empty and its last byte is not `\n`.
    fn needs_leading_newline(&self) -> Result<bool> {
        let mut f = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e).context("opening seen ids for inspection"),
        };
        let len = f.metadata().context("stat seen ids")?.len();
        if len == 0 {
            return Ok(false);
        }
        f.seek(SeekFrom::End(-1)).context("seek seen ids")?;
        let mut last = [0u8; 1];
        f.read_exact(&mut last).context("read seen ids tail")?;
        Ok(last[0] != b'\n')
    }
}

impl SeenStore for FileSeenStore {
    fn load(&self) -> Result<HashSet<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading seen ids from {}", self.path.display()))
            }
        };
        let seen: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(target: "pipeline", count = seen.len(), path = %self.path.display(), "loaded seen ids");
        Ok(seen)
    }

    fn append(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        // Build the whole chunk first so it lands in one write.
        let mut buf = String::new();
        if self.needs_leading_newline()? {
            buf.push('\n');
        }
        for id in ids {
            buf.push_str(id);
            buf.push('\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {} for append", self.path.display()))?;
        f.write_all(buf.as_bytes()).context("writing seen ids")?;
        f.sync_all().context("syncing seen ids")?;

        tracing::debug!(target: "pipeline", count = ids.len(), path = %self.path.display(), "saved new ids");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    ids: Mutex<Vec<String>>,
    fail_append: bool,
}

impl MemorySeenStore {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
            fail_append: false,
        }
    }

    /// Every `append` fails; `load` still works.
    pub fn failing_append(mut self) -> Self {
        self.fail_append = true;
        self
    }

    /// Raw contents in append order (duplicates included).
    pub fn snapshot(&self) -> Vec<String> {
        self.ids.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl SeenStore for MemorySeenStore {
    fn load(&self) -> Result<HashSet<String>> {
        Ok(self.snapshot().into_iter().collect())
    }

    fn append(&self, ids: &[String]) -> Result<()> {
        if self.fail_append {
            anyhow::bail!("memory store configured to fail");
        }
        let mut v = self
            .ids
            .lock()
            .map_err(|_| anyhow::anyhow!("seen store mutex poisoned"))?;
        v.extend(ids.iter().cloned());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
