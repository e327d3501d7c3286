//! Append-only text logs kept in the output directory.
//!
//! [`DedupLedger`] is the set of identifiers already acquired, one per line.
//! [`AppendLog`] backs the error log and the post-processing outcome log.
//! Neither is ever rewritten; state is rebuilt by reading the lines back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Errors that can occur while reading or appending to a log.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to read {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to {path}")]
    AppendFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A line-oriented file that is only ever appended to.
#[derive(Debug, Clone)]
pub struct AppendLog {
    path: PathBuf,
}

impl AppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file if it does not exist yet.
    pub async fn touch(&self) -> Result<(), LedgerError> {
        self.open().await.map(|_| ())
    }

    /// Appends `line` followed by a newline.
    pub async fn append(&self, line: &str) -> Result<(), LedgerError> {
        let mut file = self.open().await?;
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())
            .await
            .map_err(|source| self.append_failed(source))?;
        file.flush().await.map_err(|source| self.append_failed(source))
    }

    /// Every non-empty line, trimmed. A missing file reads as empty.
    pub async fn read_lines(&self) -> Result<Vec<String>, LedgerError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LedgerError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn open(&self) -> Result<fs::File, LedgerError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.append_failed(source))
    }

    fn append_failed(&self, source: std::io::Error) -> LedgerError {
        LedgerError::AppendFailed {
            path: self.path.clone(),
            source,
        }
    }
}

/// Identifiers already acquired.
///
/// Entries are never removed. Only the driver appends, so there is no
/// cross-process locking.
#[derive(Debug)]
pub struct DedupLedger {
    log: AppendLog,
    seen: HashSet<String>,
}

impl DedupLedger {
    /// Loads the ledger at `path`, treating a missing file as empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let log = AppendLog::new(path);
        let seen: HashSet<String> = log.read_lines().await?.into_iter().collect();
        debug!(path = %log.path().display(), entries = seen.len(), "Loaded ledger");
        Ok(Self { log, seen })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Appends `id` unless it is already present. Returns whether it was new.
    pub async fn record(&mut self, id: &str) -> Result<bool, LedgerError> {
        if self.seen.contains(id) {
            return Ok(false);
        }
        self.log.append(id).await?;
        self.seen.insert(id.to_string());
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }
}
