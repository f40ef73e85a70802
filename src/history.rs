//! Recent-query history, most recent first.
//!
//! [`HistoryLog`] is the in-memory list; [`HistoryStore`] persists it to
//! `search_history.json` under the data directory. The file is a JSON array
//! of `{id, query, timestamp, mode}` objects with `timestamp` in epoch
//! milliseconds.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scout_search::QualityMode;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Maximum number of remembered queries.
pub const MAX_HISTORY: usize = 15;

/// One remembered query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub query: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub mode: QualityMode,
}

/// Bounded, case-insensitively unique list of recent queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    items: Vec<HistoryItem>,
}

impl HistoryLog {
    /// Build a log from persisted items, enforcing the cap and uniqueness.
    pub fn from_items(items: Vec<HistoryItem>) -> Self {
        let mut log = Self::default();
        for item in items {
            let key = item.query.trim().to_lowercase();
            if key.is_empty() || log.items.iter().any(|i| i.query.to_lowercase() == key) {
                continue;
            }
            log.items.push(item);
            if log.items.len() == MAX_HISTORY {
                break;
            }
        }
        log
    }

    /// Remember `query`, replacing any earlier entry with the same text.
    ///
    /// Returns `None` for a blank query.
    pub fn record(&mut self, query: &str, mode: QualityMode, now: DateTime<Utc>) -> Option<HistoryItem> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let key = query.to_lowercase();
        self.items.retain(|i| i.query.to_lowercase() != key);

        let item = HistoryItem {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.to_owned(),
            timestamp: now.timestamp_millis(),
            mode,
        };
        self.items.insert(0, item.clone());
        self.items.truncate(MAX_HISTORY);
        Some(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Up to `n` most recent items.
    pub fn recent(&self, n: usize) -> &[HistoryItem] {
        &self.items[..n.min(self.items.len())]
    }

    pub fn find(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// File-backed [`HistoryLog`].
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    log: HistoryLog,
}

impl HistoryStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty log. A file that does not decode is
    /// logged and ignored; it is overwritten on the next save.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    log: HistoryLog::default(),
                });
            }
            Err(e) => {
                return Err(AppError::History(format!(
                    "failed to read history file {}: {e}",
                    path.display()
                )));
            }
        };

        let log = match serde_json::from_slice::<Vec<HistoryItem>>(&bytes) {
            Ok(items) => HistoryLog::from_items(items),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring malformed search history"
                );
                HistoryLog::default()
            }
        };
        Ok(Self { path, log })
    }

    /// Open the store at the default location.
    ///
    /// # Errors
    ///
    /// Same as [`HistoryStore::open`].
    pub fn open_default() -> Result<Self> {
        Self::open(crate::scout_dirs::history_file())
    }

    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `query` and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    pub fn record(&mut self, query: &str, mode: QualityMode) -> Result<Option<HistoryItem>> {
        let item = self.log.record(query, mode, Utc::now());
        if item.is_some() {
            self.save()?;
        }
        Ok(item)
    }

    /// Forget everything and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    pub fn clear(&mut self) -> Result<()> {
        self.log.clear();
        self.save()
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, self.log.items())
    }
}

/// Serialize `value` and atomically replace `path` with it.
///
/// Writes a sibling temp file, syncs it, then renames over the target.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let encoded = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::History(format!("failed serializing {}: {e}", path.display())))?;

    let tmp_path = path.with_extension("json.tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)
        .map_err(|e| {
            AppError::History(format!("failed opening temp file {}: {e}", tmp_path.display()))
        })?;
    file.write_all(&encoded).map_err(|e| {
        AppError::History(format!("failed writing temp file {}: {e}", tmp_path.display()))
    })?;
    file.sync_all().map_err(|e| {
        AppError::History(format!("failed syncing temp file {}: {e}", tmp_path.display()))
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        AppError::History(format!(
            "failed promoting temp file {} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;
    Ok(())
}
