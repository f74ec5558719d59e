//! Durable record of which items are done and which failed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProgressError, ProgressResult};

/// Progress persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub session_id: String,
    #[serde(default)]
    pub total_discovered: usize,
    #[serde(default)]
    pub processed_repos: BTreeSet<String>,
    /// Item name → last error message.
    #[serde(default)]
    pub failed_repos: BTreeMap<String, String>,
    #[serde(default)]
    pub last_processed_time: Option<String>,
    #[serde(default)]
    pub batch_size: usize,
    #[serde(default)]
    pub output_csv: String,
}

impl ProgressState {
    /// Fresh state for a new session.
    pub fn new(batch_size: usize, output_csv: &Path) -> Self {
        Self {
            session_id: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
            total_discovered: 0,
            processed_repos: BTreeSet::new(),
            failed_repos: BTreeMap::new(),
            last_processed_time: None,
            batch_size,
            output_csv: output_csv.display().to_string(),
        }
    }

    /// Load the progress file, or start fresh when it does not exist.
    ///
    /// An unreadable or unparseable file is an error.
    pub fn load_or_new(path: &Path, batch_size: usize, output_csv: &Path) -> ProgressResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no progress file, starting fresh");
            return Ok(Self::new(batch_size, output_csv));
        }
        let data = std::fs::read_to_string(path).map_err(|e| ProgressError::Io {
            message: format!("read {}: {e}", path.display()),
        })?;
        let mut state: Self = serde_json::from_str(&data).map_err(|e| ProgressError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        state.batch_size = batch_size;
        state.output_csv = output_csv.display().to_string();
        tracing::info!(
            session = %state.session_id,
            processed = state.processed_repos.len(),
            failed = state.failed_repos.len(),
            "resuming from progress file"
        );
        Ok(state)
    }

    /// Write to `path` via a temporary file and rename, so a crash never
    /// leaves a half-written progress file.
    pub fn save(&self, path: &Path) -> ProgressResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProgressError::Io {
                message: format!("create dir {}: {e}", parent.display()),
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ProgressError::Io {
            message: format!("serialize progress: {e}"),
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ProgressError::Io {
            message: format!("write {}: {e}", tmp.display()),
        })?;
        std::fs::rename(&tmp, path).map_err(|e| ProgressError::Io {
            message: format!("rename {} -> {}: {e}", tmp.display(), path.display()),
        })
    }

    pub fn is_processed(&self, item: &str) -> bool {
        self.processed_repos.contains(item)
    }

    /// Record `item` as done. A failure recorded earlier is dropped here and
    /// not before, so a retried item stays listed as failed until its row is
    /// on disk.
    pub fn mark_processed(&mut self, item: &str) {
        self.processed_repos.insert(item.to_string());
        self.failed_repos.remove(item);
        self.touch();
    }

    pub fn mark_failed(&mut self, item: &str, error: impl Into<String>) {
        self.failed_repos.insert(item.to_string(), error.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.last_processed_time = Some(chrono::Local::now().to_rfc3339());
    }
}
