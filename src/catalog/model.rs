//! One catalog row.

use serde::{Deserialize, Serialize};

/// Metadata recorded for one item. Column order is the CSV order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub repo_name: String,
    pub repo_url: String,
    pub bo_file_path: Option<String>,
    #[serde(default)]
    pub bo_lines: u64,
    #[serde(default)]
    pub bo_title: String,
    pub en_file_path: Option<String>,
    #[serde(default)]
    pub en_lines: u64,
    #[serde(default)]
    pub en_title: String,
    #[serde(default)]
    pub notes: String,
}

impl CatalogEntry {
    pub fn new(repo_name: impl Into<String>, repo_url: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.into(),
            repo_url: repo_url.into(),
            ..Self::default()
        }
    }

    /// Row recorded when analysis of the item failed outright.
    pub fn failed(
        repo_name: impl Into<String>,
        repo_url: impl Into<String>,
        error: &str,
    ) -> Self {
        Self {
            notes: format!("Processing failed: {error}"),
            ..Self::new(repo_name, repo_url)
        }
    }

    pub fn has_bo(&self) -> bool {
        self.bo_file_path.is_some()
    }

    pub fn has_en(&self) -> bool {
        self.en_file_path.is_some()
    }
}
