//! XDG-compliant path resolution for tm-catalog.
//!
//! By default caches, run state, and catalog output go to the XDG cache,
//! state, and data directories. `--work-dir` puts all three under one root
//! instead, which is what tests and one-off runs use.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

const APP_DIR: &str = "tm-catalog";

/// Directories for one cataloging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    /// Discovery, mapping, and AI response caches.
    pub cache_dir: PathBuf,
    /// Progress file and logs.
    pub state_dir: PathBuf,
    /// Catalog and checkpoints.
    pub data_dir: PathBuf,
}

impl CatalogPaths {
    /// Resolve XDG directories from environment variables with standard
    /// fallbacks.
    pub fn resolve() -> ConfigResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::NoHome)?;

        let xdg = |var: &str, fallback: &str| {
            std::env::var(var)
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(fallback))
                .join(APP_DIR)
        };

        Ok(Self {
            cache_dir: xdg("XDG_CACHE_HOME", ".cache"),
            state_dir: xdg("XDG_STATE_HOME", ".local/state"),
            data_dir: xdg("XDG_DATA_HOME", ".local/share"),
        })
    }

    /// Everything under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            cache_dir: root.join("cache"),
            state_dir: root.join("state"),
            data_dir: root.join("data"),
        }
    }

    pub fn discovery_cache(&self) -> PathBuf {
        self.cache_dir.join("repository_cache.json")
    }

    pub fn mapping_cache(&self) -> PathBuf {
        self.cache_dir.join("tmx_title_cache.json")
    }

    pub fn ai_cache(&self) -> PathBuf {
        self.cache_dir.join("ai_title_cache.json")
    }

    pub fn progress_file(&self) -> PathBuf {
        self.state_dir.join("progress.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join("tm-catalog.log")
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.data_dir.join("checkpoints")
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.data_dir.join("tm_repos_catalog.csv")
    }

    /// Create every directory.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        for dir in [
            &self.cache_dir,
            &self.state_dir,
            &self.log_dir(),
            &self.data_dir,
            &self.checkpoint_dir(),
        ] {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}
