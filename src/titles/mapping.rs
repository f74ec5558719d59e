//! Structured title mapping built from the reference translation-memory corpus.
//!
//! The reference repository names its files
//! `Toh_<number>[-<part>]-<Title_With_Underscores>-v<version>[.bo.en].tmx`.
//! Each filename yields one `toh<number>[-<part>]` → English title entry,
//! which anchors the aligned line match for catalog items whose names embed
//! the same identifier (e.g. `TMtoh1-1_84000`).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::remote::{FileKind, RepositoryHost};
use crate::titles::error::{MappingError, MappingResult};

static TMX_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Toh_(\d+(?:-\d+)?)-(.+?)-v\d+(?:\.bo\.en)?\.tmx").expect("valid regex")
});

const IDENTIFIER_TAG: &str = "toh";

/// Normalized work identifier → English title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleMapping {
    entries: BTreeMap<String, String>,
}

/// On-disk layout of the mapping cache.
#[derive(Debug, Serialize, Deserialize)]
struct MappingCacheFile {
    tmx_mapping: BTreeMap<String, String>,
    last_updated: String,
    total_mappings: usize,
}

/// Parse one reference filename into `(identifier, title)`.
///
/// The name is percent-decoded first. Returns `None` for names that do not
/// follow the convention.
pub fn parse_reference_filename(filename: &str) -> Option<(String, String)> {
    let decoded = match urlencoding::decode(filename) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!(filename, error = %e, "could not percent-decode filename");
            filename.to_string()
        }
    };
    let caps = TMX_FILENAME.captures(&decoded)?;
    let identifier = format!("{IDENTIFIER_TAG}{}", &caps[1])
        .replace('_', "")
        .to_lowercase();
    let title = caps[2].replace('_', " ");
    Some((identifier, title))
}

impl TitleMapping {
    /// Build a mapping from reference filenames; last writer wins.
    pub fn build<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for name in filenames {
            match parse_reference_filename(name.as_ref()) {
                Some((id, title)) => {
                    entries.insert(id, title);
                }
                None => tracing::trace!(filename = name.as_ref(), "not a reference filename"),
            }
        }
        Self { entries }
    }

    /// List the reference repository's root and build from its `.tmx` files.
    pub fn fetch(host: &dyn RepositoryHost, reference_repo: &str) -> MappingResult<Self> {
        let files = host.list_root_files(reference_repo)?;
        let names: Vec<&str> = files
            .iter()
            .filter(|f| f.kind == FileKind::File && f.name.ends_with(".tmx"))
            .map(|f| f.name.as_str())
            .collect();
        tracing::info!(
            repo = reference_repo,
            tmx_files = names.len(),
            "listing reference translation memories"
        );
        let mapping = Self::build(names);
        tracing::info!(entries = mapping.len(), "built title mapping");
        Ok(mapping)
    }

    /// Reuse the cache at `cache_path` unless `rebuild` is set or it is
    /// missing; a freshly built mapping is written back to the cache.
    ///
    /// A failed build yields an empty mapping: the mapped tier then fails
    /// for every item and the pipeline falls through to the next tier.
    pub fn load_or_build(
        host: &dyn RepositoryHost,
        reference_repo: &str,
        cache_path: &Path,
        rebuild: bool,
    ) -> Self {
        if !rebuild && cache_path.exists() {
            match Self::load(cache_path) {
                Ok(mapping) => {
                    tracing::info!(entries = mapping.len(), path = %cache_path.display(), "loaded title mapping cache");
                    return mapping;
                }
                Err(e) => tracing::warn!(error = %e, "title mapping cache unreadable, rebuilding"),
            }
        }

        match Self::fetch(host, reference_repo) {
            Ok(mapping) => {
                if let Err(e) = mapping.save(cache_path) {
                    tracing::warn!(error = %e, "failed to save title mapping cache");
                }
                mapping
            }
            Err(e) => {
                tracing::warn!(error = %e, "title mapping build failed, continuing without it");
                Self::default()
            }
        }
    }

    /// Load a previously saved mapping.
    pub fn load(path: &Path) -> MappingResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| MappingError::CacheIo {
            message: format!("read {}: {e}", path.display()),
        })?;
        let file: MappingCacheFile =
            serde_json::from_str(&data).map_err(|e| MappingError::CacheIo {
                message: format!("parse {}: {e}", path.display()),
            })?;
        Ok(Self {
            entries: file.tmx_mapping,
        })
    }

    /// Persist the mapping as JSON.
    pub fn save(&self, path: &Path) -> MappingResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MappingError::CacheIo {
                message: format!("create dir {}: {e}", parent.display()),
            })?;
        }
        let file = MappingCacheFile {
            tmx_mapping: self.entries.clone(),
            last_updated: chrono::Local::now().to_rfc3339(),
            total_mappings: self.entries.len(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| MappingError::CacheIo {
            message: format!("serialize mapping: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| MappingError::CacheIo {
            message: format!("write {}: {e}", path.display()),
        })?;
        tracing::info!(entries = self.entries.len(), path = %path.display(), "saved title mapping cache");
        Ok(())
    }

    /// Title for the longest identifier contained in `item_name`
    /// (case-insensitive). Equal-length matches resolve to the
    /// lexicographically smallest identifier.
    pub fn lookup(&self, item_name: &str) -> Option<&str> {
        let name = item_name.to_lowercase();
        let (id, title) = self
            .entries
            .iter()
            .filter(|(id, _)| name.contains(id.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))?;
        tracing::debug!(item = item_name, identifier = %id, title = %title, "title mapping hit");
        Some(title.as_str())
    }

    pub fn insert(&mut self, identifier: impl Into<String>, title: impl Into<String>) {
        self.entries.insert(identifier.into(), title.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
