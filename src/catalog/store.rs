//! Catalog CSV output, per-batch checkpoints, and statistics.

use std::collections::{BTreeSet, HashMap};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::model::CatalogEntry;
use crate::error::{StoreError, StoreResult};

const CHECKPOINT_PREFIX: &str = "checkpoint_";

fn csv_error(path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn io_error(action: &str, path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::Io {
        message: format!("{action} {}: {e}", path.display()),
    }
}

/// Number in a `checkpoint_NNNN.csv` filename.
fn checkpoint_number(name: &str) -> Option<u32> {
    name.strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(".csv")?
        .parse()
        .ok()
}

/// Appends batches to the catalog and writes one checkpoint per batch.
#[derive(Debug)]
pub struct CatalogWriter {
    catalog_path: PathBuf,
    checkpoint_dir: PathBuf,
    next_checkpoint: u32,
}

impl CatalogWriter {
    /// Prepare output under the given paths. Checkpoint numbering
    /// continues after the highest checkpoint already on disk.
    pub fn open(catalog_path: &Path, checkpoint_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(checkpoint_dir)
            .map_err(|e| io_error("create dir", checkpoint_dir, e))?;
        if let Some(parent) = catalog_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error("create dir", parent, e))?;
        }

        let mut highest = 0;
        let dir = std::fs::read_dir(checkpoint_dir)
            .map_err(|e| io_error("read dir", checkpoint_dir, e))?;
        for entry in dir {
            let entry = entry.map_err(|e| io_error("read dir", checkpoint_dir, e))?;
            if let Some(n) = entry.file_name().to_str().and_then(checkpoint_number) {
                highest = highest.max(n);
            }
        }

        Ok(Self {
            catalog_path: catalog_path.to_path_buf(),
            checkpoint_dir: checkpoint_dir.to_path_buf(),
            next_checkpoint: highest + 1,
        })
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Append rows to the catalog, writing the header only when the file
    /// is new or empty.
    pub fn append_batch(&self, entries: &[CatalogEntry]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let is_new = std::fs::metadata(&self.catalog_path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.catalog_path)
            .map_err(|e| io_error("open", &self.catalog_path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        for entry in entries {
            writer
                .serialize(entry)
                .map_err(|e| csv_error(&self.catalog_path, e))?;
        }
        writer
            .flush()
            .map_err(|e| io_error("flush", &self.catalog_path, e))?;
        tracing::info!(
            rows = entries.len(),
            created = is_new,
            path = %self.catalog_path.display(),
            "catalog batch written"
        );
        Ok(())
    }

    /// Write `entries` to the next numbered checkpoint file.
    pub fn write_checkpoint(&mut self, entries: &[CatalogEntry]) -> StoreResult<PathBuf> {
        let path = self
            .checkpoint_dir
            .join(format!("{CHECKPOINT_PREFIX}{:04}.csv", self.next_checkpoint));
        let mut writer = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;
        for entry in entries {
            writer.serialize(entry).map_err(|e| csv_error(&path, e))?;
        }
        writer.flush().map_err(|e| io_error("flush", &path, e))?;
        self.next_checkpoint += 1;
        tracing::info!(path = %path.display(), rows = entries.len(), "checkpoint saved");
        Ok(path)
    }
}

/// Every row of a catalog or checkpoint file, in file order.
pub fn read_entries(path: &Path) -> StoreResult<Vec<CatalogEntry>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<CatalogEntry>, _>>()
        .map_err(|e| csv_error(path, e))
}

#[derive(Deserialize)]
struct ExclusionRow {
    file_name: String,
}

/// Item names listed in the `file_name` column of an exclusion CSV.
pub fn load_exclusions(path: &Path) -> StoreResult<BTreeSet<String>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    let mut names = BTreeSet::new();
    for row in reader.deserialize::<ExclusionRow>() {
        let row = row.map_err(|e| csv_error(path, e))?;
        let name = row.file_name.trim();
        if !name.is_empty() {
            names.insert(name.to_string());
        }
    }
    tracing::info!(count = names.len(), path = %path.display(), "loaded exclusion list");
    Ok(names)
}

/// Summary of a catalog's content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogStats {
    pub total: usize,
    pub both: usize,
    pub only_bo: usize,
    pub only_en: usize,
    pub neither: usize,
    /// Mean over entries with a non-zero count.
    pub avg_bo_lines: Option<f64>,
    pub avg_en_lines: Option<f64>,
}

impl CatalogStats {
    /// Statistics over the latest row of each item.
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut latest: HashMap<&str, &CatalogEntry> = HashMap::new();
        for entry in entries {
            latest.insert(entry.repo_name.as_str(), entry);
        }

        let mut stats = Self {
            total: latest.len(),
            ..Self::default()
        };
        let (mut bo_sum, mut bo_n, mut en_sum, mut en_n) = (0u64, 0u64, 0u64, 0u64);
        for entry in latest.values() {
            match (entry.has_bo(), entry.has_en()) {
                (true, true) => stats.both += 1,
                (true, false) => stats.only_bo += 1,
                (false, true) => stats.only_en += 1,
                (false, false) => stats.neither += 1,
            }
            if entry.bo_lines > 0 {
                bo_sum += entry.bo_lines;
                bo_n += 1;
            }
            if entry.en_lines > 0 {
                en_sum += entry.en_lines;
                en_n += 1;
            }
        }
        let mean = |sum: u64, n: u64| (n > 0).then(|| sum as f64 / n as f64);
        stats.avg_bo_lines = mean(bo_sum, bo_n);
        stats.avg_en_lines = mean(en_sum, en_n);
        stats
    }

    /// Statistics for the catalog file at `path`; empty when it does not
    /// exist yet.
    pub fn from_catalog(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(Self::from_entries(&read_entries(path)?))
    }
}
