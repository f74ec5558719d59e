//! The resumable cataloging loop.
//!
//! ```text
//! Idle → Discovering → SelectingPending → ProcessingItem → (BatchFlush | ErrorRecorded) → … → FinalReport → Idle
//! ```
//!
//! Durable state after any interruption: the catalog holds every flushed
//! batch, each batch has its checkpoint, and the progress file lists as
//! processed exactly the items whose rows were flushed. Items analyzed but
//! not yet flushed are re-attempted by the next run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::catalog::analyze::ItemAnalyzer;
use crate::catalog::model::CatalogEntry;
use crate::catalog::progress::ProgressState;
use crate::catalog::report::RunReport;
use crate::catalog::store::{CatalogStats, CatalogWriter};
use crate::discovery::DiscoveryEngine;
use crate::error::CatalogResult;
use crate::paths::CatalogPaths;
use crate::remote::RemoteItem;
use crate::titles::TitlePipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Discovering,
    SelectingPending,
    ProcessingItem,
    BatchFlush,
    ErrorRecorded,
    FinalReport,
}

/// Which items a run picks up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Everything not yet processed.
    #[default]
    Normal,
    /// Only items that failed before this run started.
    RetryFailed,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Keep only the first N discovered candidates.
    pub limit: Option<usize>,
    pub batch_size: usize,
    /// Pause after each successful item.
    pub item_pause: Duration,
    /// Names skipped in normal mode; never written to progress.
    pub exclusions: BTreeSet<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Normal,
            limit: None,
            batch_size: 20,
            item_pause: Duration::from_millis(1000),
            exclusions: BTreeSet::new(),
        }
    }
}

/// Drives one cataloging session.
pub struct CatalogRunner<'a> {
    analyzer: ItemAnalyzer<'a>,
    pipeline: TitlePipeline,
    options: RunOptions,
    progress: ProgressState,
    progress_path: PathBuf,
    writer: CatalogWriter,
    batch: Vec<CatalogEntry>,
    /// Successful items whose rows are still in `batch`.
    unflushed: Vec<String>,
    phase: RunPhase,
    interrupt: Arc<AtomicBool>,
}

impl<'a> CatalogRunner<'a> {
    /// Load progress and prepare output under `paths`.
    pub fn new(
        analyzer: ItemAnalyzer<'a>,
        pipeline: TitlePipeline,
        paths: &CatalogPaths,
        options: RunOptions,
    ) -> CatalogResult<Self> {
        let catalog_path = paths.catalog_file();
        let progress_path = paths.progress_file();
        let progress =
            ProgressState::load_or_new(&progress_path, options.batch_size, &catalog_path)?;
        let writer = CatalogWriter::open(&catalog_path, &paths.checkpoint_dir())?;
        Ok(Self {
            analyzer,
            pipeline,
            options,
            progress,
            progress_path,
            writer,
            batch: Vec::new(),
            unflushed: Vec::new(),
            phase: RunPhase::Idle,
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Stop before the next item once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn catalog_path(&self) -> &Path {
        self.writer.catalog_path()
    }

    fn set_phase(&mut self, phase: RunPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "phase transition");
            self.phase = phase;
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    /// Discover candidates and catalog the pending ones.
    pub fn run(&mut self, discovery: &DiscoveryEngine<'_>) -> CatalogResult<RunReport> {
        self.set_phase(RunPhase::Discovering);
        let candidates = match discovery.discover() {
            Ok(candidates) => candidates,
            Err(e) => {
                self.set_phase(RunPhase::Idle);
                return Err(e.into());
            }
        };
        self.run_candidates(candidates)
    }

    /// Catalog the pending subset of an already discovered candidate list.
    pub fn run_candidates(&mut self, mut candidates: Vec<RemoteItem>) -> CatalogResult<RunReport> {
        if let Some(limit) = self.options.limit {
            tracing::info!(limit, "limiting run to the first candidates");
            candidates.truncate(limit);
        }
        self.progress.total_discovered = candidates.len();

        self.set_phase(RunPhase::SelectingPending);
        let pending = self.select_pending(&candidates);

        let mut report = RunReport::new(self.writer.catalog_path());
        report.discovered = candidates.len();
        report.pending = pending.len();

        let total = pending.len();
        for (i, item) in pending.iter().enumerate() {
            if self.interrupted() {
                tracing::warn!(remaining = total - i, "interrupted, stopping before next item");
                report.interrupted = true;
                break;
            }

            self.set_phase(RunPhase::ProcessingItem);
            tracing::info!(item = %item.name, n = i + 1, total, "processing");
            report.attempted += 1;

            let succeeded = match self.analyzer.analyze(item, &mut self.pipeline) {
                Ok(entry) => {
                    self.batch.push(entry);
                    self.unflushed.push(item.name.clone());
                    report.succeeded += 1;
                    true
                }
                Err(e) => {
                    self.set_phase(RunPhase::ErrorRecorded);
                    let message = e.to_string();
                    tracing::error!(item = %item.name, error = %message, "item failed");
                    self.progress.mark_failed(&item.name, message.clone());
                    self.progress.save(&self.progress_path)?;
                    self.batch
                        .push(CatalogEntry::failed(&item.name, &item.url, &message));
                    report.failed += 1;
                    false
                }
            };

            if self.batch.len() >= self.options.batch_size {
                self.flush()?;
            }

            let more = i + 1 < total;
            if succeeded && more && !self.options.item_pause.is_zero() && !self.interrupted() {
                std::thread::sleep(self.options.item_pause);
            }
        }

        self.flush()?;
        self.progress.save(&self.progress_path)?;

        self.set_phase(RunPhase::FinalReport);
        report = report.with_saved_state(&self.progress);
        report.stats = CatalogStats::from_catalog(self.writer.catalog_path())?;
        tracing::info!("{report}");
        self.set_phase(RunPhase::Idle);
        Ok(report)
    }

    /// Candidates to process in this run, in discovery order.
    fn select_pending(&self, candidates: &[RemoteItem]) -> Vec<RemoteItem> {
        let pending: Vec<RemoteItem> = match self.options.mode {
            RunMode::Normal => {
                let excluded = candidates
                    .iter()
                    .filter(|c| self.options.exclusions.contains(&c.name))
                    .count();
                if excluded > 0 {
                    tracing::info!(excluded, "skipping items on the exclusion list");
                }
                candidates
                    .iter()
                    .filter(|c| !self.progress.is_processed(&c.name))
                    .filter(|c| !self.options.exclusions.contains(&c.name))
                    .cloned()
                    .collect()
            }
            RunMode::RetryFailed => {
                let snapshot: BTreeSet<String> =
                    self.progress.failed_repos.keys().cloned().collect();
                candidates
                    .iter()
                    .filter(|c| snapshot.contains(&c.name))
                    .cloned()
                    .collect()
            }
        };
        tracing::info!(
            mode = ?self.options.mode,
            discovered = candidates.len(),
            processed = self.progress.processed_repos.len(),
            failed = self.progress.failed_repos.len(),
            pending = pending.len(),
            "pending items selected"
        );
        pending
    }

    /// Append the buffer to the catalog, checkpoint it, and record its
    /// successful items as processed.
    fn flush(&mut self) -> CatalogResult<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.set_phase(RunPhase::BatchFlush);
        self.writer.append_batch(&self.batch)?;
        self.writer.write_checkpoint(&self.batch)?;
        for name in self.unflushed.drain(..) {
            self.progress.mark_processed(&name);
        }
        self.progress.save(&self.progress_path)?;
        tracing::info!(
            rows = self.batch.len(),
            processed = self.progress.processed_repos.len(),
            "batch flushed"
        );
        self.batch.clear();
        Ok(())
    }
}
