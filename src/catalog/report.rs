//! End-of-run summary.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::progress::ProgressState;
use crate::catalog::store::CatalogStats;

/// What a run did, plus statistics over the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub pending: usize,
    pub attempted: usize,
    pub succeeded: usize,
    /// Items that failed in this run.
    pub failed: usize,
    /// Every failure recorded in the progress file, with its error message,
    /// whether or not this run attempted the item.
    pub failures: Vec<(String, String)>,
    /// Items marked processed across all runs.
    pub processed_total: usize,
    /// Failures still recorded in the progress file.
    pub outstanding_failures: usize,
    pub interrupted: bool,
    pub stats: CatalogStats,
    pub catalog_path: PathBuf,
}

impl RunReport {
    pub fn new(catalog_path: &Path) -> Self {
        Self {
            catalog_path: catalog_path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Summary of persisted state without a run: every recorded failure is
    /// listed.
    pub fn from_saved(progress: &ProgressState, stats: CatalogStats, catalog_path: &Path) -> Self {
        Self {
            discovered: progress.total_discovered,
            stats,
            ..Self::new(catalog_path)
        }
        .with_saved_state(progress)
    }

    /// Overall totals and the recorded failure list from `progress`.
    pub fn with_saved_state(mut self, progress: &ProgressState) -> Self {
        self.failures = progress
            .failed_repos
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.processed_total = progress.processed_repos.len();
        self.outstanding_failures = progress.failed_repos.len();
        self
    }

    /// Percentage of attempted items that succeeded.
    pub fn success_rate(&self) -> Option<f64> {
        (self.attempted > 0).then(|| self.succeeded as f64 * 100.0 / self.attempted as f64)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cataloging report")?;
        writeln!(f, "  discovered: {}", self.discovered)?;
        if self.attempted > 0 || self.pending > 0 {
            writeln!(f, "  pending this run: {}", self.pending)?;
            writeln!(
                f,
                "  succeeded: {}  failed: {}",
                self.succeeded,
                self.failed
            )?;
            if let Some(rate) = self.success_rate() {
                writeln!(f, "  success rate: {rate:.1}%")?;
            }
        }
        if self.interrupted {
            writeln!(f, "  run was interrupted; rerun to continue")?;
        }
        writeln!(
            f,
            "  processed overall: {}  outstanding failures: {}",
            self.processed_total, self.outstanding_failures
        )?;
        for (item, error) in &self.failures {
            writeln!(f, "    - {item}: {error}")?;
        }

        let s = &self.stats;
        writeln!(f, "  catalog: {}", self.catalog_path.display())?;
        writeln!(f, "    items: {}", s.total)?;
        writeln!(f, "    both bo and en: {}", s.both)?;
        writeln!(f, "    only bo: {}  only en: {}  neither: {}", s.only_bo, s.only_en, s.neither)?;
        if let Some(avg) = s.avg_bo_lines {
            writeln!(f, "    average bo lines: {avg:.1}")?;
        }
        if let Some(avg) = s.avg_en_lines {
            write!(f, "    average en lines: {avg:.1}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_over_attempted() {
        let report = RunReport {
            attempted: 4,
            succeeded: 3,
            ..RunReport::default()
        };
        assert_eq!(report.success_rate(), Some(75.0));
        assert_eq!(RunReport::default().success_rate(), None);
    }

    #[test]
    fn display_lists_failures() {
        let mut report = RunReport::new(Path::new("catalog.csv"));
        report.attempted = 2;
        report.succeeded = 1;
        report.failed = 1;
        report.failures.push(("TMx".into(), "root listing failed".into()));
        report.stats.avg_bo_lines = Some(12.34);
        let text = report.to_string();
        assert!(text.contains("succeeded: 1  failed: 1"));
        assert!(text.contains("success rate: 50.0%"));
        assert!(text.contains("- TMx: root listing failed"));
        assert!(text.contains("average bo lines: 12.3"));
    }

    #[test]
    fn saved_report_lists_recorded_failures() {
        let mut progress = ProgressState::new(20, Path::new("c.csv"));
        progress.mark_failed("TMa", "boom");
        progress.mark_processed("TMb");
        let report = RunReport::from_saved(&progress, CatalogStats::default(), Path::new("c.csv"));
        assert_eq!(report.failures, vec![("TMa".to_string(), "boom".to_string())]);
        assert_eq!(report.processed_total, 1);
        assert!(report.success_rate().is_none());
    }
}
