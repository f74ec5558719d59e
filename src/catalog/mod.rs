//! Catalog production: per-item analysis, durable output, and the
//! resumable run loop.

pub mod analyze;
pub mod model;
pub mod progress;
pub mod report;
pub mod runner;
pub mod store;

pub use analyze::{ItemAnalyzer, select_text_file};
pub use model::CatalogEntry;
pub use progress::ProgressState;
pub use report::RunReport;
pub use runner::{CatalogRunner, RunMode, RunOptions, RunPhase};
pub use store::{CatalogStats, CatalogWriter, load_exclusions, read_entries};
