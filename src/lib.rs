// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # tm-catalog
//!
//! Catalogs bilingual Tibetan/English translation-memory repositories hosted
//! in one GitHub organization: finds each item's `bo` and `en` text files,
//! counts their lines, resolves a title pair, and records where every value
//! came from.
//!
//! ## Architecture
//!
//! - **Discovery** (`discovery`): many narrow name searches, deduplicated by id, cached
//! - **Titles** (`titles`): structured mapping → AI extraction → position matching
//! - **Catalog** (`catalog`): per-item analysis, CSV output with checkpoints, resumable runs
//! - **Remote** (`remote`): the repository host behind a trait, GitHub over `ureq`
//!
//! ## Library usage
//!
//! ```no_run
//! use tm_catalog::catalog::{CatalogRunner, ItemAnalyzer, RunOptions};
//! use tm_catalog::discovery::DiscoveryEngine;
//! use tm_catalog::paths::CatalogPaths;
//! use tm_catalog::remote::{GitHubConfig, GitHubHost};
//! use tm_catalog::text::{LineCountMode, TextEncoding};
//! use tm_catalog::titles::{TitleMapping, TitlePipeline};
//!
//! let paths = CatalogPaths::under(std::path::Path::new("work"));
//! let host = GitHubHost::new(GitHubConfig::default());
//! let discovery = DiscoveryEngine::new(&host, "MonlamAI", "TM", paths.discovery_cache());
//! let analyzer = ItemAnalyzer::new(&host, TextEncoding::DEFAULT_ORDER.to_vec(), LineCountMode::NonEmpty);
//! let pipeline = TitlePipeline::new(TitleMapping::default(), None);
//! let mut runner = CatalogRunner::new(analyzer, pipeline, &paths, RunOptions::default()).unwrap();
//! let report = runner.run(&discovery).unwrap();
//! println!("{report}");
//! ```

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod paths;
pub mod remote;
pub mod text;
pub mod titles;
