//! Rich diagnostic error types for the cataloger.
//!
//! Subsystems that live in their own module (text decoding, remote host,
//! discovery, title extraction) define their errors next to the code; the
//! persistence and configuration errors live here. [`CatalogError`] wraps
//! the ones that can abort an item or a run. Title extraction errors are
//! absorbed by the pipeline and only ever appear as provenance.

use miette::Diagnostic;
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::remote::FetchError;
use crate::text::DecodeError;

/// Top-level error type.
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("analysis of \"{item}\" failed: {message}")]
    #[diagnostic(
        code(tmcat::item::analysis),
        help("The item is recorded as failed; rerun with `--retry-failed` to try it again.")
    )]
    ItemAnalysis { item: String, message: String },
}

// ---------------------------------------------------------------------------
// Catalog output errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("catalog I/O error: {message}")]
    #[diagnostic(
        code(tmcat::store::io),
        help("Check that the data directory exists and is writable.")
    )]
    Io { message: String },

    #[error("malformed CSV in {path}: {message}")]
    #[diagnostic(
        code(tmcat::store::csv),
        help("The catalog is append-only; restore it from the latest checkpoint if it was edited by hand.")
    )]
    Csv { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Progress errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProgressError {
    #[error("progress I/O error: {message}")]
    #[diagnostic(
        code(tmcat::progress::io),
        help("Check that the state directory exists and is writable.")
    )]
    Io { message: String },

    #[error("progress file {path} is corrupt: {message}")]
    #[diagnostic(
        code(tmcat::progress::corrupt),
        help(
            "Refusing to start over silently. Fix the file by hand, or move it \
             aside to restart from scratch (processed items would be cataloged again)."
        )
    )]
    Corrupt { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    #[diagnostic(code(tmcat::config::io))]
    Io { path: String, message: String },

    #[error("invalid config {path}: {message}")]
    #[diagnostic(
        code(tmcat::config::parse),
        help("Run `tm-catalog config` to print the accepted keys with their defaults.")
    )]
    Parse { path: String, message: String },

    #[error("{name} is not set")]
    #[diagnostic(
        code(tmcat::config::missing_credential),
        help("Export {name} in the environment, or put it in a .env file sourced before running.")
    )]
    MissingCredential { name: String },

    #[error("cannot determine a home directory for default paths")]
    #[diagnostic(
        code(tmcat::config::no_home),
        help("Set HOME or pass --work-dir explicitly.")
    )]
    NoHome,
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type ProgressResult<T> = std::result::Result<T, ProgressError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
