//! Error types for title extraction.

use miette::Diagnostic;
use thiserror::Error;

/// Why one extraction tier produced no usable title pair.
///
/// These never escape the pipeline: each one is recorded in the item's
/// provenance trail and the next tier is tried.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ExtractionFailure {
    #[error("no title mapping matches \"{item}\"")]
    #[diagnostic(
        code(tmcat::titles::no_mapping),
        help("Rebuild the title mapping with `tm-catalog mapping --rebuild` if the reference corpus changed.")
    )]
    NoMapping { item: String },

    #[error("mapped title \"{title}\" not found in the first {searched} English lines")]
    #[diagnostic(code(tmcat::titles::title_not_found))]
    TitleNotFound { title: String, searched: usize },

    #[error("line {line} is not present in the Tibetan text ({available} lines)")]
    #[diagnostic(code(tmcat::titles::line_out_of_range))]
    LineOutOfRange { line: usize, available: usize },

    #[error("extractor unavailable")]
    #[diagnostic(
        code(tmcat::titles::unavailable),
        help("Set GEMINI_API_KEY and enable `[ai]` in the config to use AI-assisted extraction.")
    )]
    Unavailable,

    #[error("incomplete result (tibetan: {bo_found}, english: {en_found})")]
    #[diagnostic(code(tmcat::titles::incomplete))]
    Incomplete { bo_found: bool, en_found: bool },
}

/// Errors from the AI backend and its response cache.
#[derive(Debug, Error, Diagnostic)]
pub enum AiError {
    #[error("AI request failed: {message}")]
    #[diagnostic(
        code(tmcat::ai::request_failed),
        help("Check the API key, the model name, and network access.")
    )]
    RequestFailed { message: String },

    #[error("AI request returned HTTP {status}: {message}")]
    #[diagnostic(
        code(tmcat::ai::status),
        help("A 429 means the quota is exhausted; rerun later, cached responses are kept.")
    )]
    Status { status: u16, message: String },

    #[error("failed to parse AI response: {message}")]
    #[diagnostic(
        code(tmcat::ai::parse_error),
        help("The model returned an unexpected response format.")
    )]
    ParseError { message: String },

    #[error("AI response cache I/O error: {message}")]
    #[diagnostic(
        code(tmcat::ai::cache_io),
        help("Check that the cache directory exists and is writable.")
    )]
    CacheIo { message: String },
}

/// Errors from building or persisting the title mapping.
#[derive(Debug, Error, Diagnostic)]
pub enum MappingError {
    #[error("title mapping cache I/O error: {message}")]
    #[diagnostic(
        code(tmcat::mapping::cache_io),
        help("Delete the cache file to force a rebuild, or check directory permissions.")
    )]
    CacheIo { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] crate::remote::FetchError),
}

pub type AiResult<T> = std::result::Result<T, AiError>;
pub type MappingResult<T> = std::result::Result<T, MappingError>;
