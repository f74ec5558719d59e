//! Remote repository host: search, root listing, and content download.
//!
//! The cataloger only talks to the host through [`RepositoryHost`], so
//! tests can drive the whole run with an in-memory implementation.

pub mod github;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use github::{GitHubConfig, GitHubHost};

/// Errors from the remote host.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    #[diagnostic(
        code(tmcat::remote::status),
        help("403 usually means the rate limit is exhausted or GITHUB_TOKEN lacks access.")
    )]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    #[diagnostic(
        code(tmcat::remote::transport),
        help("Check network connectivity and the configured API base.")
    )]
    Transport { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    #[diagnostic(code(tmcat::remote::body))]
    Body { url: String, message: String },

    #[error("{url} exceeds the {limit} byte download limit")]
    #[diagnostic(
        code(tmcat::remote::too_large),
        help("Only the parallel text files are fetched; very large files are skipped.")
    )]
    TooLarge { url: String, limit: u64 },

    #[error("no such item or file: {what}")]
    #[diagnostic(code(tmcat::remote::not_found))]
    NotFound { what: String },
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// One repository returned by a name search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Stable numeric id, used for deduplication.
    pub id: u64,
    pub name: String,
    #[serde(rename = "html_url")]
    pub url: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Other,
}

impl FileKind {
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "file" => Self::File,
            "dir" => Self::Dir,
            _ => Self::Other,
        }
    }
}

/// One entry of a repository's root listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub path: String,
    pub kind: FileKind,
    pub download_url: Option<String>,
}

impl RemoteFile {
    pub fn file(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            kind: FileKind::File,
            download_url: Some(download_url.into()),
        }
    }
}

/// The operations the cataloger needs from a repository host.
pub trait RepositoryHost {
    /// Repositories whose name matches `pattern` within the configured
    /// organization, in the host's order.
    fn search_by_name_prefix(&self, pattern: &str) -> FetchResult<Vec<RemoteItem>>;

    /// Entries at the root of `full_name` (`owner/name`).
    fn list_root_files(&self, full_name: &str) -> FetchResult<Vec<RemoteFile>>;

    /// Raw bytes behind a file's download reference.
    fn fetch_content(&self, download_ref: &str) -> FetchResult<Vec<u8>>;
}
