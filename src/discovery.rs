//! Candidate discovery through many narrow name searches.
//!
//! A single broad search is capped by the host, so discovery issues one
//! query per likely name prefix, deduplicates by id, and finishes with the
//! broad query to catch stragglers. The result is cached and reused until
//! explicitly invalidated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::remote::{RemoteItem, RepositoryHost};

/// Errors from the discovery engine.
#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("all {attempted} discovery queries failed")]
    #[diagnostic(
        code(tmcat::discovery::all_queries_failed),
        help("Check GITHUB_TOKEN and network access, or wait for the search rate limit to reset.")
    )]
    AllQueriesFailed { attempted: usize },

    #[error("discovery cache I/O error: {message}")]
    #[diagnostic(
        code(tmcat::discovery::cache_io),
        help("Check that the cache directory exists and is writable.")
    )]
    CacheIo { message: String },
}

pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

/// Sub-prefixes searched before the broad query.
const SPECIFIC_SUFFIXES: [&str; 10] = [
    "toh", "ICD", "KGY", "KAN", "GYU", "DEN", "TSA", "NAR", "DUD", "SHAD",
];

/// Every query pattern in issue order, ending with the bare prefix.
///
/// The lowercase `t` single-letter query is left out because the `toh`
/// query already returns those items.
pub fn search_patterns(prefix: &str) -> Vec<String> {
    let mut patterns: Vec<String> = SPECIFIC_SUFFIXES
        .iter()
        .map(|s| format!("{prefix}{s}"))
        .collect();
    patterns.extend((0..10).map(|d| format!("{prefix}{d}")));
    patterns.extend(["_", "-"].iter().map(|s| format!("{prefix}{s}")));
    for c in 'a'..='z' {
        if c != 't' {
            patterns.push(format!("{prefix}{c}"));
        }
        patterns.push(format!("{prefix}{}", c.to_ascii_uppercase()));
    }
    patterns.push(prefix.to_string());
    patterns
}

/// On-disk discovery result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryCache {
    pub tm_repos: Vec<RemoteItem>,
    pub total_count: usize,
    pub cached_at: String,
    pub organization: String,
}

impl DiscoveryCache {
    pub fn new(items: Vec<RemoteItem>, organization: &str) -> Self {
        Self {
            total_count: items.len(),
            tm_repos: items,
            cached_at: chrono::Local::now().to_rfc3339(),
            organization: organization.to_string(),
        }
    }

    pub fn load(path: &Path) -> DiscoveryResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| DiscoveryError::CacheIo {
            message: format!("read {}: {e}", path.display()),
        })?;
        serde_json::from_str(&data).map_err(|e| DiscoveryError::CacheIo {
            message: format!("parse {}: {e}", path.display()),
        })
    }

    pub fn save(&self, path: &Path) -> DiscoveryResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DiscoveryError::CacheIo {
                message: format!("create dir {}: {e}", parent.display()),
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| DiscoveryError::CacheIo {
            message: format!("serialize discovery cache: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| DiscoveryError::CacheIo {
            message: format!("write {}: {e}", path.display()),
        })
    }
}

/// Discovers candidate items in one organization.
pub struct DiscoveryEngine<'a> {
    host: &'a dyn RepositoryHost,
    organization: String,
    name_prefix: String,
    query_pause: Duration,
    cache_path: PathBuf,
}

impl<'a> DiscoveryEngine<'a> {
    pub fn new(
        host: &'a dyn RepositoryHost,
        organization: impl Into<String>,
        name_prefix: impl Into<String>,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host,
            organization: organization.into(),
            name_prefix: name_prefix.into(),
            query_pause: Duration::from_millis(300),
            cache_path: cache_path.into(),
        }
    }

    pub fn with_query_pause(mut self, pause: Duration) -> Self {
        self.query_pause = pause;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// The cached candidate list when present and readable, otherwise a
    /// fresh discovery that is then cached.
    pub fn discover(&self) -> DiscoveryResult<Vec<RemoteItem>> {
        if self.cache_path.exists() {
            match DiscoveryCache::load(&self.cache_path) {
                Ok(cache) => {
                    tracing::info!(
                        count = cache.tm_repos.len(),
                        cached_at = %cache.cached_at,
                        "using cached discovery"
                    );
                    return Ok(cache.tm_repos);
                }
                Err(e) => tracing::warn!(error = %e, "discovery cache unreadable, rediscovering"),
            }
        }

        let items = self.run_queries()?;
        let cache = DiscoveryCache::new(items, &self.organization);
        match cache.save(&self.cache_path) {
            Ok(()) => tracing::info!(count = cache.total_count, "cached discovery result"),
            Err(e) => tracing::error!(error = %e, "failed to save discovery cache"),
        }
        Ok(cache.tm_repos)
    }

    /// Delete the cache so the next [`discover`](Self::discover) queries
    /// the host again.
    pub fn invalidate(&self) -> DiscoveryResult<()> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path).map_err(|e| DiscoveryError::CacheIo {
                message: format!("remove {}: {e}", self.cache_path.display()),
            })?;
            tracing::info!(path = %self.cache_path.display(), "discovery cache invalidated");
        }
        Ok(())
    }

    /// Issue every search pattern, keeping items whose name starts with
    /// the prefix, first occurrence per id.
    pub fn run_queries(&self) -> DiscoveryResult<Vec<RemoteItem>> {
        let patterns = search_patterns(&self.name_prefix);
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut failed = 0;

        tracing::info!(
            organization = %self.organization,
            queries = patterns.len(),
            "starting discovery"
        );
        for (i, pattern) in patterns.iter().enumerate() {
            if i > 0 && !self.query_pause.is_zero() {
                std::thread::sleep(self.query_pause);
            }
            let results = match self.host.search_by_name_prefix(pattern) {
                Ok(results) => results,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(pattern = %pattern, error = %e, "discovery query failed");
                    continue;
                }
            };
            let before = items.len();
            for item in results {
                if item.name.starts_with(&self.name_prefix) && seen.insert(item.id) {
                    items.push(item);
                }
            }
            let added = items.len() - before;
            if added > 0 {
                tracing::debug!(pattern = %pattern, added, total = items.len(), "new candidates");
            }
        }

        if failed == patterns.len() {
            return Err(DiscoveryError::AllQueriesFailed { attempted: failed });
        }
        tracing::info!(candidates = items.len(), failed_queries = failed, "discovery complete");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{FetchError, FetchResult, RemoteFile};
    use std::cell::RefCell;

    struct SearchOnly {
        results: Vec<RemoteItem>,
        fail: bool,
        queries: RefCell<Vec<String>>,
    }

    impl SearchOnly {
        fn new(results: Vec<RemoteItem>) -> Self {
            Self {
                results,
                fail: false,
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl RepositoryHost for SearchOnly {
        fn search_by_name_prefix(&self, pattern: &str) -> FetchResult<Vec<RemoteItem>> {
            self.queries.borrow_mut().push(pattern.to_string());
            if self.fail {
                return Err(FetchError::Status {
                    url: pattern.to_string(),
                    status: 403,
                });
            }
            Ok(self
                .results
                .iter()
                .filter(|r| r.name.contains(pattern))
                .cloned()
                .collect())
        }

        fn list_root_files(&self, full_name: &str) -> FetchResult<Vec<RemoteFile>> {
            Err(FetchError::NotFound {
                what: full_name.to_string(),
            })
        }

        fn fetch_content(&self, download_ref: &str) -> FetchResult<Vec<u8>> {
            Err(FetchError::NotFound {
                what: download_ref.to_string(),
            })
        }
    }

    fn item(id: u64, name: &str) -> RemoteItem {
        RemoteItem {
            id,
            name: name.to_string(),
            url: format!("https://github.com/MonlamAI/{name}"),
            full_name: format!("MonlamAI/{name}"),
        }
    }

    #[test]
    fn pattern_set() {
        let patterns = search_patterns("TM");
        assert_eq!(patterns.len(), 10 + 10 + 2 + 51 + 1);
        assert_eq!(patterns[0], "TMtoh");
        assert!(patterns.contains(&"TMT".to_string()));
        assert!(!patterns.contains(&"TMt".to_string()));
        assert_eq!(patterns.last().map(String::as_str), Some("TM"));
    }

    #[test]
    fn dedupes_and_filters_prefix() {
        let host = SearchOnly::new(vec![
            item(1, "TMtoh1_84000"),
            item(2, "TMICD6_LH"),
            item(3, "OldTM_archive"),
        ]);
        let dir = tempfile::TempDir::new().unwrap();
        let engine = DiscoveryEngine::new(&host, "MonlamAI", "TM", dir.path().join("c.json"))
            .with_query_pause(Duration::ZERO);

        let items = engine.run_queries().unwrap();
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn cached_result_skips_queries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("repository_cache.json");
        let host = SearchOnly::new(vec![item(1, "TMtoh1_84000")]);
        let engine =
            DiscoveryEngine::new(&host, "MonlamAI", "TM", &path).with_query_pause(Duration::ZERO);

        assert_eq!(engine.discover().unwrap().len(), 1);
        let issued = host.queries.borrow().len();
        assert_eq!(issued, search_patterns("TM").len());

        assert_eq!(engine.discover().unwrap().len(), 1);
        assert_eq!(host.queries.borrow().len(), issued);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["organization"], "MonlamAI");
        assert_eq!(raw["tm_repos"][0]["html_url"], "https://github.com/MonlamAI/TMtoh1_84000");

        engine.invalidate().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_cache_is_rebuilt() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("repository_cache.json");
        std::fs::write(&path, "{not json").unwrap();
        let host = SearchOnly::new(vec![item(9, "TM-9")]);
        let engine =
            DiscoveryEngine::new(&host, "MonlamAI", "TM", &path).with_query_pause(Duration::ZERO);
        assert_eq!(engine.discover().unwrap()[0].id, 9);
        assert!(DiscoveryCache::load(&path).is_ok());
    }

    #[test]
    fn every_query_failing_is_an_error() {
        let mut host = SearchOnly::new(Vec::new());
        host.fail = true;
        let dir = tempfile::TempDir::new().unwrap();
        let engine = DiscoveryEngine::new(&host, "MonlamAI", "TM", dir.path().join("c.json"))
            .with_query_pause(Duration::ZERO);
        assert!(matches!(
            engine.discover(),
            Err(DiscoveryError::AllQueriesFailed { .. })
        ));
        assert!(!engine.cache_path().exists());
    }
}
