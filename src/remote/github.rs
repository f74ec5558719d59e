//! GitHub REST API implementation of [`RepositoryHost`].

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;

use super::{FetchError, FetchResult, FileKind, RemoteFile, RemoteItem, RepositoryHost};

/// The search API never returns more than this many results per query.
pub const SEARCH_RESULT_CAP: usize = 1000;
const PER_PAGE: usize = 100;
/// Largest text file that will be downloaded.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    /// Organization that searches are restricted to.
    pub organization: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            organization: "MonlamAI".into(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize)]
struct SearchPage {
    total_count: usize,
    items: Vec<RemoteItem>,
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// Blocking GitHub client.
pub struct GitHubHost {
    config: GitHubConfig,
    agent: ureq::Agent,
}

impl GitHubHost {
    pub fn new(config: GitHubConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tm-catalog/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { config, agent }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn get(&self, url: &str) -> FetchResult<ureq::Response> {
        let mut req = self
            .agent
            .get(url)
            .set("Accept", "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        req.call().map_err(|e| match e {
            ureq::Error::Status(status, resp) => {
                if resp.header("x-ratelimit-remaining") == Some("0") {
                    tracing::warn!(url, "GitHub rate limit exhausted");
                }
                FetchError::Status {
                    url: url.to_string(),
                    status,
                }
            }
            other => FetchError::Transport {
                url: url.to_string(),
                message: other.to_string(),
            },
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        let body = self.get(url)?.into_string().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl RepositoryHost for GitHubHost {
    fn search_by_name_prefix(&self, pattern: &str) -> FetchResult<Vec<RemoteItem>> {
        let query = format!("org:{} {pattern} in:name", self.config.organization);
        let encoded = urlencoding::encode(&query);
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let url = self.api_url(&format!(
                "/search/repositories?q={encoded}&per_page={PER_PAGE}&page={page}"
            ));
            let result: SearchPage = self.get_json(&url)?;
            let received = result.items.len();
            items.extend(result.items);
            tracing::trace!(pattern, page, received, total = result.total_count, "search page");

            if received < PER_PAGE
                || items.len() >= result.total_count
                || items.len() >= SEARCH_RESULT_CAP
            {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    fn list_root_files(&self, full_name: &str) -> FetchResult<Vec<RemoteFile>> {
        let url = self.api_url(&format!("/repos/{full_name}/contents"));
        let entries: Vec<ContentEntry> = self.get_json(&url).map_err(|e| match e {
            FetchError::Status { status: 404, .. } => FetchError::NotFound {
                what: full_name.to_string(),
            },
            other => other,
        })?;
        Ok(entries
            .into_iter()
            .map(|e| RemoteFile {
                name: e.name,
                path: e.path,
                kind: FileKind::from_api(&e.kind),
                download_url: e.download_url,
            })
            .collect())
    }

    fn fetch_content(&self, download_ref: &str) -> FetchResult<Vec<u8>> {
        let resp = self.get(download_ref)?;
        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_DOWNLOAD_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::Body {
                url: download_ref.to_string(),
                message: e.to_string(),
            })?;
        if bytes.len() as u64 > MAX_DOWNLOAD_BYTES {
            return Err(FetchError::TooLarge {
                url: download_ref.to_string(),
                limit: MAX_DOWNLOAD_BYTES,
            });
        }
        Ok(bytes)
    }
}
