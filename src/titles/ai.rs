//! AI-assisted title extraction with a content-addressed response cache.
//!
//! The extractor sends the leading lines of both texts to a text-generation
//! backend and asks for a JSON object with the two titles. Every failure is
//! logged and turned into "no titles": this tier must never abort the
//! pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::titles::error::{AiError, AiResult};

/// Number of leading non-empty lines sent from each text.
pub const EXCERPT_LINES: usize = 5;

/// A text-generation service that can answer one prompt.
pub trait TitleExtractionBackend {
    /// Model identifier, recorded with cached responses.
    fn model(&self) -> &str;

    /// Send `prompt` and return the raw response text.
    fn complete(&self, prompt: &str) -> AiResult<String>;
}

/// Titles as parsed from a backend response; either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTitles {
    pub bo_title: Option<String>,
    pub en_title: Option<String>,
}

/// One cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    bo_title: Option<String>,
    en_title: Option<String>,
    repo_name: String,
    model: String,
}

/// Persistent map from excerpt hash to parsed titles.
#[derive(Debug)]
pub struct AiResponseCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CachedResponse>,
}

impl AiResponseCache {
    /// Cache that lives only for this process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Open the cache file at `path`, starting empty if it does not exist
    /// or cannot be parsed.
    pub fn open(path: &Path) -> Self {
        let entries = if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|data| serde_json::from_str(&data).map_err(|e| e.to_string()))
            {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "AI cache unreadable, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        tracing::info!(entries = entries.len(), "AI response cache loaded");
        Self {
            path: Some(path.to_path_buf()),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, key: &str) -> Option<AiTitles> {
        self.entries.get(key).map(|c| AiTitles {
            bo_title: c.bo_title.clone(),
            en_title: c.en_title.clone(),
        })
    }

    fn insert(&mut self, key: String, titles: &AiTitles, repo_name: &str, model: &str) {
        self.entries.insert(
            key,
            CachedResponse {
                bo_title: titles.bo_title.clone(),
                en_title: titles.en_title.clone(),
                repo_name: repo_name.to_string(),
                model: model.to_string(),
            },
        );
    }

    fn flush(&self) -> AiResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AiError::CacheIo {
                message: format!("create dir {}: {e}", parent.display()),
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| AiError::CacheIo {
            message: format!("serialize cache: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| AiError::CacheIo {
            message: format!("write {}: {e}", path.display()),
        })
    }
}

/// Title extractor backed by a text-generation service.
pub struct AiTitleExtractor {
    backend: Box<dyn TitleExtractionBackend>,
    cache: AiResponseCache,
}

impl AiTitleExtractor {
    pub fn new(backend: Box<dyn TitleExtractionBackend>, cache: AiResponseCache) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &AiResponseCache {
        &self.cache
    }

    /// Ask the backend for the title pair of an item.
    ///
    /// Identical excerpts are answered from the cache without a call.
    /// Returns empty titles on insufficient content, call failure, empty
    /// response, or unparseable response.
    pub fn extract(&mut self, item_name: &str, bo_text: &str, en_text: &str) -> AiTitles {
        let bo_excerpt = excerpt(bo_text, EXCERPT_LINES);
        let en_excerpt = excerpt(en_text, EXCERPT_LINES);
        if bo_excerpt.is_empty() || en_excerpt.is_empty() {
            tracing::warn!(item = item_name, "insufficient content for AI extraction");
            return AiTitles::default();
        }

        let key = cache_key(&bo_excerpt, &en_excerpt);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(item = item_name, "AI cache hit");
            return cached;
        }

        tracing::info!(item = item_name, model = self.backend.model(), "requesting AI title extraction");
        let response = match self.backend.complete(&build_prompt(&bo_excerpt, &en_excerpt)) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(item = item_name, error = %e, "AI title extraction failed");
                return AiTitles::default();
            }
        };
        if response.trim().is_empty() {
            tracing::warn!(item = item_name, "empty AI response");
            return AiTitles::default();
        }

        let titles = match parse_response(&response) {
            Ok(titles) => titles,
            Err(e) => {
                tracing::warn!(item = item_name, error = %e, "unparseable AI response");
                tracing::debug!(raw = %response, "raw AI response");
                return AiTitles::default();
            }
        };

        self.cache
            .insert(key, &titles, item_name, self.backend.model());
        if let Err(e) = self.cache.flush() {
            tracing::error!(error = %e, "failed to save AI response cache");
        }

        if titles.bo_title.is_none() || titles.en_title.is_none() {
            tracing::warn!(item = item_name, "AI could not identify both titles");
        }
        titles
    }
}

/// First `n` non-empty lines, trimmed and newline-joined.
pub fn excerpt(text: &str, n: usize) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(n)
        .collect::<Vec<_>>()
        .join("\n")
}

/// SHA-256 hex digest identifying an excerpt pair.
pub fn cache_key(bo_excerpt: &str, en_excerpt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bo_excerpt.as_bytes());
    hasher.update(b"|||");
    hasher.update(en_excerpt.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn build_prompt(bo_excerpt: &str, en_excerpt: &str) -> String {
    format!(
        "You analyze parallel Tibetan-English Buddhist texts. Below are the first lines \
         of a Tibetan text and of its English translation.\n\
         \n\
         Identify the main title of the work as it appears in each text. Ignore lines \
         made only of decorative symbols and ignore publisher, copyright, or attribution \
         notices.\n\
         \n\
         Reply with only this JSON object and nothing else:\n\
         {{\"tibetan_title\": \"<title>\", \"english_title\": \"<title>\"}}\n\
         Use an empty string for a title you cannot find.\n\
         \n\
         Tibetan lines:\n{bo_excerpt}\n\
         \n\
         English lines:\n{en_excerpt}"
    )
}

#[derive(Deserialize)]
struct RawTitles {
    #[serde(default)]
    tibetan_title: Option<String>,
    #[serde(default)]
    english_title: Option<String>,
}

/// Parse a backend response, tolerating a surrounding Markdown code fence.
pub fn parse_response(response: &str) -> AiResult<AiTitles> {
    let mut body = response.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    let raw: RawTitles = serde_json::from_str(body.trim()).map_err(|e| AiError::ParseError {
        message: e.to_string(),
    })?;
    let non_empty = |s: Option<String>| s.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    Ok(AiTitles {
        bo_title: non_empty(raw.tibetan_title),
        en_title: non_empty(raw.english_title),
    })
}
