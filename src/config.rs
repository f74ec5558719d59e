//! Run configuration, persisted as TOML.
//!
//! Every key is optional; a missing key takes its default, so an empty file
//! is a valid configuration. Credentials are never stored here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::text::{LineCountMode, TextEncoding};
use crate::titles::gemini;

/// Settings for one cataloging run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Organization whose repositories are cataloged.
    #[serde(default = "default_organization")]
    pub organization: String,
    /// Items are accepted only if their name starts with this.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// `owner/name` of the repository whose `.tmx` filenames seed the
    /// title mapping.
    #[serde(default = "default_reference_repo")]
    pub reference_repo: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Items per catalog flush.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause after each successful item, in milliseconds.
    #[serde(default = "default_item_pause_ms")]
    pub item_pause_ms: u64,
    /// Pause between discovery queries, in milliseconds.
    #[serde(default = "default_query_pause_ms")]
    pub query_pause_ms: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub line_count: LineCountMode,
    /// Decoding attempts, in order.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<TextEncoding>,
    #[serde(default)]
    pub ai: AiConfig,
}

/// The `[ai]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Use AI-assisted extraction when an API key is available.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_organization() -> String {
    "MonlamAI".into()
}
fn default_name_prefix() -> String {
    "TM".into()
}
fn default_reference_repo() -> String {
    "OpenPecha-Data/data-translation-memory".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_batch_size() -> usize {
    20
}
fn default_item_pause_ms() -> u64 {
    1000
}
fn default_query_pause_ms() -> u64 {
    300
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_encodings() -> Vec<TextEncoding> {
    TextEncoding::DEFAULT_ORDER.to_vec()
}
fn default_true() -> bool {
    true
}
fn default_model() -> String {
    gemini::DEFAULT_MODEL.into()
}
fn default_ai_base_url() -> String {
    gemini::DEFAULT_BASE_URL.into()
}
fn default_ai_timeout_secs() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            model: default_model(),
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            name_prefix: default_name_prefix(),
            reference_repo: default_reference_repo(),
            api_base: default_api_base(),
            batch_size: default_batch_size(),
            item_pause_ms: default_item_pause_ms(),
            query_pause_ms: default_query_pause_ms(),
            http_timeout_secs: default_http_timeout_secs(),
            line_count: LineCountMode::default(),
            encodings: default_encodings(),
            ai: AiConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Load from `path` when given, else use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<in-memory>".into(),
            message: e.to_string(),
        })
    }

    fn validate(&self, path: &Path) -> ConfigResult<()> {
        let invalid = |message: &str| ConfigError::Parse {
            path: path.display().to_string(),
            message: message.to_string(),
        };
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1"));
        }
        if self.encodings.is_empty() {
            return Err(invalid("encodings must name at least one encoding"));
        }
        if self.name_prefix.is_empty() {
            return Err(invalid("name_prefix must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tm-catalog.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(CatalogConfig::load(&path).unwrap(), CatalogConfig::default());
    }

    #[test]
    fn partial_file_overrides_named_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tm-catalog.toml");
        std::fs::write(
            &path,
            "batch_size = 5\nline_count = \"raw\"\nencodings = [\"utf-8\", \"latin-1\"]\n\n[ai]\nenabled = false\n",
        )
        .unwrap();
        let config = CatalogConfig::load(&path).unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.line_count, LineCountMode::Raw);
        assert_eq!(config.encodings, vec![TextEncoding::Utf8, TextEncoding::Latin1]);
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.model, "gemini-2.5-flash-lite");
        assert_eq!(config.organization, "MonlamAI");
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tm-catalog.toml");
        std::fs::write(&path, "batch_size = 0\n").unwrap();
        assert!(matches!(
            CatalogConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn defaults_render_and_parse_back() {
        let rendered = CatalogConfig::default().to_toml().unwrap();
        assert!(rendered.contains("organization = \"MonlamAI\""));
        let parsed: CatalogConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, CatalogConfig::default());
    }
}
