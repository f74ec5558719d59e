//! Gemini `generateContent` backend for AI-assisted title extraction.

use crate::titles::ai::TitleExtractionBackend;
use crate::titles::error::{AiError, AiResult};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: api_key.into(),
            timeout_secs: 60,
        }
    }
}

/// Blocking client for a single-prompt Gemini completion.
pub struct GeminiBackend {
    config: GeminiConfig,
    agent: ureq::Agent,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl TitleExtractionBackend for GeminiBackend {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn complete(&self, prompt: &str) -> AiResult<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.0 },
        });
        let body_str = serde_json::to_string(&body).map_err(|e| AiError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        let resp = self
            .agent
            .post(&self.endpoint())
            .set("Content-Type", "application/json")
            .set("x-goog-api-key", &self.config.api_key)
            .send_string(&body_str)
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => AiError::Status {
                    status,
                    message: resp.into_string().unwrap_or_default(),
                },
                other => AiError::RequestFailed {
                    message: other.to_string(),
                },
            })?;

        let resp_str = resp.into_string().map_err(|e| AiError::ParseError {
            message: e.to_string(),
        })?;
        response_text(&resp_str)
    }
}

/// Concatenated text parts of the first candidate.
pub fn response_text(body: &str) -> AiResult<String> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| AiError::ParseError {
        message: e.to_string(),
    })?;
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| AiError::ParseError {
            message: "missing 'candidates[0].content.parts'".into(),
        })?;
    Ok(parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join(""))
}
