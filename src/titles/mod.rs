//! Title resolution for bilingual items.
//!
//! Three tiers, tried in order by [`pipeline::TitlePipeline`]:
//! structured mapping anchored on the English text, AI-assisted
//! extraction, and position-based line matching.

pub mod ai;
pub mod aligned;
pub mod error;
pub mod gemini;
pub mod mapping;
pub mod pipeline;
pub mod single;

pub use ai::{AiResponseCache, AiTitleExtractor, AiTitles, TitleExtractionBackend};
pub use error::{AiError, ExtractionFailure, MappingError};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use mapping::TitleMapping;
pub use pipeline::{Resolution, TitleMethod, TitlePipeline};
pub use single::{Language, single_text_title};

/// A Tibetan/English title pair; either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitlePair {
    pub bo_title: String,
    pub en_title: String,
}

impl TitlePair {
    pub fn new(bo_title: impl Into<String>, en_title: impl Into<String>) -> Self {
        Self {
            bo_title: bo_title.into(),
            en_title: en_title.into(),
        }
    }

    /// Both sides are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.bo_title.is_empty() && !self.en_title.is_empty()
    }
}
