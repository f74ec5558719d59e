//! Ordered title-resolution tiers with a provenance trail.

use std::fmt;

use crate::titles::ai::AiTitleExtractor;
use crate::titles::aligned::{extract_aligned, extract_by_position};
use crate::titles::error::ExtractionFailure;
use crate::titles::mapping::TitleMapping;
use crate::titles::TitlePair;

/// Which tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleMethod {
    MappedAlignment,
    AiAssisted,
    Position,
}

impl TitleMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MappedAlignment => "title mapping",
            Self::AiAssisted => "AI extraction",
            Self::Position => "position matching",
        }
    }
}

impl fmt::Display for TitleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fallible tier of the pipeline.
pub trait TitleStrategy {
    fn method(&self) -> TitleMethod;

    /// Produce a complete title pair or say why not.
    fn attempt(
        &mut self,
        item_name: &str,
        bo_text: &str,
        en_text: &str,
    ) -> Result<TitlePair, ExtractionFailure>;
}

fn require_complete(pair: TitlePair) -> Result<TitlePair, ExtractionFailure> {
    if pair.is_complete() {
        Ok(pair)
    } else {
        Err(ExtractionFailure::Incomplete {
            bo_found: !pair.bo_title.is_empty(),
            en_found: !pair.en_title.is_empty(),
        })
    }
}

/// Mapped English title located in the text, Tibetan read at the same line.
pub struct MappedAlignmentStrategy {
    mapping: TitleMapping,
}

impl MappedAlignmentStrategy {
    pub fn new(mapping: TitleMapping) -> Self {
        Self { mapping }
    }
}

impl TitleStrategy for MappedAlignmentStrategy {
    fn method(&self) -> TitleMethod {
        TitleMethod::MappedAlignment
    }

    fn attempt(
        &mut self,
        item_name: &str,
        bo_text: &str,
        en_text: &str,
    ) -> Result<TitlePair, ExtractionFailure> {
        extract_aligned(&self.mapping, item_name, bo_text, en_text).and_then(require_complete)
    }
}

/// AI-assisted extraction; an absent extractor always fails.
pub struct AiStrategy {
    extractor: Option<AiTitleExtractor>,
}

impl AiStrategy {
    pub fn new(extractor: Option<AiTitleExtractor>) -> Self {
        Self { extractor }
    }
}

impl TitleStrategy for AiStrategy {
    fn method(&self) -> TitleMethod {
        TitleMethod::AiAssisted
    }

    fn attempt(
        &mut self,
        item_name: &str,
        bo_text: &str,
        en_text: &str,
    ) -> Result<TitlePair, ExtractionFailure> {
        let extractor = self
            .extractor
            .as_mut()
            .ok_or(ExtractionFailure::Unavailable)?;
        let titles = extractor.extract(item_name, bo_text, en_text);
        require_complete(TitlePair::new(
            titles.bo_title.unwrap_or_default(),
            titles.en_title.unwrap_or_default(),
        ))
    }
}

/// The outcome of resolving one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub bo_title: String,
    pub en_title: String,
    pub method: TitleMethod,
    /// One fragment per attempted tier, in order.
    pub provenance: Vec<String>,
}

/// Tries each tier in order and falls back to position matching.
pub struct TitlePipeline {
    tiers: Vec<Box<dyn TitleStrategy>>,
}

impl TitlePipeline {
    pub fn new(mapping: TitleMapping, ai: Option<AiTitleExtractor>) -> Self {
        Self::with_tiers(vec![
            Box::new(MappedAlignmentStrategy::new(mapping)),
            Box::new(AiStrategy::new(ai)),
        ])
    }

    /// Pipeline over arbitrary fallible tiers, still ending in position
    /// matching.
    pub fn with_tiers(tiers: Vec<Box<dyn TitleStrategy>>) -> Self {
        Self { tiers }
    }

    pub fn resolve(&mut self, item_name: &str, bo_text: &str, en_text: &str) -> Resolution {
        let mut provenance = Vec::new();
        for tier in &mut self.tiers {
            let method = tier.method();
            match tier.attempt(item_name, bo_text, en_text) {
                Ok(pair) => {
                    tracing::debug!(item = item_name, %method, "titles resolved");
                    provenance.push(format!("Titles from {method}"));
                    return Resolution {
                        bo_title: pair.bo_title,
                        en_title: pair.en_title,
                        method,
                        provenance,
                    };
                }
                Err(failure) => {
                    tracing::debug!(item = item_name, %method, %failure, "tier failed");
                    provenance.push(format!("{method} failed: {failure}"));
                }
            }
        }

        let pair = extract_by_position(bo_text, en_text);
        let method = TitleMethod::Position;
        provenance.push(format!("Titles from {method}"));
        Resolution {
            bo_title: pair.bo_title,
            en_title: pair.en_title,
            method,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::titles::ai::{AiResponseCache, TitleExtractionBackend};
    use crate::titles::error::AiResult;

    const BO: &str = "༄༅། །\nབཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ\nའདི་སྐད་བདག་གིས་ཐོས་པ་དུས་གཅིག་ན།\n";
    const EN: &str = "Translated by the 84000 team\nThe Blessed One\nThus did I hear.";

    struct FixedBackend(&'static str);

    impl TitleExtractionBackend for FixedBackend {
        fn model(&self) -> &str {
            "fixed"
        }

        fn complete(&self, _prompt: &str) -> AiResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn ai(reply: &'static str) -> Option<AiTitleExtractor> {
        Some(AiTitleExtractor::new(
            Box::new(FixedBackend(reply)),
            AiResponseCache::in_memory(),
        ))
    }

    fn mapping() -> TitleMapping {
        TitleMapping::build(["Toh_1-1-The_Blessed_One-v1.tmx"])
    }

    #[test]
    fn mapped_alignment_wins_first() {
        let mut pipeline = TitlePipeline::new(
            mapping(),
            ai(r#"{"tibetan_title":"x","english_title":"y"}"#),
        );
        let res = pipeline.resolve("TMtoh1-1_84000", BO, EN);
        assert_eq!(res.method, TitleMethod::MappedAlignment);
        assert_eq!(res.en_title, "The Blessed One");
        assert_eq!(res.bo_title, "བཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ");
        assert_eq!(res.provenance, vec!["Titles from title mapping"]);
    }

    #[test]
    fn ai_used_when_mapping_misses() {
        let mut pipeline = TitlePipeline::new(
            TitleMapping::default(),
            ai(r#"{"tibetan_title":"བཅོམ་ལྡན་འདས","english_title":"The Blessed One"}"#),
        );
        let res = pipeline.resolve("TMICD6_LH", BO, EN);
        assert_eq!(res.method, TitleMethod::AiAssisted);
        assert_eq!(res.bo_title, "བཅོམ་ལྡན་འདས");
        assert_eq!(res.provenance.len(), 2);
        assert!(res.provenance[0].starts_with("title mapping failed"));
    }

    #[test]
    fn partial_ai_answer_falls_through_to_position() {
        let mut pipeline = TitlePipeline::new(
            TitleMapping::default(),
            ai(r#"{"tibetan_title":"","english_title":"Only English"}"#),
        );
        let res = pipeline.resolve("TMICD6_LH", BO, EN);
        assert_eq!(res.method, TitleMethod::Position);
        assert_eq!(res.en_title, "Translated by the 84000 team");
        assert!(res.provenance[1].contains("incomplete"));
    }

    #[test]
    fn position_fallback_on_aligned_five_line_texts() {
        let bo = "༄༅། །\nཀ\nབཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ\nའདི་སྐད་བདག་གིས་ཐོས་པ་དུས་གཅིག་ན།\nརྫོགས་སོ།";
        let en = "\n\nThe Blessed One\nThus did I hear at one time.\nEnd.";
        let mut pipeline = TitlePipeline::new(TitleMapping::default(), None);
        let res = pipeline.resolve("TMtoh1-1_84000", bo, en);
        assert_eq!(res.method, TitleMethod::Position);
        assert_eq!(res.en_title, "The Blessed One");
        assert_eq!(res.bo_title, "བཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ");
    }

    #[test]
    fn missing_ai_is_unavailable_then_position() {
        let mut pipeline = TitlePipeline::new(TitleMapping::default(), None);
        let res = pipeline.resolve("TMICD6_LH", BO, EN);
        assert_eq!(res.method, TitleMethod::Position);
        assert_eq!(
            res.provenance,
            vec![
                "title mapping failed: no title mapping matches \"TMICD6_LH\"",
                "AI extraction failed: extractor unavailable",
                "Titles from position matching",
            ]
        );
        // The Tibetan line at index 0 is ornamental, so the ceremonial scan applies.
        assert_eq!(res.bo_title, "བཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ");
    }
}
