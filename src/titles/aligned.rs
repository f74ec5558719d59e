//! Parallel line matching.
//!
//! The Tibetan and English files of an item are line-aligned translations,
//! so once the title line is located in one text the other text's title sits
//! at the same index.

use crate::text::{MIN_MEANINGFUL_CHARS, meaningful_line, trimmed_lines};
use crate::titles::error::ExtractionFailure;
use crate::titles::mapping::TitleMapping;
use crate::titles::TitlePair;

/// How many leading English lines the mapped title is searched in.
pub const TITLE_SEARCH_LINES: usize = 5;

/// Index of the first of the leading `max_lines` lines that contains
/// `target` (case-insensitive). Blank lines are skipped but still count
/// toward the window.
pub fn find_line(text: &str, target: &str, max_lines: usize) -> Option<usize> {
    let target = target.to_lowercase();
    text.split('\n')
        .take(max_lines)
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .find(|(_, line)| line.trim().to_lowercase().contains(&target))
        .map(|(i, _)| i)
}

/// Anchor on the mapped English title and read the aligned Tibetan line.
pub fn extract_aligned(
    mapping: &TitleMapping,
    item_name: &str,
    bo_text: &str,
    en_text: &str,
) -> Result<TitlePair, ExtractionFailure> {
    let mapped = mapping
        .lookup(item_name)
        .ok_or_else(|| ExtractionFailure::NoMapping {
            item: item_name.to_string(),
        })?;

    let index = find_line(en_text, mapped, TITLE_SEARCH_LINES).ok_or_else(|| {
        ExtractionFailure::TitleNotFound {
            title: mapped.to_string(),
            searched: TITLE_SEARCH_LINES,
        }
    })?;

    let bo_lines = trimmed_lines(bo_text);
    let en_lines = trimmed_lines(en_text);
    let Some(bo_line) = bo_lines.get(index) else {
        tracing::warn!(item = item_name, line = index, "aligned line missing from Tibetan text");
        return Err(ExtractionFailure::LineOutOfRange {
            line: index,
            available: bo_lines.len(),
        });
    };

    let en_title = en_lines[index].to_string();
    let bo_title = tibetan_or_fallback(bo_line, &bo_lines);
    tracing::debug!(item = item_name, line = index, "aligned title match");
    Ok(TitlePair::new(bo_title, en_title))
}

/// Take the first non-empty English line as the title and read the Tibetan
/// line at the same position. Never fails; either side may come back empty.
pub fn extract_by_position(bo_text: &str, en_text: &str) -> TitlePair {
    let bo_lines = trimmed_lines(bo_text);
    let en_lines = trimmed_lines(en_text);

    let (bo_candidate, en_title) = match en_lines.iter().position(|l| !l.is_empty()) {
        Some(index) => (
            bo_lines.get(index).copied().unwrap_or(""),
            en_lines[index].to_string(),
        ),
        None => ("", String::new()),
    };

    TitlePair::new(tibetan_or_fallback(bo_candidate, &bo_lines), en_title)
}

/// Keep `candidate` unless it is too short to be a title, in which case
/// scan the whole Tibetan text for its first meaningful line.
fn tibetan_or_fallback(candidate: &str, bo_lines: &[&str]) -> String {
    if candidate.chars().count() < MIN_MEANINGFUL_CHARS {
        meaningful_line(bo_lines)
    } else {
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BO: &str = "༄༅། །\n\nབཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ\nའདི་སྐད་བདག་གིས་ཐོས་པ་དུས་གཅིག་ན།\n";
    const EN: &str = "\n\nThe Blessed One\nThus did I hear at one time.\nEnd.";

    fn mapping() -> TitleMapping {
        TitleMapping::build(["Toh_1-1-The_Blessed_One-v1.tmx"])
    }

    #[test]
    fn find_line_is_case_insensitive_and_bounded() {
        assert_eq!(find_line(EN, "the blessed one", 5), Some(2));
        assert_eq!(find_line(EN, "the blessed one", 2), None);
        assert_eq!(find_line(EN, "End.", 5), Some(4));
        assert_eq!(find_line(EN, "missing", 5), None);
    }

    #[test]
    fn aligned_reads_same_index() {
        let pair = extract_aligned(&mapping(), "TMtoh1-1_84000", BO, EN).unwrap();
        assert_eq!(pair.en_title, "The Blessed One");
        assert_eq!(pair.bo_title, "བཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ");
    }

    #[test]
    fn aligned_without_mapping_fails_immediately() {
        let err = extract_aligned(&TitleMapping::default(), "TMtoh1-1_84000", BO, EN).unwrap_err();
        assert!(matches!(err, ExtractionFailure::NoMapping { .. }));
    }

    #[test]
    fn aligned_title_outside_search_window_fails() {
        let en = "a\nb\nc\nd\ne\nThe Blessed One";
        let err = extract_aligned(&mapping(), "TMtoh1-1_84000", BO, en).unwrap_err();
        assert!(matches!(err, ExtractionFailure::TitleNotFound { searched: 5, .. }));
    }

    #[test]
    fn aligned_line_out_of_range_fails() {
        let err = extract_aligned(&mapping(), "TMtoh1-1_84000", "only one line", EN).unwrap_err();
        assert_eq!(
            err,
            ExtractionFailure::LineOutOfRange {
                line: 2,
                available: 1
            }
        );
    }

    #[test]
    fn aligned_short_tibetan_line_uses_ceremonial_fallback() {
        let bo = "༄༅།\nབཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ\nཀ\n";
        let pair = extract_aligned(&mapping(), "TMtoh1-1_84000", bo, EN).unwrap();
        assert_eq!(pair.bo_title, "བཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ");
    }

    #[test]
    fn position_uses_first_english_line_index() {
        let pair = extract_by_position(BO, EN);
        assert_eq!(pair.en_title, "The Blessed One");
        assert_eq!(pair.bo_title, "བཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ");
    }

    #[test]
    fn position_never_fails_on_empty_input() {
        let pair = extract_by_position("", "");
        assert_eq!(pair.bo_title, "");
        assert_eq!(pair.en_title, "");
    }

    #[test]
    fn position_with_shorter_tibetan_text_falls_back() {
        let pair = extract_by_position("a Tibetan line long enough", "\n\n\nTitle");
        assert_eq!(pair.en_title, "Title");
        assert_eq!(pair.bo_title, "a Tibetan line long enough");
    }
}
