//! Line counting.

use serde::{Deserialize, Serialize};

/// Which line count goes into the catalog's `bo_lines` / `en_lines` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCountMode {
    /// Every `\n`-separated segment, see [`count_lines`].
    Raw,
    /// Only segments with visible content, see [`count_non_empty_lines`].
    #[default]
    NonEmpty,
}

impl LineCountMode {
    pub fn count(self, text: &str) -> usize {
        match self {
            Self::Raw => count_lines(text),
            Self::NonEmpty => count_non_empty_lines(text),
        }
    }
}

/// Count lines after dropping the trailing line terminator.
///
/// Returns 0 when the text is empty or whitespace-only. Otherwise every
/// segment counts, including blank ones in the middle of the text.
pub fn count_lines(text: &str) -> usize {
    let text = text.trim_end_matches(['\n', '\r']);
    if text.trim().is_empty() {
        return 0;
    }
    text.split('\n').count()
}

/// Count segments that are non-empty after trimming.
pub fn count_non_empty_lines(text: &str) -> usize {
    text.split('\n').filter(|line| !line.trim().is_empty()).count()
}

/// Split on `\n` and trim each line, keeping blank lines so indices stay
/// aligned with the source file.
pub fn trimmed_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_lines_basic() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a\nb\n"), 2);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("\n\n"), 0);
    }

    #[test]
    fn count_lines_keeps_inner_blank_segments() {
        assert_eq!(count_lines("a\n\n\nb\r\n"), 4);
        assert_eq!(count_lines("   \n  \t"), 0);
    }

    #[test]
    fn count_non_empty_skips_blanks() {
        assert_eq!(count_non_empty_lines(""), 0);
        assert_eq!(count_non_empty_lines("a\n\n  \nb\n"), 2);
        assert_eq!(count_non_empty_lines("  title  \n"), 1);
    }

    #[test]
    fn mode_dispatches() {
        let text = "one\n\ntwo\n";
        assert_eq!(LineCountMode::Raw.count(text), 3);
        assert_eq!(LineCountMode::NonEmpty.count(text), 2);
    }

    #[test]
    fn trimmed_lines_preserve_positions() {
        assert_eq!(trimmed_lines(" a \n\n b\r"), vec!["a", "", "b"]);
    }
}
