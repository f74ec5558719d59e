//! Title guesses for a lone text, used when its counterpart is missing or
//! unreadable and no parallel extraction is possible.

/// Phrases that open the title block of a Tibetan canonical text
/// ("in the Tibetan language", sutra, mantra, dharani, "in the Indian
/// language").
pub const TIBETAN_TITLE_MARKERS: [&str; 5] = [
    "བོད་སྐད་དུ",
    "མདོ།",
    "སྔགས།",
    "གཟུངས།",
    "རྒྱ་གར་སྐད་དུ",
];

/// How many leading non-empty lines are searched for a marker.
const MARKER_SEARCH_LINES: usize = 10;

/// Lines at or under this many characters are treated as ornaments when no
/// marker is found.
const SUBSTANTIAL_LINE_CHARS: usize = 20;

/// Which side of the pair a text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Tibetan,
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Tibetan => "bo",
            Self::English => "en",
        }
    }

    /// Name used in catalog notes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tibetan => "Tibetan",
            Self::English => "English",
        }
    }
}

/// Best-effort title of a single text.
///
/// English: the first non-empty line. Tibetan: the first marker line among
/// the leading non-empty lines, else the first line longer than 20
/// characters, else the first non-empty line.
pub fn single_text_title(text: &str, language: Language) -> String {
    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let Some(first) = lines.first() else {
        return String::new();
    };

    match language {
        Language::English => first.to_string(),
        Language::Tibetan => lines
            .iter()
            .take(MARKER_SEARCH_LINES)
            .find(|line| TIBETAN_TITLE_MARKERS.iter().any(|m| line.contains(m)))
            .or_else(|| {
                lines
                    .iter()
                    .find(|line| line.chars().count() > SUBSTANTIAL_LINE_CHARS)
            })
            .unwrap_or(first)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_takes_first_non_empty() {
        assert_eq!(
            single_text_title("\n  The Noble Sutra \nbody", Language::English),
            "The Noble Sutra"
        );
        assert_eq!(single_text_title(" \n", Language::English), "");
    }

    #[test]
    fn tibetan_prefers_marker_line() {
        let text = "༄༅། །\nའཕགས་པ་ཤེས་རབ་ཀྱི་ཕ་རོལ་ཏུ་ཕྱིན་པ་བརྒྱད་སྟོང་པ།\nབོད་སྐད་དུ། འཕགས་པ།\n";
        assert_eq!(
            single_text_title(text, Language::Tibetan),
            "བོད་སྐད་དུ། འཕགས་པ།"
        );
    }

    #[test]
    fn tibetan_without_marker_takes_substantial_line() {
        let text = "༄༅། །\nའཕགས་པ་ཤེས་རབ་ཀྱི་ཕ་རོལ་ཏུ་ཕྱིན་པ།\n";
        assert_eq!(
            single_text_title(text, Language::Tibetan),
            "འཕགས་པ་ཤེས་རབ་ཀྱི་ཕ་རོལ་ཏུ་ཕྱིན་པ།"
        );
    }

    #[test]
    fn tibetan_short_lines_fall_back_to_first() {
        assert_eq!(single_text_title("༄༅།\nཀ\n", Language::Tibetan), "༄༅།");
    }
}
