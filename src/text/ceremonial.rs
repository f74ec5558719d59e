//! Ceremonial-aware selection of the first substantive Tibetan line.
//!
//! Tibetan texts conventionally open with ornamental punctuation (the yig
//! mgo head marks `༄༅།`, double shad, and similar). Those lines are never
//! titles. A line qualifies once the ornaments are stripped and at least
//! [`MIN_MEANINGFUL_CHARS`] characters remain.

/// Ornamental glyph sequences, longest combinations first so that
/// stripping removes `༄༅།` as a unit before its parts.
pub const CEREMONIAL_TOKENS: [&str; 10] = ["༄༅།", "༄༅", "༄", "༅", "།།", "༔", "༎", "༏", "༐", "༑"];

/// Minimum character count (Unicode scalar values) a line must keep after
/// ornament removal. Also used by the extractors to decide when a Tibetan
/// title candidate is too short to trust.
pub const MIN_MEANINGFUL_CHARS: usize = 15;

/// Return the first meaningful line.
///
/// Lines are trimmed before inspection. Empty lines and lines that are a
/// single ornament are skipped; so are lines whose remainder after removing
/// every ornament is shorter than [`MIN_MEANINGFUL_CHARS`]. When nothing
/// qualifies, the first non-empty line is returned unchanged, and when
/// there is none, the empty string.
pub fn meaningful_line<S: AsRef<str>>(lines: &[S]) -> String {
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() || CEREMONIAL_TOKENS.contains(&line) {
            continue;
        }
        if strip_ornaments(line).chars().count() >= MIN_MEANINGFUL_CHARS {
            tracing::trace!(line, "meaningful Tibetan line");
            return line.to_string();
        }
    }

    match lines
        .iter()
        .map(|l| l.as_ref().trim())
        .find(|l| !l.is_empty())
    {
        Some(first) => {
            tracing::debug!(line = first, "no meaningful line, using first non-empty");
            first.to_string()
        }
        None => {
            tracing::warn!("no Tibetan content found");
            String::new()
        }
    }
}

/// Remove every ornament occurrence, trimming after each token pass.
fn strip_ornaments(line: &str) -> String {
    CEREMONIAL_TOKENS
        .iter()
        .fold(line.to_string(), |acc, token| acc.replace(token, "").trim().to_string())
}
