//! Plain-text helpers shared by the title extractors and the item analysis.
//!
//! - [`lines`]: the two line-counting variants used in catalog statistics.
//! - [`decode`]: raw bytes → text with an ordered encoding fallback.
//! - [`ceremonial`]: picks the first substantive Tibetan line, skipping
//!   ornamental opening glyphs.

pub mod ceremonial;
pub mod decode;
pub mod lines;

pub use ceremonial::{CEREMONIAL_TOKENS, MIN_MEANINGFUL_CHARS, meaningful_line};
pub use decode::{DecodeError, TextEncoding, decode_bytes};
pub use lines::{LineCountMode, count_lines, count_non_empty_lines, trimmed_lines};
