//! Raw bytes → text with an ordered encoding fallback.
//!
//! Remote files are mostly UTF-8, but older uploads show up as UTF-16 (with
//! or without a BOM) or as single-byte Latin-1. Encodings are tried in the
//! configured order and the first clean decode wins.

use std::fmt;

use encoding_rs::{UTF_16BE, UTF_16LE};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// None of the configured encodings could decode the bytes.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to decode {len} bytes with any of: {attempted}")]
#[diagnostic(
    code(tmcat::text::decode),
    help(
        "The file is not valid in any configured encoding. Add another encoding to \
         `encodings` in the config file, or inspect the file manually."
    )
)]
pub struct DecodeError {
    pub len: usize,
    pub attempted: String,
}

/// A text encoding the decoder knows how to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16")]
    Utf16,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    /// Default order: UTF-8, UTF-16, Latin-1.
    pub const DEFAULT_ORDER: [TextEncoding; 3] = [Self::Utf8, Self::Utf16, Self::Latin1];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Latin1 => "latin-1",
        }
    }

    /// Strict decode: `None` on any malformed sequence.
    pub fn decode(&self, raw: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => {
                let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
                std::str::from_utf8(raw).ok().map(str::to_owned)
            }
            Self::Utf16 => decode_utf16(raw),
            // Every byte maps to the code point of the same value.
            Self::Latin1 => Some(raw.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BOM-sniffing UTF-16; little-endian when there is no BOM.
fn decode_utf16(raw: &[u8]) -> Option<String> {
    let (encoding, body) = match raw {
        [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
        [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
        _ => (UTF_16LE, raw),
    };
    if body.len() % 2 != 0 {
        return None;
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
}

/// Decode `raw` with the first encoding in `encodings` that succeeds.
pub fn decode_bytes(raw: &[u8], encodings: &[TextEncoding]) -> Result<String, DecodeError> {
    for encoding in encodings {
        if let Some(text) = encoding.decode(raw) {
            tracing::trace!(encoding = %encoding, bytes = raw.len(), "decoded content");
            return Ok(text);
        }
    }
    Err(DecodeError {
        len: raw.len(),
        attempted: encodings
            .iter()
            .map(TextEncoding::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
