//! This module contains the text-safe transport kernels: Base64 encoding and
//! decoding over the `base64` crate.
//!
//! Decoding is lenient in the ways transports tend to mangle text: either alphabet
//! is accepted, padding is optional, and line breaks can be stripped first.

use std::borrow::Cow;

use ::base64::alphabet;
use ::base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE};
use ::base64::engine::DecodePaddingMode;
use ::base64::Engine;

use crate::error::TextpackError;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const LENIENT_ENGINE: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Line length used by `encode_pem`.
pub const PEM_LINE_LEN: usize = 64;
/// Line length used by `encode_mime`.
pub const MIME_LINE_LEN: usize = 76;

//==================================================================================
// 1. Public API
//==================================================================================

/// Encodes `bytes` as padded Base64, in the URL-safe alphabet if `url_safe`.
pub fn encode(bytes: &[u8], url_safe: bool) -> String {
    if url_safe {
        URL_SAFE.encode(bytes)
    } else {
        STANDARD.encode(bytes)
    }
}

/// Standard Base64 broken into 64 character lines.
pub fn encode_pem(bytes: &[u8]) -> String {
    wrap_lines(&STANDARD.encode(bytes), PEM_LINE_LEN)
}

/// Standard Base64 broken into 76 character lines.
pub fn encode_mime(bytes: &[u8]) -> String {
    wrap_lines(&STANDARD.encode(bytes), MIME_LINE_LEN)
}

/// Decodes Base64 text in either alphabet, or a mix of the two.
///
/// `-` and `_` are read as `+` and `/`, so text re-encoded piecewise by different
/// transports still decodes.
///
/// # Errors
/// Returns `TextpackError::TextDecode` for any character outside the alphabet
/// (including line breaks, unless `remove_linebreaks` is set) or an invalid length.
pub fn decode(text: &[u8], remove_linebreaks: bool) -> Result<Vec<u8>, TextpackError> {
    let needs_rewrite = text.iter().any(|&b| {
        matches!(b, b'-' | b'_') || (remove_linebreaks && matches!(b, b'\n' | b'\r'))
    });

    let text: Cow<[u8]> = if needs_rewrite {
        Cow::Owned(
            text.iter()
                .filter_map(|&b| match b {
                    b'\n' | b'\r' if remove_linebreaks => None,
                    b'-' => Some(b'+'),
                    b'_' => Some(b'/'),
                    other => Some(other),
                })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    };

    Ok(LENIENT_ENGINE.decode(text.as_ref())?)
}

//==================================================================================
// 2. Helpers
//==================================================================================

fn wrap_lines(encoded: &str, line_len: usize) -> String {
    // Base64 output is pure ASCII, so byte chunks are char boundaries.
    encoded
        .as_bytes()
        .chunks(line_len)
        .map(|line| String::from_utf8_lossy(line))
        .collect::<Vec<_>>()
        .join("\n")
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
