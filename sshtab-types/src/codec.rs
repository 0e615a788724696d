//! Base64 framing for log fields.
//!
//! Log records are tab separated and newline terminated, so every free-form
//! field is stored encoded. Decoding never panics; callers skip the record
//! when it fails.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD, STANDARD};
use thiserror::Error;

/// Decoder that ignores set bits after the last full byte, as lines
/// written by other encoders may carry them.
const DECODER: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, PAD.with_decode_allow_trailing_bits(true));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base64 length")]
    Length,
    #[error("invalid base64 padding")]
    Padding,
    #[error("invalid base64 character")]
    Character,
}

/// Standard padded base64.
pub fn encode(input: impl AsRef<[u8]>) -> String {
    STANDARD.encode(input)
}

pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    if input.len() % 4 != 0 {
        return Err(DecodeError::Length);
    }
    DECODER.decode(input).map_err(|err| match err {
        base64::DecodeError::InvalidLength(_) => DecodeError::Length,
        base64::DecodeError::InvalidPadding => DecodeError::Padding,
        base64::DecodeError::InvalidByte(_, b'=') => DecodeError::Padding,
        _ => DecodeError::Character,
    })
}

/// Decode a field that must hold UTF-8 text.
pub fn decode_string(input: &str) -> Option<String> {
    decode(input)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}
