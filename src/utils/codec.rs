//! Binary to text transform for text-only document fields.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::Result;

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}

/// Length of `encode` output for `raw_len` input bytes, without encoding.
pub fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}
