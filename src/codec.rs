//! Characteristic Value Codec
//!
//! Wire encode/decode helpers for the value representations carried by IoCS
//! characteristics: booleans, little-endian 32-bit integers and text.
//! Decoders are best-effort: a malformed or undersized payload yields `None`
//! and the caller leaves the stored value unchanged.

use heapless::{String, Vec};

use crate::registry::{MAX_TEXT_LEN, MAX_VALUE_LEN};

/// Encode a 32-bit number as four little-endian bytes.
pub fn encode_u32_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode four little-endian bytes into a 32-bit number.
///
/// Requires exactly four bytes; anything else is rejected.
pub fn decode_u32_le(data: &[u8]) -> Option<u32> {
    if data.len() != 4 {
        return None;
    }
    Some(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

/// Decode a boolean from the first payload byte (non-zero = true).
pub fn decode_bool(data: &[u8]) -> Option<bool> {
    data.first().map(|&b| b != 0)
}

/// Decode text by mapping each wire byte to one character.
///
/// This is NOT UTF-8 decoding: a multi-byte sequence comes out as one
/// character per byte. Deployed centrals write and read names this way, so
/// the mapping is kept bit-compatible rather than corrected. Payloads
/// longer than `MAX_VALUE_LEN` wire bytes are rejected.
pub fn decode_text(data: &[u8]) -> Option<String<MAX_TEXT_LEN>> {
    if data.len() > MAX_VALUE_LEN {
        return None;
    }
    let mut text = String::new();
    for &byte in data {
        // Chars up to U+00FF store as at most two bytes, so MAX_VALUE_LEN
        // wire bytes always fit in MAX_TEXT_LEN.
        text.push(byte as char).ok()?;
    }
    Some(text)
}

/// Encode text back to wire bytes, one byte per character.
///
/// Exact inverse of [`decode_text`]: each character contributes the low
/// byte of its code point.
pub fn encode_text(s: &str) -> Vec<u8, MAX_VALUE_LEN> {
    let mut out = Vec::new();
    for c in s.chars() {
        if out.push(c as u32 as u8).is_err() {
            break;
        }
    }
    out
}
