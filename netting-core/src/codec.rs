//! Canonical text form of 32-byte identifiers
//!
//! `0x` followed by 64 lowercase hex digits, 66 characters in total.
//! Decoding accepts only that exact form, so `encode(decode(s)) == s`
//! holds for every string `decode` accepts.

use crate::{Error, Result};

/// Prefix marker of the canonical form
pub const PREFIX: &str = "0x";

/// Length of an encoded identifier
pub const ENCODED_LEN: usize = 66;

/// Encode a 32-byte identifier
pub fn encode(bytes: &[u8; 32]) -> String {
    let mut out = String::with_capacity(ENCODED_LEN);
    out.push_str(PREFIX);
    out.push_str(&hex::encode(bytes));
    out
}

/// Decode a canonical identifier string
pub fn decode(text: &str) -> Result<[u8; 32]> {
    if text.len() != ENCODED_LEN {
        return Err(Error::MalformedIdentifier(format!(
            "expected {} characters, got {}: {:?}",
            ENCODED_LEN,
            text.len(),
            text
        )));
    }

    let digits = text.strip_prefix(PREFIX).ok_or_else(|| {
        Error::MalformedIdentifier(format!("missing {} prefix: {:?}", PREFIX, text))
    })?;

    // hex::decode accepts uppercase, the canonical form does not
    if !digits.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(Error::MalformedIdentifier(format!(
            "non lowercase-hex digits: {:?}",
            text
        )));
    }

    let mut out = [0u8; 32];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| Error::MalformedIdentifier(format!("{}: {:?}", e, text)))?;
    Ok(out)
}
