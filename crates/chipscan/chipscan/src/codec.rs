//! Hex text encoding of card data
//!
//! All hex produced by this crate is uppercase without separators, which is
//! what the verification service expects. Decoding accepts either case.

use crate::error::{Error, Result};

/// Encode bytes as uppercase hex
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode_upper(bytes)
}

/// Decode a hex string
///
/// Fails with [`Error::MalformedHex`] on odd length or non-hex characters.
pub fn from_hex(input: &str) -> Result<Vec<u8>> {
    hex::decode(input).map_err(|source| Error::MalformedHex {
        input: input.to_string(),
        source,
    })
}

/// Copy of `bytes` in reverse order
///
/// Readers return the UID least significant byte first.
pub fn reverse_byte_order(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}
