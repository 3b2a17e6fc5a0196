//! Versioned value envelope: [version:i64 BE][payload]

use crate::error::EncodingError;
use std::convert::TryInto;

/// Size of the version header in bytes.
pub const VERSION_LEN: usize = 8;

/// Encodes a payload with its version header.
pub fn encode_versioned(version: i64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(VERSION_LEN + payload.len());
    buf.extend_from_slice(&version.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Splits an envelope into its version and payload.
pub fn decode_versioned(encoded: &[u8]) -> Result<(i64, &[u8]), EncodingError> {
    let header: [u8; VERSION_LEN] = encoded
        .get(..VERSION_LEN)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            EncodingError::InvalidValueEncoding(format!(
                "Versioned value of {} bytes is shorter than its header",
                encoded.len()
            ))
        })?;

    Ok((i64::from_be_bytes(header), &encoded[VERSION_LEN..]))
}
