//! Fixed 4-byte big-endian integer conversion.

use crate::error::AlupError;

/// Decode a big-endian `i32` from the first 4 bytes of `bytes`.
///
/// Fails when fewer than 4 bytes are supplied.
pub fn bytes_to_int(bytes: &[u8]) -> Result<i32, AlupError> {
    let array: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or(AlupError::TruncatedInt(bytes.len()))?;
    Ok(i32::from_be_bytes(array))
}

/// Encode `value` as 4 big-endian bytes.
pub fn int_to_bytes(value: i32) -> [u8; 4] {
    value.to_be_bytes()
}
