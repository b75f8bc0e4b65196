//! Length-prefixed multi-part framing.
//!
//! Every part is written as:
//!
//! ```text
//! [n: u8 in 1..=255][len: n bytes, little-endian][part: len bytes]
//! ```
//!
//! `len` uses the fewest bytes that hold it, and a zero-length part is still
//! written as `n = 1, len = [0]`. Parts are concatenated with no outer
//! header; an empty list packs to an empty buffer.

use bytes::BufMut;

use crate::errors::CodecError;

/// Bytes needed to hold `len` in minimal little-endian form (at least 1).
fn length_width(len: u64) -> usize {
    if len == 0 { 1 } else { (u64::BITS - len.leading_zeros()).div_ceil(8) as usize }
}

/// Pack an ordered list of byte buffers into one buffer.
pub fn pack<P: AsRef<[u8]>>(parts: &[P]) -> Vec<u8> {
    let total: usize = parts
        .iter()
        .map(|p| {
            let len = p.as_ref().len();
            1 + length_width(len as u64) + len
        })
        .sum();

    let mut buf = Vec::with_capacity(total);
    for part in parts {
        let part = part.as_ref();
        let len = part.len() as u64;
        let width = length_width(len);

        buf.put_u8(width as u8);
        buf.put_slice(&len.to_le_bytes()[..width]);
        buf.put_slice(part);
    }

    debug_assert_eq!(buf.len(), total);
    buf
}

/// Recover the list of byte buffers written by [`pack`].
///
/// Accepts non-minimal length fields (high zero bytes) as long as the value
/// fits in `usize`.
///
/// # Errors
///
/// - `CodecError::ZeroLengthHeader` if a header byte is 0
/// - `CodecError::LengthTruncated` if the length field runs off the end
/// - `CodecError::LengthOverflow` if the declared length does not fit
/// - `CodecError::PartTruncated` if the part runs off the end
pub fn unpack(buf: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut parts = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let width = usize::from(buf[offset]);
        if width == 0 {
            return Err(CodecError::ZeroLengthHeader { offset });
        }
        offset += 1;

        let available = buf.len() - offset;
        if width > available {
            return Err(CodecError::LengthTruncated { offset, needed: width, available });
        }

        let declared = decode_length(&buf[offset..offset + width])
            .ok_or(CodecError::LengthOverflow { offset })?;
        offset += width;

        let available = buf.len() - offset;
        let len = usize::try_from(declared).map_err(|_| CodecError::LengthOverflow { offset })?;
        if len > available {
            return Err(CodecError::PartTruncated { offset, declared, available });
        }

        parts.push(buf[offset..offset + len].to_vec());
        offset += len;
    }

    Ok(parts)
}

/// Unpack a buffer that must contain exactly `N` parts.
///
/// # Errors
///
/// - Any [`unpack`] error
/// - `CodecError::PartCount` if the part count differs from `N`
pub fn unpack_exact<const N: usize>(buf: &[u8]) -> Result<[Vec<u8>; N], CodecError> {
    let parts = unpack(buf)?;
    <[Vec<u8>; N]>::try_from(parts)
        .map_err(|parts| CodecError::PartCount { expected: N, actual: parts.len() })
}

/// Little-endian decode; `None` if the value exceeds `u64`.
fn decode_length(bytes: &[u8]) -> Option<u64> {
    bytes
        .iter()
        .rev()
        .try_fold(0u64, |acc, &b| acc.checked_mul(256).and_then(|v| v.checked_add(u64::from(b))))
}
