//! # Canonical Hashing
//!
//! Content hashes are double SHA-256 over a canonical little-endian byte
//! stream. Strings are length-prefixed with a compact-size integer so two
//! independent encoders always produce the same bytes.

use crate::entities::Hash;
use primitive_types::U256;
use sha2::{Digest, Sha256};

/// Double SHA-256 of `data`.
pub fn double_sha256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Accumulates a canonical byte stream and hashes it.
#[derive(Debug, Default, Clone)]
pub struct HashWriter {
    buf: Vec<u8>,
}

impl HashWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a 64-bit signed integer (little-endian).
    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a compact-size length prefix followed by the UTF-8 bytes.
    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.write_compact_size(value.len() as u64);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    fn write_compact_size(&mut self, len: u64) {
        match len {
            0..=0xfc => self.buf.push(len as u8),
            0xfd..=0xffff => {
                self.buf.push(0xfd);
                self.buf.extend_from_slice(&(len as u16).to_le_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buf.push(0xfe);
                self.buf.extend_from_slice(&(len as u32).to_le_bytes());
            }
            _ => {
                self.buf.push(0xff);
                self.buf.extend_from_slice(&len.to_le_bytes());
            }
        }
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Double SHA-256 of everything written.
    pub fn finish(&self) -> Hash {
        double_sha256(&self.buf)
    }
}

/// Encode a 256-bit target in the compact "bits" representation.
pub fn compact_from_u256(target: U256) -> u32 {
    let mut size = (target.bits() as u32 + 7) / 8;
    let mut compact: u32 = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3))).low_u64() as u32
    };
    // The sign bit is reserved; shift the mantissa if it would be set.
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size << 24)
}
