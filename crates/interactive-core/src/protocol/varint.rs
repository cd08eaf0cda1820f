//! Unsigned LEB128 varints (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`); use `Buf` and `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut};

use crate::error::{InteractiveError, Result};

/// Longest encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` to `out`.
pub fn put_varint<B: BufMut>(out: &mut B, mut value: u64) {
    while value >= 0x80 {
        out.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.put_u8(value as u8);
}

/// Encoded length of `value` in bytes.
pub fn varint_len(mut value: u64) -> usize {
    let mut n = 1;
    while value >= 0x80 {
        value >>= 7;
        n += 1;
    }
    n
}

/// Read a varint from the front of `buf`, advancing past it.
pub fn get_varint<B: Buf>(buf: &mut B) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(InteractiveError::Codec("truncated varint prefix".into()));
        }
        let byte = buf.get_u8();
        let shift = 7 * i as u32;
        let low = u64::from(byte & 0x7f);
        if shift == 63 && low > 1 {
            return Err(InteractiveError::Codec("varint overflows u64".into()));
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(InteractiveError::Codec("varint longer than 10 bytes".into()))
}
