//! Unit-at-a-time reference implementation.
//!
//! Every routine here is the contract the chunked backends must reproduce
//! exactly, and also the tail path they fall back to. Error positions are
//! relative to the slice passed in.

pub(crate) mod ascii;
pub(crate) mod latin1;
pub(crate) mod utf16;
pub(crate) mod utf32;
pub(crate) mod utf8;

/// Bytes examined per step by the word-at-a-time ASCII fast paths.
pub(crate) const ASCII_STRIDE: usize = 16;

/// True if the 16 bytes at `bytes[..16]` are all ASCII.
#[inline(always)]
pub(crate) fn is_ascii_stride(bytes: &[u8]) -> bool {
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&bytes[..8]);
    hi.copy_from_slice(&bytes[8..16]);
    (u64::from_ne_bytes(lo) | u64::from_ne_bytes(hi)) & 0x8080_8080_8080_8080 == 0
}
