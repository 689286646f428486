//! Chunked validation and transcoding, generic over [`Vector`].
//!
//! Every routine walks the input in chunks of `V::LANES` units and only
//! advances past a chunk once it is known to be valid and to end on a
//! sequence boundary. A UTF-8 chunk ending inside a multi-byte sequence
//! advances short of it; a UTF-16 chunk ending in a high surrogate advances
//! one unit short. On the first chunk that shows an error, or once less than
//! a chunk remains, the scalar routine takes over from the current position,
//! so results are identical to the scalar reference by construction.
//!
//! [`Vector`]: crate::simd::Vector

pub(crate) mod latin1;
pub(crate) mod utf16;
pub(crate) mod utf32;
pub(crate) mod utf8;

/// Mask of the low `n` bits, `n <= 64`.
#[inline(always)]
pub(crate) fn low_mask(n: usize) -> u64 {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_mask() {
        assert_eq!(low_mask(0), 0);
        assert_eq!(low_mask(3), 0b111);
        assert_eq!(low_mask(64), u64::MAX);
    }
}
