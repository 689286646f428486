//! x86_64 vectors: SSSE3 (16 lanes) and AVX2 (32 lanes)
//!
//! Both types wrap a register directly. The intrinsics are sound to call
//! because instances are only reachable through a backend whose required
//! features were detected at runtime.

use super::Vector;
use crate::base64::{Alphabet, Base64Blocks, decode_block_scalar, encode_block_scalar};
use crate::core::encoding::Endianness;
use std::arch::x86_64::*;

mod base64;

/// Byte shuffle that swaps the two halves of every 16-bit lane.
const SWAP16: [u8; 16] = [1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14];

// Unsigned range tests go through signed compares: `x` is in `lo..=hi` iff
// `x - lo` (wrapping) is at most `hi - lo`, and flipping the sign bit of
// both sides turns that into a signed comparison. Lanes come out all ones
// when they fall outside the range.

#[inline(always)]
fn load_u16x8(src: &[u16], swap: bool) -> __m128i {
    let src = &src[..8];
    unsafe {
        let v = _mm_loadu_si128(src.as_ptr() as *const __m128i);
        if swap { _mm_shuffle_epi8(v, _mm_loadu_si128(SWAP16.as_ptr() as *const __m128i)) } else { v }
    }
}

#[inline(always)]
fn outside_u16x8(v: __m128i, lo: u16, hi: u16) -> __m128i {
    unsafe {
        let shifted = _mm_xor_si128(_mm_sub_epi16(v, _mm_set1_epi16(lo as i16)), _mm_set1_epi16(i16::MIN));
        _mm_cmpgt_epi16(shifted, _mm_set1_epi16(((hi.wrapping_sub(lo)) ^ 0x8000) as i16))
    }
}

#[inline(always)]
fn load_u32x4(src: &[u32]) -> __m128i {
    let src = &src[..4];
    unsafe { _mm_loadu_si128(src.as_ptr() as *const __m128i) }
}

#[inline(always)]
fn outside_u32x4(v: __m128i, lo: u32, hi: u32) -> __m128i {
    unsafe {
        let shifted = _mm_xor_si128(_mm_sub_epi32(v, _mm_set1_epi32(lo as i32)), _mm_set1_epi32(i32::MIN));
        _mm_cmpgt_epi32(shifted, _mm_set1_epi32(((hi.wrapping_sub(lo)) ^ 0x8000_0000) as i32))
    }
}

#[inline(always)]
fn load_u16x16(src: &[u16], swap: bool) -> __m256i {
    let src = &src[..16];
    unsafe {
        let v = _mm256_loadu_si256(src.as_ptr() as *const __m256i);
        if swap {
            let table = _mm256_broadcastsi128_si256(_mm_loadu_si128(SWAP16.as_ptr() as *const __m128i));
            _mm256_shuffle_epi8(v, table)
        } else {
            v
        }
    }
}

#[inline(always)]
fn outside_u16x16(v: __m256i, lo: u16, hi: u16) -> __m256i {
    unsafe {
        let shifted = _mm256_xor_si256(_mm256_sub_epi16(v, _mm256_set1_epi16(lo as i16)), _mm256_set1_epi16(i16::MIN));
        _mm256_cmpgt_epi16(shifted, _mm256_set1_epi16(((hi.wrapping_sub(lo)) ^ 0x8000) as i16))
    }
}

#[inline(always)]
fn load_u32x8(src: &[u32]) -> __m256i {
    let src = &src[..8];
    unsafe { _mm256_loadu_si256(src.as_ptr() as *const __m256i) }
}

#[inline(always)]
fn outside_u32x8(v: __m256i, lo: u32, hi: u32) -> __m256i {
    unsafe {
        let shifted = _mm256_xor_si256(_mm256_sub_epi32(v, _mm256_set1_epi32(lo as i32)), _mm256_set1_epi32(i32::MIN));
        _mm256_cmpgt_epi32(shifted, _mm256_set1_epi32(((hi.wrapping_sub(lo)) ^ 0x8000_0000) as i32))
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Ssse3(__m128i);

#[target_feature(enable = "ssse3")]
unsafe fn with_ssse3<R>(f: impl FnOnce() -> R) -> R {
    f()
}

impl Vector for Ssse3 {
    const LANES: usize = 16;

    #[inline(always)]
    fn splat(value: u8) -> Self {
        Ssse3(unsafe { _mm_set1_epi8(value as i8) })
    }

    #[inline(always)]
    fn load(src: &[u8]) -> Self {
        let src = &src[..16];
        Ssse3(unsafe { _mm_loadu_si128(src.as_ptr() as *const __m128i) })
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        Ssse3(unsafe { _mm_or_si128(self.0, other.0) })
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        Ssse3(unsafe { _mm_and_si128(self.0, other.0) })
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        Ssse3(unsafe { _mm_xor_si128(self.0, other.0) })
    }

    #[inline(always)]
    fn shr4(self) -> Self {
        // 16-bit shift, then drop the bits pulled in from the neighbour lane
        Ssse3(unsafe { _mm_and_si128(_mm_srli_epi16::<4>(self.0), _mm_set1_epi8(0x0F)) })
    }

    #[inline(always)]
    fn lookup16(self, table: &[u8; 16]) -> Self {
        Ssse3(unsafe {
            let lut = _mm_loadu_si128(table.as_ptr() as *const __m128i);
            _mm_shuffle_epi8(lut, self.0)
        })
    }

    #[inline(always)]
    fn saturating_sub(self, other: Self) -> Self {
        Ssse3(unsafe { _mm_subs_epu8(self.0, other.0) })
    }

    #[inline(always)]
    fn prev1(self, prev: Self) -> Self {
        Ssse3(unsafe { _mm_alignr_epi8::<15>(self.0, prev.0) })
    }

    #[inline(always)]
    fn prev2(self, prev: Self) -> Self {
        Ssse3(unsafe { _mm_alignr_epi8::<14>(self.0, prev.0) })
    }

    #[inline(always)]
    fn prev3(self, prev: Self) -> Self {
        Ssse3(unsafe { _mm_alignr_epi8::<13>(self.0, prev.0) })
    }

    #[inline(always)]
    fn any_set(self) -> bool {
        unsafe { _mm_movemask_epi8(_mm_cmpeq_epi8(self.0, _mm_setzero_si128())) != 0xFFFF }
    }

    #[inline(always)]
    fn high_bits(self) -> u64 {
        unsafe { _mm_movemask_epi8(self.0) as u32 as u64 }
    }

    #[inline(always)]
    fn u16_in_range(src: &[u16], endian: Endianness, lo: u16, hi: u16) -> u64 {
        let src = &src[..16];
        let swap = !endian.is_native();
        let a = outside_u16x8(load_u16x8(&src[..8], swap), lo, hi);
        let b = outside_u16x8(load_u16x8(&src[8..], swap), lo, hi);
        let outside = unsafe { _mm_movemask_epi8(_mm_packs_epi16(a, b)) } as u32;
        (!outside & 0xFFFF) as u64
    }

    #[inline(always)]
    fn u16_or(src: &[u16]) -> u16 {
        let src = &src[..16];
        let mut lanes = [0u16; 8];
        unsafe {
            let v = _mm_or_si128(load_u16x8(&src[..8], false), load_u16x8(&src[8..], false));
            _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, v);
        }
        lanes.iter().fold(0, |acc, &unit| acc | unit)
    }

    #[inline(always)]
    fn u32_in_range(src: &[u32], lo: u32, hi: u32) -> u64 {
        let src = &src[..16];
        let outside = src.chunks_exact(4).enumerate().fold(0u64, |mask, (k, quad)| {
            let bits = unsafe { _mm_movemask_ps(_mm_castsi128_ps(outside_u32x4(load_u32x4(quad), lo, hi))) };
            mask | (bits as u64) << (4 * k)
        });
        !outside & 0xFFFF
    }

    #[inline(always)]
    fn u32_or(src: &[u32]) -> u32 {
        let src = &src[..16];
        let mut lanes = [0u32; 4];
        unsafe {
            let v = _mm_or_si128(
                _mm_or_si128(load_u32x4(&src[..4]), load_u32x4(&src[4..8])),
                _mm_or_si128(load_u32x4(&src[8..12]), load_u32x4(&src[12..])),
            );
            _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, v);
        }
        lanes.iter().fold(0, |acc, &v| acc | v)
    }

    #[inline(always)]
    fn widen_u16(src: &[u8], dst: &mut [u16], endian: Endianness) {
        let dst = &mut dst[..16];
        let v = Self::load(src).0;
        unsafe {
            let zero = _mm_setzero_si128();
            let (lo, hi) = if endian.is_native() {
                (_mm_unpacklo_epi8(v, zero), _mm_unpackhi_epi8(v, zero))
            } else {
                (_mm_unpacklo_epi8(zero, v), _mm_unpackhi_epi8(zero, v))
            };
            _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, lo);
            _mm_storeu_si128(dst[8..].as_mut_ptr() as *mut __m128i, hi);
        }
    }

    #[inline(always)]
    fn widen_u32(src: &[u8], dst: &mut [u32]) {
        let dst = &mut dst[..16];
        let v = Self::load(src).0;
        unsafe {
            let zero = _mm_setzero_si128();
            let lo = _mm_unpacklo_epi8(v, zero);
            let hi = _mm_unpackhi_epi8(v, zero);
            let quads = [
                _mm_unpacklo_epi16(lo, zero),
                _mm_unpackhi_epi16(lo, zero),
                _mm_unpacklo_epi16(hi, zero),
                _mm_unpackhi_epi16(hi, zero),
            ];
            for (out, quad) in dst.chunks_exact_mut(4).zip(quads) {
                _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, quad);
            }
        }
    }

    #[inline(always)]
    fn narrow_u16(src: &[u16], endian: Endianness, dst: &mut [u8]) {
        let src = &src[..16];
        let dst = &mut dst[..16];
        let swap = !endian.is_native();
        unsafe {
            let packed = _mm_packus_epi16(load_u16x8(&src[..8], swap), load_u16x8(&src[8..], swap));
            _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, packed);
        }
    }

    #[inline(always)]
    fn narrow_u32(src: &[u32], dst: &mut [u8]) {
        let src = &src[..16];
        let dst = &mut dst[..16];
        unsafe {
            let ab = _mm_packs_epi32(load_u32x4(&src[..4]), load_u32x4(&src[4..8]));
            let cd = _mm_packs_epi32(load_u32x4(&src[8..12]), load_u32x4(&src[12..]));
            _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, _mm_packus_epi16(ab, cd));
        }
    }

    #[inline(always)]
    fn with_features<R>(f: impl FnOnce() -> R) -> R {
        unsafe { with_ssse3(f) }
    }
}

impl Base64Blocks for Ssse3 {
    fn decode_block(input: &[u8; 16], output: &mut [u8; 12], alphabet: Alphabet) -> bool {
        match alphabet {
            Alphabet::Standard => unsafe { base64::decode_block_standard(input, output) },
            _ => decode_block_scalar(input, output, alphabet),
        }
    }

    fn encode_block(input: &[u8; 16], output: &mut [u8; 16], alphabet: Alphabet) {
        unsafe { base64::encode_block(input, output, alphabet == Alphabet::Url) }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Avx2(__m256i);

#[target_feature(enable = "avx2")]
unsafe fn with_avx2<R>(f: impl FnOnce() -> R) -> R {
    f()
}

impl Vector for Avx2 {
    const LANES: usize = 32;

    #[inline(always)]
    fn splat(value: u8) -> Self {
        Avx2(unsafe { _mm256_set1_epi8(value as i8) })
    }

    #[inline(always)]
    fn load(src: &[u8]) -> Self {
        let src = &src[..32];
        Avx2(unsafe { _mm256_loadu_si256(src.as_ptr() as *const __m256i) })
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        Avx2(unsafe { _mm256_or_si256(self.0, other.0) })
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        Avx2(unsafe { _mm256_and_si256(self.0, other.0) })
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        Avx2(unsafe { _mm256_xor_si256(self.0, other.0) })
    }

    #[inline(always)]
    fn shr4(self) -> Self {
        Avx2(unsafe { _mm256_and_si256(_mm256_srli_epi16::<4>(self.0), _mm256_set1_epi8(0x0F)) })
    }

    #[inline(always)]
    fn lookup16(self, table: &[u8; 16]) -> Self {
        // vpshufb looks up within each 128-bit half, so both halves get the table
        Avx2(unsafe {
            let lut = _mm256_broadcastsi128_si256(_mm_loadu_si128(table.as_ptr() as *const __m128i));
            _mm256_shuffle_epi8(lut, self.0)
        })
    }

    #[inline(always)]
    fn saturating_sub(self, other: Self) -> Self {
        Avx2(unsafe { _mm256_subs_epu8(self.0, other.0) })
    }

    #[inline(always)]
    fn prev1(self, prev: Self) -> Self {
        Avx2(unsafe { _mm256_alignr_epi8::<15>(self.0, _mm256_permute2x128_si256::<0x21>(prev.0, self.0)) })
    }

    #[inline(always)]
    fn prev2(self, prev: Self) -> Self {
        Avx2(unsafe { _mm256_alignr_epi8::<14>(self.0, _mm256_permute2x128_si256::<0x21>(prev.0, self.0)) })
    }

    #[inline(always)]
    fn prev3(self, prev: Self) -> Self {
        Avx2(unsafe { _mm256_alignr_epi8::<13>(self.0, _mm256_permute2x128_si256::<0x21>(prev.0, self.0)) })
    }

    #[inline(always)]
    fn any_set(self) -> bool {
        unsafe { _mm256_testz_si256(self.0, self.0) == 0 }
    }

    #[inline(always)]
    fn high_bits(self) -> u64 {
        unsafe { _mm256_movemask_epi8(self.0) as u32 as u64 }
    }

    #[inline(always)]
    fn u16_in_range(src: &[u16], endian: Endianness, lo: u16, hi: u16) -> u64 {
        let src = &src[..32];
        let swap = !endian.is_native();
        let a = outside_u16x16(load_u16x16(&src[..16], swap), lo, hi);
        let b = outside_u16x16(load_u16x16(&src[16..], swap), lo, hi);
        // packs works per 128-bit half; put the quarters back in unit order
        let outside = unsafe { _mm256_movemask_epi8(_mm256_permute4x64_epi64::<0xD8>(_mm256_packs_epi16(a, b))) };
        !(outside as u32) as u64
    }

    #[inline(always)]
    fn u16_or(src: &[u16]) -> u16 {
        let src = &src[..32];
        let mut lanes = [0u16; 16];
        unsafe {
            let v = _mm256_or_si256(load_u16x16(&src[..16], false), load_u16x16(&src[16..], false));
            _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, v);
        }
        lanes.iter().fold(0, |acc, &unit| acc | unit)
    }

    #[inline(always)]
    fn u32_in_range(src: &[u32], lo: u32, hi: u32) -> u64 {
        let src = &src[..32];
        let outside = src.chunks_exact(8).enumerate().fold(0u64, |mask, (k, oct)| {
            let bits = unsafe { _mm256_movemask_ps(_mm256_castsi256_ps(outside_u32x8(load_u32x8(oct), lo, hi))) };
            mask | (bits as u64) << (8 * k)
        });
        !outside & 0xFFFF_FFFF
    }

    #[inline(always)]
    fn u32_or(src: &[u32]) -> u32 {
        let src = &src[..32];
        let mut lanes = [0u32; 8];
        unsafe {
            let v = _mm256_or_si256(
                _mm256_or_si256(load_u32x8(&src[..8]), load_u32x8(&src[8..16])),
                _mm256_or_si256(load_u32x8(&src[16..24]), load_u32x8(&src[24..])),
            );
            _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, v);
        }
        lanes.iter().fold(0, |acc, &v| acc | v)
    }

    #[inline(always)]
    fn widen_u16(src: &[u8], dst: &mut [u16], endian: Endianness) {
        let src = &src[..32];
        let dst = &mut dst[..32];
        for (half, out) in src.chunks_exact(16).zip(dst.chunks_exact_mut(16)) {
            unsafe {
                let mut wide = _mm256_cvtepu8_epi16(_mm_loadu_si128(half.as_ptr() as *const __m128i));
                if !endian.is_native() {
                    let table = _mm256_broadcastsi128_si256(_mm_loadu_si128(SWAP16.as_ptr() as *const __m128i));
                    wide = _mm256_shuffle_epi8(wide, table);
                }
                _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, wide);
            }
        }
    }

    #[inline(always)]
    fn widen_u32(src: &[u8], dst: &mut [u32]) {
        let src = &src[..32];
        let dst = &mut dst[..32];
        for (oct, out) in src.chunks_exact(8).zip(dst.chunks_exact_mut(8)) {
            unsafe {
                let wide = _mm256_cvtepu8_epi32(_mm_loadl_epi64(oct.as_ptr() as *const __m128i));
                _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, wide);
            }
        }
    }

    #[inline(always)]
    fn narrow_u16(src: &[u16], endian: Endianness, dst: &mut [u8]) {
        let src = &src[..32];
        let dst = &mut dst[..32];
        let swap = !endian.is_native();
        unsafe {
            let packed = _mm256_packus_epi16(load_u16x16(&src[..16], swap), load_u16x16(&src[16..], swap));
            let ordered = _mm256_permute4x64_epi64::<0xD8>(packed);
            _mm256_storeu_si256(dst.as_mut_ptr() as *mut __m256i, ordered);
        }
    }

    #[inline(always)]
    fn narrow_u32(src: &[u32], dst: &mut [u8]) {
        let src = &src[..32];
        let dst = &mut dst[..32];
        unsafe {
            let ab = _mm256_packs_epi32(load_u32x8(&src[..8]), load_u32x8(&src[8..16]));
            let cd = _mm256_packs_epi32(load_u32x8(&src[16..24]), load_u32x8(&src[24..]));
            // each half holds four dwords, one from every source register
            let order = _mm256_setr_epi32(0, 4, 1, 5, 2, 6, 3, 7);
            let ordered = _mm256_permutevar8x32_epi32(_mm256_packus_epi16(ab, cd), order);
            _mm256_storeu_si256(dst.as_mut_ptr() as *mut __m256i, ordered);
        }
    }

    #[inline(always)]
    fn with_features<R>(f: impl FnOnce() -> R) -> R {
        unsafe { with_avx2(f) }
    }
}

// AVX2 implies SSSE3; the 16-character Base64 kernels are shared.
impl Base64Blocks for Avx2 {
    fn decode_block(input: &[u8; 16], output: &mut [u8; 12], alphabet: Alphabet) -> bool {
        Ssse3::decode_block(input, output, alphabet)
    }

    fn encode_block(input: &[u8; 16], output: &mut [u8; 16], alphabet: Alphabet) {
        Ssse3::encode_block(input, output, alphabet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::has_ssse3;

    #[test]
    fn test_block_kernels_match_scalar() {
        if !has_ssse3() {
            eprintln!("SSSE3 not available, skipping test");
            return;
        }
        let input: [u8; 16] = *b"\x00\x10\x83\x10\x51\x87\x20\x92\x8b\x30\xd3\x8f\xff\xfe\xfd\xfc";
        for alphabet in [Alphabet::Standard, Alphabet::Url] {
            let mut simd = [0u8; 16];
            let mut scalar = [0u8; 16];
            Ssse3::encode_block(&input, &mut simd, alphabet);
            encode_block_scalar(&input, &mut scalar, alphabet);
            assert_eq!(simd, scalar);
        }

        let text = *b"SGVsbG8sIFdvcmxk";
        let mut simd = [0u8; 12];
        assert!(Ssse3::decode_block(&text, &mut simd, Alphabet::Standard));
        assert_eq!(&simd, b"Hello, World");

        let mut bad = text;
        bad[5] = b'=';
        assert!(!Ssse3::decode_block(&bad, &mut simd, Alphabet::Standard));
        bad[5] = b'-';
        assert!(!Ssse3::decode_block(&bad, &mut simd, Alphabet::Standard));
    }
}
