//! Vector primitives for the chunked backends
//!
//! The validation and transcoding algorithms in `crate::chunked` are written
//! once against the [`Vector`] trait. Each architecture only supplies the
//! primitives: byte-lane logic, a 16-entry table lookup, lane shifts across
//! two consecutive chunks and a sign-bit mask, plus range masks, OR
//! reductions, widening and narrowing over 16- and 32-bit units. Runtime
//! CPU feature detection is cached after the first call.

use crate::base64::Base64Blocks;
use crate::core::encoding::Endianness;
#[cfg(target_arch = "x86_64")]
use std::sync::OnceLock;

mod portable;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod x86_64;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
mod aarch64;

pub(crate) use portable::Portable;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) use x86_64::{Avx2, Ssse3};

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
pub(crate) use aarch64::Neon;

/// A chunk of `LANES` bytes processed in lockstep.
///
/// Values of an architecture-specific implementer may only be created once
/// the matching CPU features were detected; the backend registry enforces
/// this by only handing out supported backends.
pub(crate) trait Vector: Copy + Base64Blocks {
    const LANES: usize;

    fn splat(value: u8) -> Self;

    /// Loads the first `LANES` bytes of `src`.
    ///
    /// # Panics
    /// If `src` is shorter than `LANES`.
    fn load(src: &[u8]) -> Self;

    fn or(self, other: Self) -> Self;
    fn and(self, other: Self) -> Self;
    fn xor(self, other: Self) -> Self;

    /// Shifts every lane right by four bits.
    fn shr4(self) -> Self;

    /// Replaces every lane, which must be below 16, with `table[lane]`.
    fn lookup16(self, table: &[u8; 16]) -> Self;

    fn saturating_sub(self, other: Self) -> Self;

    /// Lane `i` becomes lane `i - 1`, with the last lane of `prev` in lane 0.
    fn prev1(self, prev: Self) -> Self;
    fn prev2(self, prev: Self) -> Self;
    fn prev3(self, prev: Self) -> Self;

    fn any_set(self) -> bool;

    /// Bit `i` is the top bit of lane `i`.
    fn high_bits(self) -> u64;

    fn is_ascii(self) -> bool {
        self.high_bits() == 0
    }

    // The wide-unit primitives below read exactly `LANES` units (not bytes)
    // from the front of their slices and panic if fewer are given.

    /// Bit `i` is set when unit `i`, read in `endian` order, lies in `lo..=hi`.
    fn u16_in_range(src: &[u16], endian: Endianness, lo: u16, hi: u16) -> u64;

    /// OR of the units as stored, without byte-order conversion.
    fn u16_or(src: &[u16]) -> u16;

    /// Bit `i` is set when `src[i]` lies in `lo..=hi`.
    fn u32_in_range(src: &[u32], lo: u32, hi: u32) -> u64;

    fn u32_or(src: &[u32]) -> u32;

    /// Zero-extends each byte into a unit stored in `endian` order.
    fn widen_u16(src: &[u8], dst: &mut [u16], endian: Endianness);

    fn widen_u32(src: &[u8], dst: &mut [u32]);

    /// Truncates each unit, read in `endian` order, to a byte. Every unit
    /// must be at most 0xFF.
    fn narrow_u16(src: &[u16], endian: Endianness, dst: &mut [u8]);

    /// Truncates each value to a byte. Every value must be at most 0xFF.
    fn narrow_u32(src: &[u32], dst: &mut [u8]);

    /// Runs `f` with this backend's target features enabled, so the generic
    /// chunk loops get compiled for them.
    #[inline(always)]
    fn with_features<R>(f: impl FnOnce() -> R) -> R {
        f()
    }
}

// CPU feature detection cache
#[cfg(target_arch = "x86_64")]
static HAS_AVX2: OnceLock<bool> = OnceLock::new();

#[cfg(target_arch = "x86_64")]
static HAS_SSSE3: OnceLock<bool> = OnceLock::new();

/// Check if AVX2 is available (cached after first call)
#[cfg(target_arch = "x86_64")]
pub fn has_avx2() -> bool {
    *HAS_AVX2.get_or_init(|| is_x86_feature_detected!("avx2"))
}

/// Check if SSSE3 is available (cached after first call)
#[cfg(target_arch = "x86_64")]
pub fn has_ssse3() -> bool {
    *HAS_SSSE3.get_or_init(|| is_x86_feature_detected!("ssse3"))
}

#[cfg(not(target_arch = "x86_64"))]
pub fn has_avx2() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
pub fn has_ssse3() -> bool {
    false
}

/// NEON is part of the aarch64 baseline.
#[cfg(target_arch = "aarch64")]
pub fn has_neon() -> bool {
    true
}

#[cfg(not(target_arch = "aarch64"))]
pub fn has_neon() -> bool {
    false
}
