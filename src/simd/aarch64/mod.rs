//! aarch64 NEON vector (16 lanes)
//!
//! NEON is part of the aarch64 baseline, so no runtime check is needed.

use super::Vector;
use crate::base64::Base64Blocks;
use crate::core::encoding::Endianness;
use std::arch::aarch64::*;

const WEIGHTS16: [u16; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
const WEIGHTS32: [u32; 4] = [1, 2, 4, 8];

#[inline(always)]
fn load_u16x8(src: &[u16], swap: bool) -> uint16x8_t {
    let src = &src[..8];
    unsafe {
        let v = vld1q_u16(src.as_ptr());
        if swap { vreinterpretq_u16_u8(vrev16q_u8(vreinterpretq_u8_u16(v))) } else { v }
    }
}

/// One bit per lane of an all-ones/all-zeros comparison result.
#[inline(always)]
fn mask_u16x8(cmp: uint16x8_t) -> u64 {
    unsafe { vaddvq_u16(vandq_u16(cmp, vld1q_u16(WEIGHTS16.as_ptr()))) as u64 }
}

#[inline(always)]
fn in_range_u16x8(v: uint16x8_t, lo: u16, hi: u16) -> uint16x8_t {
    unsafe { vcleq_u16(vsubq_u16(v, vdupq_n_u16(lo)), vdupq_n_u16(hi.wrapping_sub(lo))) }
}

#[inline(always)]
fn mask_u32x4(cmp: uint32x4_t) -> u64 {
    unsafe { vaddvq_u32(vandq_u32(cmp, vld1q_u32(WEIGHTS32.as_ptr()))) as u64 }
}

#[inline(always)]
fn in_range_u32x4(v: uint32x4_t, lo: u32, hi: u32) -> uint32x4_t {
    unsafe { vcleq_u32(vsubq_u32(v, vdupq_n_u32(lo)), vdupq_n_u32(hi.wrapping_sub(lo))) }
}

#[derive(Clone, Copy)]
pub(crate) struct Neon(uint8x16_t);

impl Base64Blocks for Neon {}

impl Vector for Neon {
    const LANES: usize = 16;

    #[inline(always)]
    fn splat(value: u8) -> Self {
        Neon(unsafe { vdupq_n_u8(value) })
    }

    #[inline(always)]
    fn load(src: &[u8]) -> Self {
        let src = &src[..16];
        Neon(unsafe { vld1q_u8(src.as_ptr()) })
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        Neon(unsafe { vorrq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        Neon(unsafe { vandq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        Neon(unsafe { veorq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn shr4(self) -> Self {
        Neon(unsafe { vshrq_n_u8::<4>(self.0) })
    }

    #[inline(always)]
    fn lookup16(self, table: &[u8; 16]) -> Self {
        Neon(unsafe { vqtbl1q_u8(vld1q_u8(table.as_ptr()), self.0) })
    }

    #[inline(always)]
    fn saturating_sub(self, other: Self) -> Self {
        Neon(unsafe { vqsubq_u8(self.0, other.0) })
    }

    #[inline(always)]
    fn prev1(self, prev: Self) -> Self {
        Neon(unsafe { vextq_u8::<15>(prev.0, self.0) })
    }

    #[inline(always)]
    fn prev2(self, prev: Self) -> Self {
        Neon(unsafe { vextq_u8::<14>(prev.0, self.0) })
    }

    #[inline(always)]
    fn prev3(self, prev: Self) -> Self {
        Neon(unsafe { vextq_u8::<13>(prev.0, self.0) })
    }

    #[inline(always)]
    fn any_set(self) -> bool {
        unsafe { vmaxvq_u8(self.0) != 0 }
    }

    #[inline(always)]
    fn high_bits(self) -> u64 {
        // No movemask on NEON: weight each sign bit by its lane position
        // and add up each half.
        const WEIGHTS: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];
        unsafe {
            let signs = vshrq_n_u8::<7>(self.0);
            let weighted = vmulq_u8(signs, vld1q_u8(WEIGHTS.as_ptr()));
            let lo = vaddv_u8(vget_low_u8(weighted)) as u64;
            let hi = vaddv_u8(vget_high_u8(weighted)) as u64;
            lo | (hi << 8)
        }
    }

    #[inline(always)]
    fn is_ascii(self) -> bool {
        unsafe { vmaxvq_u8(self.0) < 0x80 }
    }

    #[inline(always)]
    fn u16_in_range(src: &[u16], endian: Endianness, lo: u16, hi: u16) -> u64 {
        let src = &src[..16];
        let swap = !endian.is_native();
        let low = mask_u16x8(in_range_u16x8(load_u16x8(&src[..8], swap), lo, hi));
        let high = mask_u16x8(in_range_u16x8(load_u16x8(&src[8..], swap), lo, hi));
        low | high << 8
    }

    #[inline(always)]
    fn u16_or(src: &[u16]) -> u16 {
        let src = &src[..16];
        let mut lanes = [0u16; 8];
        unsafe {
            let v = vorrq_u16(load_u16x8(&src[..8], false), load_u16x8(&src[8..], false));
            vst1q_u16(lanes.as_mut_ptr(), v);
        }
        lanes.iter().fold(0, |acc, &unit| acc | unit)
    }

    #[inline(always)]
    fn u32_in_range(src: &[u32], lo: u32, hi: u32) -> u64 {
        let src = &src[..16];
        src.chunks_exact(4).enumerate().fold(0u64, |mask, (k, quad)| {
            let v = unsafe { vld1q_u32(quad.as_ptr()) };
            mask | mask_u32x4(in_range_u32x4(v, lo, hi)) << (4 * k)
        })
    }

    #[inline(always)]
    fn u32_or(src: &[u32]) -> u32 {
        let src = &src[..16];
        let mut lanes = [0u32; 4];
        unsafe {
            let v = vorrq_u32(
                vorrq_u32(vld1q_u32(src.as_ptr()), vld1q_u32(src[4..].as_ptr())),
                vorrq_u32(vld1q_u32(src[8..].as_ptr()), vld1q_u32(src[12..].as_ptr())),
            );
            vst1q_u32(lanes.as_mut_ptr(), v);
        }
        lanes.iter().fold(0, |acc, &v| acc | v)
    }

    #[inline(always)]
    fn widen_u16(src: &[u8], dst: &mut [u16], endian: Endianness) {
        let dst = &mut dst[..16];
        let v = Self::load(src).0;
        unsafe {
            let mut lo = vmovl_u8(vget_low_u8(v));
            let mut hi = vmovl_u8(vget_high_u8(v));
            if !endian.is_native() {
                lo = vreinterpretq_u16_u8(vrev16q_u8(vreinterpretq_u8_u16(lo)));
                hi = vreinterpretq_u16_u8(vrev16q_u8(vreinterpretq_u8_u16(hi)));
            }
            vst1q_u16(dst.as_mut_ptr(), lo);
            vst1q_u16(dst[8..].as_mut_ptr(), hi);
        }
    }

    #[inline(always)]
    fn widen_u32(src: &[u8], dst: &mut [u32]) {
        let dst = &mut dst[..16];
        let v = Self::load(src).0;
        unsafe {
            let lo = vmovl_u8(vget_low_u8(v));
            let hi = vmovl_u8(vget_high_u8(v));
            let quads = [
                vmovl_u16(vget_low_u16(lo)),
                vmovl_u16(vget_high_u16(lo)),
                vmovl_u16(vget_low_u16(hi)),
                vmovl_u16(vget_high_u16(hi)),
            ];
            for (out, quad) in dst.chunks_exact_mut(4).zip(quads) {
                vst1q_u32(out.as_mut_ptr(), quad);
            }
        }
    }

    #[inline(always)]
    fn narrow_u16(src: &[u16], endian: Endianness, dst: &mut [u8]) {
        let src = &src[..16];
        let dst = &mut dst[..16];
        let swap = !endian.is_native();
        unsafe {
            let bytes = vcombine_u8(vmovn_u16(load_u16x8(&src[..8], swap)), vmovn_u16(load_u16x8(&src[8..], swap)));
            vst1q_u8(dst.as_mut_ptr(), bytes);
        }
    }

    #[inline(always)]
    fn narrow_u32(src: &[u32], dst: &mut [u8]) {
        let src = &src[..16];
        let dst = &mut dst[..16];
        unsafe {
            let lo = vcombine_u16(vmovn_u32(vld1q_u32(src.as_ptr())), vmovn_u32(vld1q_u32(src[4..].as_ptr())));
            let hi = vcombine_u16(vmovn_u32(vld1q_u32(src[8..].as_ptr())), vmovn_u32(vld1q_u32(src[12..].as_ptr())));
            vst1q_u8(dst.as_mut_ptr(), vcombine_u8(vmovn_u16(lo), vmovn_u16(hi)));
        }
    }
}
