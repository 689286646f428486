use super::Vector;
use crate::base64::Base64Blocks;
use crate::core::encoding::Endianness;

/// Plain byte-array vector; any width from 1 to 64 lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Portable<const N: usize>([u8; N]);

impl<const N: usize> Portable<N> {
    #[inline(always)]
    fn map(self, f: impl Fn(u8) -> u8) -> Self {
        Portable(self.0.map(f))
    }

    #[inline(always)]
    fn zip(self, other: Self, f: impl Fn(u8, u8) -> u8) -> Self {
        Portable(std::array::from_fn(|i| f(self.0[i], other.0[i])))
    }

    #[inline(always)]
    fn prev<const K: usize>(self, prev: Self) -> Self {
        Portable(std::array::from_fn(|i| {
            if i >= K { self.0[i - K] } else { prev.0[N - K + i] }
        }))
    }
}

impl<const N: usize> Base64Blocks for Portable<N> {}

impl<const N: usize> Vector for Portable<N> {
    const LANES: usize = N;

    #[inline(always)]
    fn splat(value: u8) -> Self {
        Portable([value; N])
    }

    #[inline(always)]
    fn load(src: &[u8]) -> Self {
        let mut lanes = [0u8; N];
        lanes.copy_from_slice(&src[..N]);
        Portable(lanes)
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        self.zip(other, |a, b| a | b)
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        self.zip(other, |a, b| a & b)
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        self.zip(other, |a, b| a ^ b)
    }

    #[inline(always)]
    fn shr4(self) -> Self {
        self.map(|a| a >> 4)
    }

    #[inline(always)]
    fn lookup16(self, table: &[u8; 16]) -> Self {
        self.map(|a| table[(a & 0x0F) as usize])
    }

    #[inline(always)]
    fn saturating_sub(self, other: Self) -> Self {
        self.zip(other, u8::saturating_sub)
    }

    #[inline(always)]
    fn prev1(self, prev: Self) -> Self {
        self.prev::<1>(prev)
    }

    #[inline(always)]
    fn prev2(self, prev: Self) -> Self {
        self.prev::<2>(prev)
    }

    #[inline(always)]
    fn prev3(self, prev: Self) -> Self {
        self.prev::<3>(prev)
    }

    #[inline(always)]
    fn any_set(self) -> bool {
        self.0.iter().any(|&a| a != 0)
    }

    #[inline(always)]
    fn high_bits(self) -> u64 {
        self.0
            .iter()
            .enumerate()
            .fold(0u64, |mask, (i, &a)| mask | (((a >> 7) as u64) << i))
    }

    #[inline(always)]
    fn u16_in_range(src: &[u16], endian: Endianness, lo: u16, hi: u16) -> u64 {
        src[..N].iter().enumerate().fold(0u64, |mask, (i, &unit)| {
            let unit = endian.u16_to_native(unit);
            mask | ((lo <= unit && unit <= hi) as u64) << i
        })
    }

    #[inline(always)]
    fn u16_or(src: &[u16]) -> u16 {
        src[..N].iter().fold(0, |acc, &unit| acc | unit)
    }

    #[inline(always)]
    fn u32_in_range(src: &[u32], lo: u32, hi: u32) -> u64 {
        src[..N]
            .iter()
            .enumerate()
            .fold(0u64, |mask, (i, &v)| mask | ((lo <= v && v <= hi) as u64) << i)
    }

    #[inline(always)]
    fn u32_or(src: &[u32]) -> u32 {
        src[..N].iter().fold(0, |acc, &v| acc | v)
    }

    #[inline(always)]
    fn widen_u16(src: &[u8], dst: &mut [u16], endian: Endianness) {
        for (d, &b) in dst[..N].iter_mut().zip(&src[..N]) {
            *d = endian.u16_from_native(b as u16);
        }
    }

    #[inline(always)]
    fn widen_u32(src: &[u8], dst: &mut [u32]) {
        for (d, &b) in dst[..N].iter_mut().zip(&src[..N]) {
            *d = b as u32;
        }
    }

    #[inline(always)]
    fn narrow_u16(src: &[u16], endian: Endianness, dst: &mut [u8]) {
        for (d, &unit) in dst[..N].iter_mut().zip(&src[..N]) {
            *d = endian.u16_to_native(unit) as u8;
        }
    }

    #[inline(always)]
    fn narrow_u32(src: &[u32], dst: &mut [u8]) {
        for (d, &v) in dst[..N].iter_mut().zip(&src[..N]) {
            *d = v as u8;
        }
    }
}
