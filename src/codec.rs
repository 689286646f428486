//! Backends and runtime dispatch
//!
//! A [`Codec`] is one complete implementation of every validation,
//! transcoding, length and Base64 routine. Backends are listed from most to
//! least specialised; the first whose CPU features are all present becomes
//! the active one on first use and stays active for the life of the process.
//! Selection reads only immutable CPU flags and the environment, so the
//! outcome is the same whichever thread gets there first.

use crate::base64::{self, Base64Blocks, Base64Options, LastChunkHandling, NoBlocks, Unit};
use crate::chunked;
use crate::core::encoding::Endianness;
use crate::core::error::{ConversionResult, FullResult};
use crate::scalar;
use crate::simd::{self, Portable, Vector};
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;
use tracing::{debug, warn};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::simd::{Avx2, Ssse3};

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
use crate::simd::Neon;

/// Environment variable naming a backend to use instead of the detected one.
pub const FORCE_IMPLEMENTATION_ENV: &str = "UTF_D_FORCE_IMPLEMENTATION";

/// A CPU capability a backend may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuFeature {
    Ssse3,
    Avx2,
    Neon,
}

impl CpuFeature {
    pub fn name(self) -> &'static str {
        match self {
            CpuFeature::Ssse3 => "ssse3",
            CpuFeature::Avx2 => "avx2",
            CpuFeature::Neon => "neon",
        }
    }

    pub fn is_detected(self) -> bool {
        match self {
            CpuFeature::Ssse3 => simd::has_ssse3(),
            CpuFeature::Avx2 => simd::has_avx2(),
            CpuFeature::Neon => simd::has_neon(),
        }
    }
}

impl fmt::Display for CpuFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub required_features: &'static [CpuFeature],
}

impl Descriptor {
    /// True when every required feature is present on this CPU.
    pub fn is_supported(&self) -> bool {
        self.required_features.iter().all(|f| f.is_detected())
    }
}

/// One implementation of the full routine set.
///
/// UTF-16 slices hold code units in the given byte order; UTF-32 slices are
/// native-endian. Fallible routines return the output units written, or the
/// error with its input offset. The `convert_valid_*` routines assume valid
/// input and may panic, never misbehave otherwise, when it is not.
pub trait Codec: Send + Sync {
    fn descriptor(&self) -> &'static Descriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    fn validate_ascii(&self, input: &[u8]) -> bool;
    fn validate_ascii_with_errors(&self, input: &[u8]) -> ConversionResult;
    fn validate_utf8(&self, input: &[u8]) -> bool;
    fn validate_utf8_with_errors(&self, input: &[u8]) -> ConversionResult;
    fn validate_utf16(&self, input: &[u16], endian: Endianness) -> bool;
    fn validate_utf16_with_errors(&self, input: &[u16], endian: Endianness) -> ConversionResult;
    fn validate_utf32(&self, input: &[u32]) -> bool;
    fn validate_utf32_with_errors(&self, input: &[u32]) -> ConversionResult;

    fn convert_utf8_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult;
    fn convert_valid_utf8_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> usize;
    fn convert_utf8_to_utf32(&self, input: &[u8], output: &mut [u32]) -> ConversionResult;
    fn convert_valid_utf8_to_utf32(&self, input: &[u8], output: &mut [u32]) -> usize;
    fn convert_utf8_to_latin1(&self, input: &[u8], output: &mut [u8]) -> ConversionResult;
    fn convert_valid_utf8_to_latin1(&self, input: &[u8], output: &mut [u8]) -> usize;

    fn convert_utf16_to_utf8(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult;
    fn convert_valid_utf16_to_utf8(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> usize;
    fn convert_utf16_to_utf32(&self, input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult;
    fn convert_valid_utf16_to_utf32(&self, input: &[u16], output: &mut [u32], endian: Endianness) -> usize;
    fn convert_utf16_to_latin1(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult;
    fn convert_valid_utf16_to_latin1(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> usize;

    fn convert_utf32_to_utf8(&self, input: &[u32], output: &mut [u8]) -> ConversionResult;
    fn convert_valid_utf32_to_utf8(&self, input: &[u32], output: &mut [u8]) -> usize;
    fn convert_utf32_to_utf16(&self, input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult;
    fn convert_valid_utf32_to_utf16(&self, input: &[u32], output: &mut [u16], endian: Endianness) -> usize;
    fn convert_utf32_to_latin1(&self, input: &[u32], output: &mut [u8]) -> ConversionResult;
    fn convert_valid_utf32_to_latin1(&self, input: &[u32], output: &mut [u8]) -> usize;

    fn convert_latin1_to_utf8(&self, input: &[u8], output: &mut [u8]) -> ConversionResult;
    fn convert_latin1_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult;
    fn convert_latin1_to_utf32(&self, input: &[u8], output: &mut [u32]) -> ConversionResult;

    fn count_utf8(&self, input: &[u8]) -> usize;
    fn count_utf16(&self, input: &[u16], endian: Endianness) -> usize;
    fn utf16_length_from_utf8(&self, input: &[u8]) -> usize;
    fn utf8_length_from_utf16(&self, input: &[u16], endian: Endianness) -> usize;
    fn utf8_length_from_utf32(&self, input: &[u32]) -> usize;
    fn utf16_length_from_utf32(&self, input: &[u32]) -> usize;
    fn utf8_length_from_latin1(&self, input: &[u8]) -> usize;

    /// # Panics
    /// If `output` is shorter than the maximal decoded length of `input`.
    fn base64_to_binary(
        &self,
        input: &[u8],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult;

    fn base64_to_binary_safe(
        &self,
        input: &[u8],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult;

    /// Base64 decoding of native-endian UTF-16 text.
    ///
    /// # Panics
    /// If `output` is shorter than the maximal decoded length of `input`.
    fn base64_to_binary_utf16(
        &self,
        input: &[u16],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult;

    fn base64_to_binary_utf16_safe(
        &self,
        input: &[u16],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult;

    /// # Panics
    /// If `output` is shorter than the encoded length of `input`.
    fn binary_to_base64(&self, input: &[u8], output: &mut [u8], options: Base64Options) -> usize;

    /// Encodes with a `\n` after every full line of `line_length` (at least 4)
    /// characters.
    ///
    /// # Panics
    /// If `output` is shorter than the wrapped encoded length of `input`.
    fn binary_to_base64_with_lines(
        &self,
        input: &[u8],
        output: &mut [u8],
        line_length: usize,
        options: Base64Options,
    ) -> usize {
        let needed = base64::base64_length_from_binary_with_lines(input.len(), options, line_length);
        assert!(
            output.len() >= needed,
            "base64 output buffer too small: {} < {needed}",
            output.len()
        );
        let written = self.binary_to_base64(input, output, options);
        base64::encode::spread_lines(output, written, base64::effective_line_length(line_length))
    }
}

impl fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Codec").field(&self.name()).finish()
    }
}

fn decode_base64<B: Base64Blocks, T: Unit>(
    input: &[T],
    output: &mut [u8],
    options: Base64Options,
    last_chunk: LastChunkHandling,
) -> FullResult {
    let needed = base64::maximal_binary_length(input);
    assert!(
        output.len() >= needed,
        "base64 output buffer too small: {} < {needed}",
        output.len()
    );
    base64::decode::decode::<B, T>(input, output, options, last_chunk, false)
}

/// Unit-at-a-time reference backend. Always supported.
pub struct Fallback {
    descriptor: &'static Descriptor,
}

impl Codec for Fallback {
    fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    fn validate_ascii(&self, input: &[u8]) -> bool {
        scalar::ascii::validate(input)
    }

    fn validate_ascii_with_errors(&self, input: &[u8]) -> ConversionResult {
        scalar::ascii::validate_with_errors(input)
    }

    fn validate_utf8(&self, input: &[u8]) -> bool {
        scalar::utf8::validate(input)
    }

    fn validate_utf8_with_errors(&self, input: &[u8]) -> ConversionResult {
        scalar::utf8::validate_with_errors(input)
    }

    fn validate_utf16(&self, input: &[u16], endian: Endianness) -> bool {
        scalar::utf16::validate(input, endian)
    }

    fn validate_utf16_with_errors(&self, input: &[u16], endian: Endianness) -> ConversionResult {
        scalar::utf16::validate_with_errors(input, endian)
    }

    fn validate_utf32(&self, input: &[u32]) -> bool {
        scalar::utf32::validate(input)
    }

    fn validate_utf32_with_errors(&self, input: &[u32]) -> ConversionResult {
        scalar::utf32::validate_with_errors(input)
    }

    fn convert_utf8_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
        scalar::utf8::convert_to_utf16(input, output, endian)
    }

    fn convert_valid_utf8_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
        scalar::utf8::convert_valid_to_utf16(input, output, endian)
    }

    fn convert_utf8_to_utf32(&self, input: &[u8], output: &mut [u32]) -> ConversionResult {
        scalar::utf8::convert_to_utf32(input, output)
    }

    fn convert_valid_utf8_to_utf32(&self, input: &[u8], output: &mut [u32]) -> usize {
        scalar::utf8::convert_valid_to_utf32(input, output)
    }

    fn convert_utf8_to_latin1(&self, input: &[u8], output: &mut [u8]) -> ConversionResult {
        scalar::utf8::convert_to_latin1(input, output)
    }

    fn convert_valid_utf8_to_latin1(&self, input: &[u8], output: &mut [u8]) -> usize {
        scalar::utf8::convert_valid_to_latin1(input, output)
    }

    fn convert_utf16_to_utf8(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
        scalar::utf16::convert_to_utf8(input, output, endian)
    }

    fn convert_valid_utf16_to_utf8(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
        scalar::utf16::convert_valid_to_utf8(input, output, endian)
    }

    fn convert_utf16_to_utf32(&self, input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
        scalar::utf16::convert_to_utf32(input, output, endian)
    }

    fn convert_valid_utf16_to_utf32(&self, input: &[u16], output: &mut [u32], endian: Endianness) -> usize {
        scalar::utf16::convert_valid_to_utf32(input, output, endian)
    }

    fn convert_utf16_to_latin1(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
        scalar::utf16::convert_to_latin1(input, output, endian)
    }

    fn convert_valid_utf16_to_latin1(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
        scalar::utf16::convert_valid_to_latin1(input, output, endian)
    }

    fn convert_utf32_to_utf8(&self, input: &[u32], output: &mut [u8]) -> ConversionResult {
        scalar::utf32::convert_to_utf8(input, output)
    }

    fn convert_valid_utf32_to_utf8(&self, input: &[u32], output: &mut [u8]) -> usize {
        scalar::utf32::convert_valid_to_utf8(input, output)
    }

    fn convert_utf32_to_utf16(&self, input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
        scalar::utf32::convert_to_utf16(input, output, endian)
    }

    fn convert_valid_utf32_to_utf16(&self, input: &[u32], output: &mut [u16], endian: Endianness) -> usize {
        scalar::utf32::convert_valid_to_utf16(input, output, endian)
    }

    fn convert_utf32_to_latin1(&self, input: &[u32], output: &mut [u8]) -> ConversionResult {
        scalar::utf32::convert_to_latin1(input, output)
    }

    fn convert_valid_utf32_to_latin1(&self, input: &[u32], output: &mut [u8]) -> usize {
        scalar::utf32::convert_valid_to_latin1(input, output)
    }

    fn convert_latin1_to_utf8(&self, input: &[u8], output: &mut [u8]) -> ConversionResult {
        scalar::latin1::convert_to_utf8(input, output)
    }

    fn convert_latin1_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
        scalar::latin1::convert_to_utf16(input, output, endian)
    }

    fn convert_latin1_to_utf32(&self, input: &[u8], output: &mut [u32]) -> ConversionResult {
        scalar::latin1::convert_to_utf32(input, output)
    }

    fn count_utf8(&self, input: &[u8]) -> usize {
        scalar::utf8::count(input)
    }

    fn count_utf16(&self, input: &[u16], endian: Endianness) -> usize {
        scalar::utf16::count(input, endian)
    }

    fn utf16_length_from_utf8(&self, input: &[u8]) -> usize {
        scalar::utf8::utf16_length(input)
    }

    fn utf8_length_from_utf16(&self, input: &[u16], endian: Endianness) -> usize {
        scalar::utf16::utf8_length(input, endian)
    }

    fn utf8_length_from_utf32(&self, input: &[u32]) -> usize {
        scalar::utf32::utf8_length(input)
    }

    fn utf16_length_from_utf32(&self, input: &[u32]) -> usize {
        scalar::utf32::utf16_length(input)
    }

    fn utf8_length_from_latin1(&self, input: &[u8]) -> usize {
        scalar::latin1::utf8_length(input)
    }

    fn base64_to_binary(
        &self,
        input: &[u8],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        decode_base64::<NoBlocks, _>(input, output, options, last_chunk)
    }

    fn base64_to_binary_safe(
        &self,
        input: &[u8],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        base64::decode::decode::<NoBlocks, _>(input, output, options, last_chunk, true)
    }

    fn base64_to_binary_utf16(
        &self,
        input: &[u16],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        decode_base64::<NoBlocks, _>(input, output, options, last_chunk)
    }

    fn base64_to_binary_utf16_safe(
        &self,
        input: &[u16],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        base64::decode::decode::<NoBlocks, _>(input, output, options, last_chunk, true)
    }

    fn binary_to_base64(&self, input: &[u8], output: &mut [u8], options: Base64Options) -> usize {
        base64::encode::encode::<NoBlocks>(input, output, options)
    }
}

/// Chunked backend over the vector type `V`.
pub struct Chunked<V> {
    descriptor: &'static Descriptor,
    vector: PhantomData<fn() -> V>,
}

impl<V> Chunked<V> {
    const fn new(descriptor: &'static Descriptor) -> Self {
        Self {
            descriptor,
            vector: PhantomData,
        }
    }
}

impl<V: Vector> Codec for Chunked<V> {
    fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    fn validate_ascii(&self, input: &[u8]) -> bool {
        chunked::utf8::validate_ascii::<V>(input)
    }

    fn validate_ascii_with_errors(&self, input: &[u8]) -> ConversionResult {
        chunked::utf8::validate_ascii_with_errors::<V>(input)
    }

    fn validate_utf8(&self, input: &[u8]) -> bool {
        chunked::utf8::validate::<V>(input)
    }

    fn validate_utf8_with_errors(&self, input: &[u8]) -> ConversionResult {
        chunked::utf8::validate_with_errors::<V>(input)
    }

    fn validate_utf16(&self, input: &[u16], endian: Endianness) -> bool {
        chunked::utf16::validate::<V>(input, endian)
    }

    fn validate_utf16_with_errors(&self, input: &[u16], endian: Endianness) -> ConversionResult {
        chunked::utf16::validate_with_errors::<V>(input, endian)
    }

    fn validate_utf32(&self, input: &[u32]) -> bool {
        chunked::utf32::validate::<V>(input)
    }

    fn validate_utf32_with_errors(&self, input: &[u32]) -> ConversionResult {
        chunked::utf32::validate_with_errors::<V>(input)
    }

    fn convert_utf8_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
        chunked::utf8::convert_to_utf16::<V>(input, output, endian)
    }

    fn convert_valid_utf8_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
        chunked::utf8::convert_valid_to_utf16::<V>(input, output, endian)
    }

    fn convert_utf8_to_utf32(&self, input: &[u8], output: &mut [u32]) -> ConversionResult {
        chunked::utf8::convert_to_utf32::<V>(input, output)
    }

    fn convert_valid_utf8_to_utf32(&self, input: &[u8], output: &mut [u32]) -> usize {
        chunked::utf8::convert_valid_to_utf32::<V>(input, output)
    }

    fn convert_utf8_to_latin1(&self, input: &[u8], output: &mut [u8]) -> ConversionResult {
        chunked::utf8::convert_to_latin1::<V>(input, output)
    }

    fn convert_valid_utf8_to_latin1(&self, input: &[u8], output: &mut [u8]) -> usize {
        chunked::utf8::convert_valid_to_latin1::<V>(input, output)
    }

    fn convert_utf16_to_utf8(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
        chunked::utf16::convert_to_utf8::<V>(input, output, endian)
    }

    fn convert_valid_utf16_to_utf8(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
        chunked::utf16::convert_valid_to_utf8::<V>(input, output, endian)
    }

    fn convert_utf16_to_utf32(&self, input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
        chunked::utf16::convert_to_utf32::<V>(input, output, endian)
    }

    fn convert_valid_utf16_to_utf32(&self, input: &[u16], output: &mut [u32], endian: Endianness) -> usize {
        chunked::utf16::convert_valid_to_utf32::<V>(input, output, endian)
    }

    fn convert_utf16_to_latin1(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
        chunked::utf16::convert_to_latin1::<V>(input, output, endian)
    }

    fn convert_valid_utf16_to_latin1(&self, input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
        chunked::utf16::convert_valid_to_latin1::<V>(input, output, endian)
    }

    fn convert_utf32_to_utf8(&self, input: &[u32], output: &mut [u8]) -> ConversionResult {
        chunked::utf32::convert_to_utf8::<V>(input, output)
    }

    fn convert_valid_utf32_to_utf8(&self, input: &[u32], output: &mut [u8]) -> usize {
        chunked::utf32::convert_valid_to_utf8::<V>(input, output)
    }

    fn convert_utf32_to_utf16(&self, input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
        chunked::utf32::convert_to_utf16::<V>(input, output, endian)
    }

    fn convert_valid_utf32_to_utf16(&self, input: &[u32], output: &mut [u16], endian: Endianness) -> usize {
        chunked::utf32::convert_valid_to_utf16::<V>(input, output, endian)
    }

    fn convert_utf32_to_latin1(&self, input: &[u32], output: &mut [u8]) -> ConversionResult {
        chunked::utf32::convert_to_latin1::<V>(input, output)
    }

    fn convert_valid_utf32_to_latin1(&self, input: &[u32], output: &mut [u8]) -> usize {
        chunked::utf32::convert_valid_to_latin1::<V>(input, output)
    }

    fn convert_latin1_to_utf8(&self, input: &[u8], output: &mut [u8]) -> ConversionResult {
        chunked::latin1::convert_to_utf8::<V>(input, output)
    }

    fn convert_latin1_to_utf16(&self, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
        chunked::latin1::convert_to_utf16::<V>(input, output, endian)
    }

    fn convert_latin1_to_utf32(&self, input: &[u8], output: &mut [u32]) -> ConversionResult {
        chunked::latin1::convert_to_utf32::<V>(input, output)
    }

    fn count_utf8(&self, input: &[u8]) -> usize {
        chunked::utf8::count::<V>(input)
    }

    fn count_utf16(&self, input: &[u16], endian: Endianness) -> usize {
        chunked::utf16::count::<V>(input, endian)
    }

    fn utf16_length_from_utf8(&self, input: &[u8]) -> usize {
        chunked::utf8::utf16_length::<V>(input)
    }

    fn utf8_length_from_utf16(&self, input: &[u16], endian: Endianness) -> usize {
        chunked::utf16::utf8_length::<V>(input, endian)
    }

    fn utf8_length_from_utf32(&self, input: &[u32]) -> usize {
        chunked::utf32::utf8_length::<V>(input)
    }

    fn utf16_length_from_utf32(&self, input: &[u32]) -> usize {
        chunked::utf32::utf16_length::<V>(input)
    }

    fn utf8_length_from_latin1(&self, input: &[u8]) -> usize {
        chunked::latin1::utf8_length::<V>(input)
    }

    fn base64_to_binary(
        &self,
        input: &[u8],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        V::with_features(|| decode_base64::<V, _>(input, output, options, last_chunk))
    }

    fn base64_to_binary_safe(
        &self,
        input: &[u8],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        V::with_features(|| base64::decode::decode::<V, _>(input, output, options, last_chunk, true))
    }

    fn base64_to_binary_utf16(
        &self,
        input: &[u16],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        V::with_features(|| decode_base64::<V, _>(input, output, options, last_chunk))
    }

    fn base64_to_binary_utf16_safe(
        &self,
        input: &[u16],
        output: &mut [u8],
        options: Base64Options,
        last_chunk: LastChunkHandling,
    ) -> FullResult {
        V::with_features(|| base64::decode::decode::<V, _>(input, output, options, last_chunk, true))
    }

    fn binary_to_base64(&self, input: &[u8], output: &mut [u8], options: Base64Options) -> usize {
        V::with_features(|| base64::encode::encode::<V>(input, output, options))
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
static AVX2: Chunked<Avx2> = Chunked::new(&Descriptor {
    name: "avx2",
    description: "x86-64 AVX2, 32-byte chunks",
    required_features: &[CpuFeature::Avx2],
});

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
static SSSE3: Chunked<Ssse3> = Chunked::new(&Descriptor {
    name: "ssse3",
    description: "x86-64 SSSE3, 16-byte chunks",
    required_features: &[CpuFeature::Ssse3],
});

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
static NEON: Chunked<Neon> = Chunked::new(&Descriptor {
    name: "neon",
    description: "ARM64 NEON, 16-byte chunks",
    required_features: &[CpuFeature::Neon],
});

static PORTABLE: Chunked<Portable<32>> = Chunked::new(&Descriptor {
    name: "portable",
    description: "generic chunked algorithms on 32-byte arrays",
    required_features: &[],
});

static FALLBACK: Fallback = Fallback {
    descriptor: &Descriptor {
        name: "fallback",
        description: "scalar reference, one code unit at a time",
        required_features: &[],
    },
};

/// All compiled backends, most specialised first.
fn registry() -> &'static [&'static dyn Codec] {
    static REGISTRY: OnceLock<Vec<&'static dyn Codec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut backends: Vec<&'static dyn Codec> = Vec::new();
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            backends.push(&AVX2);
            backends.push(&SSSE3);
        }
        #[cfg(all(feature = "simd", target_arch = "aarch64"))]
        backends.push(&NEON);
        backends.push(&PORTABLE);
        backends.push(&FALLBACK);
        backends
    })
}

/// Descriptors of every compiled backend, in priority order, whether or not
/// this CPU supports it.
pub fn available_implementations() -> impl Iterator<Item = &'static Descriptor> {
    registry().iter().map(|codec| codec.descriptor())
}

/// The backend called `name`, if compiled in and supported on this CPU.
pub fn implementation_by_name(name: &str) -> Option<&'static dyn Codec> {
    registry()
        .iter()
        .copied()
        .find(|codec| codec.name().eq_ignore_ascii_case(name))
        .filter(|codec| codec.descriptor().is_supported())
}

fn detect() -> &'static dyn Codec {
    if let Ok(forced) = std::env::var(FORCE_IMPLEMENTATION_ENV) {
        match implementation_by_name(&forced) {
            Some(codec) => {
                debug!(implementation = codec.name(), reason = "forced", "selected implementation");
                return codec;
            }
            None => warn!(
                requested = %forced,
                "{FORCE_IMPLEMENTATION_ENV} names no supported implementation, detecting instead"
            ),
        }
    }
    let codec = registry()
        .iter()
        .copied()
        .find(|codec| codec.descriptor().is_supported())
        .unwrap_or(&FALLBACK);
    debug!(implementation = codec.name(), reason = "detected", "selected implementation");
    codec
}

/// The backend used by the free functions. Chosen on first call.
pub fn active_implementation() -> &'static dyn Codec {
    static ACTIVE: OnceLock<&'static dyn Codec> = OnceLock::new();
    *ACTIVE.get_or_init(detect)
}
