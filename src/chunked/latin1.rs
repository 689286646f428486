//! Latin1 widening

use crate::core::encoding::Endianness;
use crate::core::error::ConversionResult;
use crate::scalar;
use crate::simd::Vector;

/// Every byte is one code point; bytes from 0x80 take two UTF-8 bytes.
pub(crate) fn utf8_length<V: Vector>(input: &[u8]) -> usize {
    V::with_features(|| {
        let mut chunks = input.chunks_exact(V::LANES);
        let mut total = 0;
        for chunk in &mut chunks {
            total += V::LANES + V::load(chunk).high_bits().count_ones() as usize;
        }
        total + scalar::latin1::utf8_length(chunks.remainder())
    })
}

pub(crate) fn convert_to_utf8<V: Vector>(input: &[u8], output: &mut [u8]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + 2 * V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            if V::load(chunk).is_ascii() {
                output[written..written + V::LANES].copy_from_slice(chunk);
                written += V::LANES;
            } else {
                match scalar::latin1::convert_to_utf8(chunk, &mut output[written..]) {
                    Ok(n) => written += n,
                    Err(_) => break,
                }
            }
            pos += V::LANES;
        }
        scalar::latin1::convert_to_utf8(&input[pos..], &mut output[written..])
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

pub(crate) fn convert_to_utf16<V: Vector>(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let limit = input.len().min(output.len());
        let mut pos = 0;
        while pos + V::LANES <= limit {
            V::widen_u16(&input[pos..], &mut output[pos..], endian);
            pos += V::LANES;
        }
        scalar::latin1::convert_to_utf16(&input[pos..], &mut output[pos..], endian)
            .map(|n| pos + n)
            .map_err(|e| e.offset(pos))
    })
}

pub(crate) fn convert_to_utf32<V: Vector>(input: &[u8], output: &mut [u32]) -> ConversionResult {
    V::with_features(|| {
        let limit = input.len().min(output.len());
        let mut pos = 0;
        while pos + V::LANES <= limit {
            V::widen_u32(&input[pos..], &mut output[pos..]);
            pos += V::LANES;
        }
        scalar::latin1::convert_to_utf32(&input[pos..], &mut output[pos..])
            .map(|n| pos + n)
            .map_err(|e| e.offset(pos))
    })
}
