//! UTF-16 validation and transcoding
//!
//! A chunk is `V::LANES` code units. Surrogates are summarised as two bit
//! masks: the chunk is well formed iff every high surrogate is immediately
//! followed by a low one and every low one is preceded by a high one, that
//! is `high << 1 == low` once a trailing high surrogate is set aside.

use super::low_mask;
use crate::core::encoding::Endianness;
use crate::core::error::ConversionResult;
use crate::scalar;
use crate::simd::Vector;

/// High and low surrogate masks of `chunk`, bit `i` for unit `i`.
#[inline(always)]
fn surrogate_masks<V: Vector>(chunk: &[u16], endian: Endianness) -> (u64, u64) {
    (
        V::u16_in_range(chunk, endian, 0xD800, 0xDBFF),
        V::u16_in_range(chunk, endian, 0xDC00, 0xDFFF),
    )
}

/// Units of `chunk` that can be consumed, or `None` if the chunk holds a
/// lone surrogate. A high surrogate in the last unit is left for the next
/// chunk.
#[inline(always)]
fn valid_prefix<V: Vector>(chunk: &[u16], endian: Endianness) -> Option<usize> {
    let width = V::LANES;
    let (high, low) = surrogate_masks::<V>(chunk, endian);
    if high | low == 0 {
        return Some(width);
    }
    let advance = if high >> (width - 1) & 1 == 1 { width - 1 } else { width };
    let paired = ((high & low_mask(advance)) << 1) & low_mask(width);
    (paired == low).then_some(advance)
}

/// Bitwise OR of the native values in `chunk`; below 0x80 means all ASCII.
#[inline(always)]
fn max_unit<V: Vector>(chunk: &[u16], endian: Endianness) -> u16 {
    endian.u16_to_native(V::u16_or(chunk))
}

pub(crate) fn validate<V: Vector>(input: &[u16], endian: Endianness) -> bool {
    validate_with_errors::<V>(input, endian).is_ok()
}

pub(crate) fn validate_with_errors<V: Vector>(input: &[u16], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        while pos + V::LANES <= input.len() {
            match valid_prefix::<V>(&input[pos..pos + V::LANES], endian) {
                Some(advance) => pos += advance,
                None => break,
            }
        }
        scalar::utf16::validate_with_errors(&input[pos..], endian)
            .map(|_| input.len())
            .map_err(|e| e.offset(pos))
    })
}

pub(crate) fn utf8_length<V: Vector>(input: &[u16], endian: Endianness) -> usize {
    V::with_features(|| {
        let mut chunks = input.chunks_exact(V::LANES);
        let mut total = 0;
        for chunk in &mut chunks {
            total += if max_unit::<V>(chunk, endian) < 0x80 {
                V::LANES
            } else {
                scalar::utf16::utf8_length(chunk, endian)
            };
        }
        total + scalar::utf16::utf8_length(chunks.remainder(), endian)
    })
}

pub(crate) fn count<V: Vector>(input: &[u16], endian: Endianness) -> usize {
    V::with_features(|| {
        let mut chunks = input.chunks_exact(V::LANES);
        let mut total = 0;
        for chunk in &mut chunks {
            let (_, low) = surrogate_masks::<V>(chunk, endian);
            total += V::LANES - low.count_ones() as usize;
        }
        total + scalar::utf16::count(chunks.remainder(), endian)
    })
}

pub(crate) fn convert_to_utf8<V: Vector>(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + 3 * V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            if max_unit::<V>(chunk, endian) < 0x80 {
                V::narrow_u16(chunk, endian, &mut output[written..]);
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            let Some(advance) = valid_prefix::<V>(chunk, endian) else {
                break;
            };
            written += scalar::utf16::convert_valid_to_utf8(&chunk[..advance], &mut output[written..], endian);
            pos += advance;
        }
        scalar::utf16::convert_to_utf8(&input[pos..], &mut output[written..], endian)
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `utf8_length(input)`.
pub(crate) fn convert_valid_to_utf8<V: Vector>(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() {
            let chunk = &input[pos..pos + V::LANES];
            if max_unit::<V>(chunk, endian) < 0x80 {
                V::narrow_u16(chunk, endian, &mut output[written..]);
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            let advance = scalar::utf16::trim_partial(chunk, endian);
            written += scalar::utf16::convert_valid_to_utf8(&chunk[..advance], &mut output[written..], endian);
            pos += advance;
        }
        written + scalar::utf16::convert_valid_to_utf8(&input[pos..], &mut output[written..], endian)
    })
}

pub(crate) fn convert_to_utf32<V: Vector>(input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            let Some(advance) = valid_prefix::<V>(chunk, endian) else {
                break;
            };
            written += scalar::utf16::convert_valid_to_utf32(&chunk[..advance], &mut output[written..], endian);
            pos += advance;
        }
        scalar::utf16::convert_to_utf32(&input[pos..], &mut output[written..], endian)
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `count(input)`.
pub(crate) fn convert_valid_to_utf32<V: Vector>(input: &[u16], output: &mut [u32], endian: Endianness) -> usize {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() {
            let chunk = &input[pos..pos + V::LANES];
            let advance = scalar::utf16::trim_partial(chunk, endian);
            written += scalar::utf16::convert_valid_to_utf32(&chunk[..advance], &mut output[written..], endian);
            pos += advance;
        }
        written + scalar::utf16::convert_valid_to_utf32(&input[pos..], &mut output[written..], endian)
    })
}

pub(crate) fn convert_to_latin1<V: Vector>(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        while pos + V::LANES <= input.len() && pos + V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            if max_unit::<V>(chunk, endian) > 0xFF {
                break;
            }
            V::narrow_u16(chunk, endian, &mut output[pos..]);
            pos += V::LANES;
        }
        scalar::utf16::convert_to_latin1(&input[pos..], &mut output[pos..], endian)
            .map(|n| pos + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `input`.
pub(crate) fn convert_valid_to_latin1<V: Vector>(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    V::with_features(|| scalar::utf16::convert_valid_to_latin1(input, output, endian))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ConversionError, ErrorKind};
    use crate::simd::Portable;

    const LE: Endianness = Endianness::Little;
    const BE: Endianness = Endianness::Big;

    macro_rules! for_widths {
        ($f:ident) => {
            $f::<Portable<16>>();
            $f::<Portable<32>>();
            $f::<Portable<64>>();
        };
    }

    fn encode(units: &[u16], endian: Endianness) -> Vec<u16> {
        units.iter().map(|&u| endian.u16_from_native(u)).collect()
    }

    fn samples() -> Vec<Vec<u16>> {
        let text: Vec<u16> = "naïve café 😀 日本語 and some ascii padding to fill chunks 🎉🎉🎉 end"
            .encode_utf16()
            .collect();
        let mut out = vec![Vec::new(), text.clone(), vec![0xD800], vec![0xDC00], vec![0xD800, 0xD800, 0xDC00]];
        for width in [16usize, 32, 64] {
            for offset in width - 3..width + 2 {
                for bad in [&[0xD800u16][..], &[0xDC00], &[0xD83D, 0xDE00], &[0xDBFF, 0x0041]] {
                    let mut v = vec![0x0041u16; offset];
                    v.extend_from_slice(bad);
                    v.extend(std::iter::repeat_n(0x00E9, 70));
                    out.push(v);
                }
            }
            let mut tail = vec![0x0041u16; width - 1];
            tail.push(0xD800);
            out.push(tail);
        }
        out
    }

    fn agrees_with_scalar<V: Vector>() {
        for native in samples() {
            for endian in [LE, BE] {
                let input = encode(&native, endian);
                assert_eq!(
                    validate_with_errors::<V>(&input, endian),
                    scalar::utf16::validate_with_errors(&input, endian),
                    "{native:x?}"
                );

                let mut a = vec![0u8; input.len() * 3];
                let mut b = vec![0u8; input.len() * 3];
                let ra = convert_to_utf8::<V>(&input, &mut a, endian);
                assert_eq!(ra, scalar::utf16::convert_to_utf8(&input, &mut b, endian));
                if let Ok(n) = ra {
                    assert_eq!(a[..n], b[..n]);
                    assert_eq!(utf8_length::<V>(&input, endian), n);
                    let mut valid = vec![0u8; n];
                    assert_eq!(convert_valid_to_utf8::<V>(&input, &mut valid, endian), n);
                    assert_eq!(valid, a[..n]);
                }

                let mut a = vec![0u32; input.len()];
                let mut b = vec![0u32; input.len()];
                let ra = convert_to_utf32::<V>(&input, &mut a, endian);
                assert_eq!(ra, scalar::utf16::convert_to_utf32(&input, &mut b, endian));
                if let Ok(n) = ra {
                    assert_eq!(a[..n], b[..n]);
                    assert_eq!(count::<V>(&input, endian), n);
                    let mut valid = vec![0u32; n];
                    assert_eq!(convert_valid_to_utf32::<V>(&input, &mut valid, endian), n);
                    assert_eq!(valid, a[..n]);
                }

                let mut a = vec![0u8; input.len()];
                let mut b = vec![0u8; input.len()];
                assert_eq!(
                    convert_to_latin1::<V>(&input, &mut a, endian),
                    scalar::utf16::convert_to_latin1(&input, &mut b, endian)
                );
            }
        }
    }

    fn pair_across_edge<V: Vector>() {
        let mut native = vec![0x0041u16; V::LANES - 1];
        native.extend_from_slice(&[0xD83D, 0xDE00]);
        native.extend_from_slice(&[0x0042; 20]);
        let input = encode(&native, LE);
        assert!(validate::<V>(&input, LE));
        let mut out = vec![0u32; input.len()];
        let n = convert_to_utf32::<V>(&input, &mut out, LE).unwrap();
        assert_eq!(n, input.len() - 1);
        assert_eq!(out[V::LANES - 1], 0x1F600);

        // lone high surrogate at the true end
        let mut cut = input[..V::LANES].to_vec();
        assert_eq!(
            validate_with_errors::<V>(&cut, LE),
            Err(ConversionError::new(ErrorKind::Surrogate, V::LANES - 1))
        );
        cut.push(LE.u16_from_native(0xD800));
        assert_eq!(
            validate_with_errors::<V>(&cut, LE),
            Err(ConversionError::new(ErrorKind::Surrogate, V::LANES - 1))
        );
    }

    #[test]
    fn test_agrees_with_scalar() {
        for_widths!(agrees_with_scalar);
    }

    #[test]
    fn test_pair_across_edge() {
        for_widths!(pair_across_edge);
    }

    #[test]
    fn test_valid_prefix() {
        type V = Portable<4>;
        for endian in [LE, BE] {
            let chunk = encode(&[0x41, 0xD800, 0xDC00, 0x42], endian);
            assert_eq!(valid_prefix::<V>(&chunk, endian), Some(4));
            let chunk = encode(&[0x41, 0x42, 0x43, 0xD800], endian);
            assert_eq!(valid_prefix::<V>(&chunk, endian), Some(3));
            let chunk = encode(&[0xDC00, 0x42, 0x43, 0x44], endian);
            assert_eq!(valid_prefix::<V>(&chunk, endian), None);
            let chunk = encode(&[0x41, 0xD800, 0x43, 0x44], endian);
            assert_eq!(valid_prefix::<V>(&chunk, endian), None);
        }
    }

    #[test]
    fn test_surrogate_masks_on_detected_isa() {
        let mut native = vec![0x0041u16; 64];
        native[0] = 0xD800;
        native[1] = 0xDC00;
        native[17] = 0xDBFF;
        native[31] = 0xDFFF;
        native[40] = 0xE000;
        for endian in [LE, BE] {
            let input = encode(&native, endian);
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            {
                use crate::simd::{Avx2, Ssse3};
                if crate::simd::has_ssse3() {
                    assert_eq!(surrogate_masks::<Ssse3>(&input, endian), (0b1, 0b10));
                    assert_eq!(max_unit::<Ssse3>(&input[8..], endian), 0xDBFF);
                }
                if crate::simd::has_avx2() {
                    assert_eq!(surrogate_masks::<Avx2>(&input, endian), (1 | 1 << 17, 0b10 | 1 << 31));
                }
            }
            #[cfg(all(feature = "simd", target_arch = "aarch64"))]
            {
                use crate::simd::Neon;
                assert_eq!(surrogate_masks::<Neon>(&input, endian), (0b1, 0b10));
            }
            assert_eq!(
                surrogate_masks::<Portable<64>>(&input, endian),
                (1 | 1 << 17, 0b10 | 1 << 31)
            );
            assert_eq!(max_unit::<Portable<16>>(&input[32..], endian), 0xE000 | 0x41);
        }
    }
}
