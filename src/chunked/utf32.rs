//! UTF-32 validation and transcoding
//!
//! Each chunk of `V::LANES` code points is checked without branches: the
//! OR of every value and of every surrogate test tells whether the chunk is
//! valid, ASCII or Latin1 in one pass.

use crate::core::encoding::Endianness;
use crate::core::error::ConversionResult;
use crate::scalar;
use crate::simd::Vector;

#[derive(Clone, Copy)]
struct Summary {
    /// OR of all values.
    max: u32,
    /// Some value is a surrogate or above 0x10FFFF.
    invalid: bool,
}

#[inline(always)]
fn summarize<V: Vector>(chunk: &[u32]) -> Summary {
    let max = V::u32_or(chunk);
    let surrogates = V::u32_in_range(chunk, 0xD800, 0xDFFF);
    // an OR above 0x10FFFF may hide values that are each in range
    let too_large = max > 0x10FFFF && V::u32_in_range(chunk, 0x110000, u32::MAX) != 0;
    Summary {
        max,
        invalid: surrogates != 0 || too_large,
    }
}

pub(crate) fn validate<V: Vector>(input: &[u32]) -> bool {
    validate_with_errors::<V>(input).is_ok()
}

pub(crate) fn validate_with_errors<V: Vector>(input: &[u32]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        while pos + V::LANES <= input.len() {
            if summarize::<V>(&input[pos..pos + V::LANES]).invalid {
                break;
            }
            pos += V::LANES;
        }
        scalar::utf32::validate_with_errors(&input[pos..])
            .map(|_| input.len())
            .map_err(|e| e.offset(pos))
    })
}

pub(crate) fn utf8_length<V: Vector>(input: &[u32]) -> usize {
    V::with_features(|| scalar::utf32::utf8_length(input))
}

pub(crate) fn utf16_length<V: Vector>(input: &[u32]) -> usize {
    V::with_features(|| scalar::utf32::utf16_length(input))
}

pub(crate) fn convert_to_utf8<V: Vector>(input: &[u32], output: &mut [u8]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + 4 * V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            let summary = summarize::<V>(chunk);
            if summary.max < 0x80 {
                V::narrow_u32(chunk, &mut output[written..]);
                written += V::LANES;
            } else if summary.invalid {
                break;
            } else {
                written += scalar::utf32::convert_valid_to_utf8(chunk, &mut output[written..]);
            }
            pos += V::LANES;
        }
        scalar::utf32::convert_to_utf8(&input[pos..], &mut output[written..])
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `utf8_length(input)`.
pub(crate) fn convert_valid_to_utf8<V: Vector>(input: &[u32], output: &mut [u8]) -> usize {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() {
            let chunk = &input[pos..pos + V::LANES];
            if summarize::<V>(chunk).max < 0x80 {
                V::narrow_u32(chunk, &mut output[written..]);
                written += V::LANES;
            } else {
                written += scalar::utf32::convert_valid_to_utf8(chunk, &mut output[written..]);
            }
            pos += V::LANES;
        }
        written + scalar::utf32::convert_valid_to_utf8(&input[pos..], &mut output[written..])
    })
}

pub(crate) fn convert_to_utf16<V: Vector>(input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + 2 * V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            let summary = summarize::<V>(chunk);
            if summary.invalid {
                break;
            }
            if summary.max <= 0xFFFF {
                for (dst, &cp) in output[written..written + V::LANES].iter_mut().zip(chunk) {
                    *dst = endian.u16_from_native(cp as u16);
                }
                written += V::LANES;
            } else {
                written += scalar::utf32::convert_valid_to_utf16(chunk, &mut output[written..], endian);
            }
            pos += V::LANES;
        }
        scalar::utf32::convert_to_utf16(&input[pos..], &mut output[written..], endian)
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `utf16_length(input)`.
pub(crate) fn convert_valid_to_utf16<V: Vector>(input: &[u32], output: &mut [u16], endian: Endianness) -> usize {
    V::with_features(|| scalar::utf32::convert_valid_to_utf16(input, output, endian))
}

pub(crate) fn convert_to_latin1<V: Vector>(input: &[u32], output: &mut [u8]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        while pos + V::LANES <= input.len() && pos + V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            if summarize::<V>(chunk).max > 0xFF {
                break;
            }
            V::narrow_u32(chunk, &mut output[pos..]);
            pos += V::LANES;
        }
        scalar::utf32::convert_to_latin1(&input[pos..], &mut output[pos..])
            .map(|n| pos + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `input`.
pub(crate) fn convert_valid_to_latin1<V: Vector>(input: &[u32], output: &mut [u8]) -> usize {
    V::with_features(|| scalar::utf32::convert_valid_to_latin1(input, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ConversionError, ErrorKind};
    use crate::simd::Portable;

    macro_rules! for_widths {
        ($f:ident) => {
            $f::<Portable<16>>();
            $f::<Portable<32>>();
            $f::<Portable<64>>();
        };
    }

    fn samples() -> Vec<Vec<u32>> {
        let text: Vec<u32> = "grüße 😀 from a chunk-sized piece of text, 日本語, and more ascii to pad"
            .chars()
            .map(|c| c as u32)
            .collect();
        let mut out = vec![Vec::new(), text, vec![0x110000], vec![0xD800], vec![0xDFFF]];
        for offset in [0usize, 15, 16, 17, 31, 32, 63, 64, 65] {
            for bad in [0xD800u32, 0x110000, 0xFFFF_FFFF, 0x1F600, 0xFF, 0x100] {
                let mut v = vec![0x41u32; offset];
                v.push(bad);
                v.extend(std::iter::repeat_n(0xE9, 70));
                out.push(v);
            }
        }
        // each value in range, OR above 0x10FFFF
        out.push([0x10_0000u32, 0x0F_FFFF].repeat(40));
        out
    }

    fn agrees_with_scalar<V: Vector>() {
        for input in samples() {
            assert_eq!(validate_with_errors::<V>(&input), scalar::utf32::validate_with_errors(&input));

            let mut a = vec![0u8; input.len() * 4];
            let mut b = vec![0u8; input.len() * 4];
            let ra = convert_to_utf8::<V>(&input, &mut a);
            assert_eq!(ra, scalar::utf32::convert_to_utf8(&input, &mut b));
            if let Ok(n) = ra {
                assert_eq!(a[..n], b[..n]);
                assert_eq!(utf8_length::<V>(&input), n);
                let mut valid = vec![0u8; n];
                assert_eq!(convert_valid_to_utf8::<V>(&input, &mut valid), n);
                assert_eq!(valid, a[..n]);
            }

            for endian in [Endianness::Little, Endianness::Big] {
                let mut a = vec![0u16; input.len() * 2];
                let mut b = vec![0u16; input.len() * 2];
                let ra = convert_to_utf16::<V>(&input, &mut a, endian);
                assert_eq!(ra, scalar::utf32::convert_to_utf16(&input, &mut b, endian));
                if let Ok(n) = ra {
                    assert_eq!(a[..n], b[..n]);
                }
            }

            let mut a = vec![0u8; input.len()];
            let mut b = vec![0u8; input.len()];
            assert_eq!(
                convert_to_latin1::<V>(&input, &mut a),
                scalar::utf32::convert_to_latin1(&input, &mut b)
            );
        }
    }

    #[test]
    fn test_agrees_with_scalar() {
        for_widths!(agrees_with_scalar);
    }

    #[test]
    fn test_summary() {
        let mut chunk = vec![0x41u32; 16];
        let clean = summarize::<Portable<16>>(&chunk);
        assert_eq!(clean.max, 0x41);
        assert!(!clean.invalid);

        chunk[9] = 0xDFFF;
        assert!(summarize::<Portable<16>>(&chunk).invalid);
        chunk[9] = 0x10_0000;
        chunk[10] = 0x0F_FFFF;
        let hidden = summarize::<Portable<16>>(&chunk);
        assert!(hidden.max > 0x10FFFF);
        assert!(!hidden.invalid);
        chunk[15] = 0x11_0000;
        assert!(summarize::<Portable<16>>(&chunk).invalid);

        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            if crate::simd::has_ssse3() {
                assert!(summarize::<crate::simd::Ssse3>(&chunk).invalid);
                chunk[15] = 0xE9;
                assert!(!summarize::<crate::simd::Ssse3>(&chunk).invalid);
            }
        }
    }

    #[test]
    fn test_error_positions() {
        let mut input = vec![0x41u32; 40];
        input[33] = 0xDABC;
        assert_eq!(
            validate_with_errors::<Portable<16>>(&input),
            Err(ConversionError::new(ErrorKind::Surrogate, 33))
        );
        input[33] = 0x20_0000;
        assert_eq!(
            validate_with_errors::<Portable<32>>(&input),
            Err(ConversionError::new(ErrorKind::TooLarge, 33))
        );
    }
}
