//! Validation, conversion and length functions on the active backend
//!
//! Each ordered pair of encodings has four converters:
//!
//! - `convert_a_to_b`: validating, returns output units or 0 on any error
//! - `convert_a_to_b_with_errors`: validating, returns the error and its position
//! - `convert_valid_a_to_b`: input must be well formed; panics rather than
//!   misbehaving when it is not
//! - `convert_a_to_b_with_replacement`: replaces malformed input, fails only
//!   when `output` is full
//!
//! UTF-16 slices hold code units in the byte order given by `endian`. UTF-32
//! slices hold native-endian code points.

use crate::codec::active_implementation;
use crate::core::encoding::Endianness;
use crate::core::error::ConversionResult;
use crate::replace;
use crate::scalar;

pub fn validate_ascii(input: &[u8]) -> bool {
    active_implementation().validate_ascii(input)
}

/// The first byte from 0x80 is `TooLarge` at its offset.
pub fn validate_ascii_with_errors(input: &[u8]) -> ConversionResult {
    active_implementation().validate_ascii_with_errors(input)
}

pub fn validate_utf8(input: &[u8]) -> bool {
    active_implementation().validate_utf8(input)
}

/// `Ok(input.len())`, or the first error. Structural errors are reported at
/// the lead byte of the sequence; a stray continuation byte at its own offset.
pub fn validate_utf8_with_errors(input: &[u8]) -> ConversionResult {
    active_implementation().validate_utf8_with_errors(input)
}

pub fn validate_utf16(input: &[u16], endian: Endianness) -> bool {
    active_implementation().validate_utf16(input, endian)
}

/// An unpaired surrogate of either kind is `Surrogate` at its own position.
pub fn validate_utf16_with_errors(input: &[u16], endian: Endianness) -> ConversionResult {
    active_implementation().validate_utf16_with_errors(input, endian)
}

pub fn validate_utf32(input: &[u32]) -> bool {
    active_implementation().validate_utf32(input)
}

pub fn validate_utf32_with_errors(input: &[u32]) -> ConversionResult {
    active_implementation().validate_utf32_with_errors(input)
}

// UTF-8 source

pub fn convert_utf8_to_utf16(input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
    convert_utf8_to_utf16_with_errors(input, output, endian).unwrap_or_default()
}

pub fn convert_utf8_to_utf16_with_errors(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    active_implementation().convert_utf8_to_utf16(input, output, endian)
}

/// # Panics
/// If `output` is shorter than [`utf16_length_from_utf8`], which may happen
/// when `input` is not valid UTF-8.
pub fn convert_valid_utf8_to_utf16(input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
    active_implementation().convert_valid_utf8_to_utf16(input, output, endian)
}

/// `output` needs at most `input.len()` units.
pub fn convert_utf8_to_utf16_with_replacement(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    replace::utf8_to_utf16(active_implementation(), input, output, endian)
}

pub fn convert_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    convert_utf8_to_utf32_with_errors(input, output).unwrap_or_default()
}

pub fn convert_utf8_to_utf32_with_errors(input: &[u8], output: &mut [u32]) -> ConversionResult {
    active_implementation().convert_utf8_to_utf32(input, output)
}

/// # Panics
/// If `output` is shorter than [`utf32_length_from_utf8`].
pub fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    active_implementation().convert_valid_utf8_to_utf32(input, output)
}

pub fn convert_utf8_to_utf32_with_replacement(input: &[u8], output: &mut [u32]) -> ConversionResult {
    replace::utf8_to_utf32(active_implementation(), input, output)
}

pub fn convert_utf8_to_latin1(input: &[u8], output: &mut [u8]) -> usize {
    convert_utf8_to_latin1_with_errors(input, output).unwrap_or_default()
}

/// Structural UTF-8 errors first; a well-formed code point above 0xFF is
/// `TooLarge` at its lead byte.
pub fn convert_utf8_to_latin1_with_errors(input: &[u8], output: &mut [u8]) -> ConversionResult {
    active_implementation().convert_utf8_to_latin1(input, output)
}

/// # Panics
/// If `output` is shorter than [`latin1_length_from_utf8`].
pub fn convert_valid_utf8_to_latin1(input: &[u8], output: &mut [u8]) -> usize {
    active_implementation().convert_valid_utf8_to_latin1(input, output)
}

/// Unrepresentable code points become `?`.
pub fn convert_utf8_to_latin1_with_replacement(input: &[u8], output: &mut [u8]) -> ConversionResult {
    replace::utf8_to_latin1(active_implementation(), input, output)
}

// UTF-16 source

pub fn convert_utf16_to_utf8(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    convert_utf16_to_utf8_with_errors(input, output, endian).unwrap_or_default()
}

pub fn convert_utf16_to_utf8_with_errors(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    active_implementation().convert_utf16_to_utf8(input, output, endian)
}

/// # Panics
/// If `output` is shorter than [`utf8_length_from_utf16`].
pub fn convert_valid_utf16_to_utf8(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    active_implementation().convert_valid_utf16_to_utf8(input, output, endian)
}

/// `output` needs at most `3 * input.len()` bytes.
pub fn convert_utf16_to_utf8_with_replacement(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    replace::utf16_to_utf8(active_implementation(), input, output, endian)
}

pub fn convert_utf16_to_utf32(input: &[u16], output: &mut [u32], endian: Endianness) -> usize {
    convert_utf16_to_utf32_with_errors(input, output, endian).unwrap_or_default()
}

pub fn convert_utf16_to_utf32_with_errors(input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
    active_implementation().convert_utf16_to_utf32(input, output, endian)
}

/// # Panics
/// If `output` is shorter than [`utf32_length_from_utf16`].
pub fn convert_valid_utf16_to_utf32(input: &[u16], output: &mut [u32], endian: Endianness) -> usize {
    active_implementation().convert_valid_utf16_to_utf32(input, output, endian)
}

pub fn convert_utf16_to_utf32_with_replacement(input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
    replace::utf16_to_utf32(active_implementation(), input, output, endian)
}

pub fn convert_utf16_to_latin1(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    convert_utf16_to_latin1_with_errors(input, output, endian).unwrap_or_default()
}

/// Any unit above 0xFF, surrogates included, is `TooLarge`.
pub fn convert_utf16_to_latin1_with_errors(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    active_implementation().convert_utf16_to_latin1(input, output, endian)
}

/// # Panics
/// If `output` is shorter than `input`.
pub fn convert_valid_utf16_to_latin1(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    active_implementation().convert_valid_utf16_to_latin1(input, output, endian)
}

/// A surrogate pair counts as one `?`.
pub fn convert_utf16_to_latin1_with_replacement(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    replace::utf16_to_latin1(active_implementation(), input, output, endian)
}

// UTF-32 source

pub fn convert_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    convert_utf32_to_utf8_with_errors(input, output).unwrap_or_default()
}

pub fn convert_utf32_to_utf8_with_errors(input: &[u32], output: &mut [u8]) -> ConversionResult {
    active_implementation().convert_utf32_to_utf8(input, output)
}

/// # Panics
/// If `output` is shorter than [`utf8_length_from_utf32`].
pub fn convert_valid_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    active_implementation().convert_valid_utf32_to_utf8(input, output)
}

/// `output` needs at most `4 * input.len()` bytes.
pub fn convert_utf32_to_utf8_with_replacement(input: &[u32], output: &mut [u8]) -> ConversionResult {
    replace::utf32_to_utf8(active_implementation(), input, output)
}

pub fn convert_utf32_to_utf16(input: &[u32], output: &mut [u16], endian: Endianness) -> usize {
    convert_utf32_to_utf16_with_errors(input, output, endian).unwrap_or_default()
}

pub fn convert_utf32_to_utf16_with_errors(input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
    active_implementation().convert_utf32_to_utf16(input, output, endian)
}

/// # Panics
/// If `output` is shorter than [`utf16_length_from_utf32`].
pub fn convert_valid_utf32_to_utf16(input: &[u32], output: &mut [u16], endian: Endianness) -> usize {
    active_implementation().convert_valid_utf32_to_utf16(input, output, endian)
}

pub fn convert_utf32_to_utf16_with_replacement(input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
    replace::utf32_to_utf16(active_implementation(), input, output, endian)
}

pub fn convert_utf32_to_latin1(input: &[u32], output: &mut [u8]) -> usize {
    convert_utf32_to_latin1_with_errors(input, output).unwrap_or_default()
}

pub fn convert_utf32_to_latin1_with_errors(input: &[u32], output: &mut [u8]) -> ConversionResult {
    active_implementation().convert_utf32_to_latin1(input, output)
}

/// # Panics
/// If `output` is shorter than `input`.
pub fn convert_valid_utf32_to_latin1(input: &[u32], output: &mut [u8]) -> usize {
    active_implementation().convert_valid_utf32_to_latin1(input, output)
}

pub fn convert_utf32_to_latin1_with_replacement(input: &[u32], output: &mut [u8]) -> ConversionResult {
    replace::utf32_to_latin1(active_implementation(), input, output)
}

// Latin1 source: every byte is valid, only capacity can fail.

pub fn convert_latin1_to_utf8(input: &[u8], output: &mut [u8]) -> usize {
    convert_latin1_to_utf8_with_errors(input, output).unwrap_or_default()
}

pub fn convert_latin1_to_utf8_with_errors(input: &[u8], output: &mut [u8]) -> ConversionResult {
    active_implementation().convert_latin1_to_utf8(input, output)
}

pub fn convert_latin1_to_utf16(input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
    convert_latin1_to_utf16_with_errors(input, output, endian).unwrap_or_default()
}

pub fn convert_latin1_to_utf16_with_errors(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    active_implementation().convert_latin1_to_utf16(input, output, endian)
}

pub fn convert_latin1_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    convert_latin1_to_utf32_with_errors(input, output).unwrap_or_default()
}

pub fn convert_latin1_to_utf32_with_errors(input: &[u8], output: &mut [u32]) -> ConversionResult {
    active_implementation().convert_latin1_to_utf32(input, output)
}

// Lengths and counts. All assume valid input.

/// Number of code points: bytes that are not continuation bytes.
pub fn count_utf8(input: &[u8]) -> usize {
    active_implementation().count_utf8(input)
}

/// Number of code points: units that are not low surrogates.
pub fn count_utf16(input: &[u16], endian: Endianness) -> usize {
    active_implementation().count_utf16(input, endian)
}

pub fn utf8_length_from_utf16(input: &[u16], endian: Endianness) -> usize {
    active_implementation().utf8_length_from_utf16(input, endian)
}

pub fn utf8_length_from_utf32(input: &[u32]) -> usize {
    active_implementation().utf8_length_from_utf32(input)
}

pub fn utf8_length_from_latin1(input: &[u8]) -> usize {
    active_implementation().utf8_length_from_latin1(input)
}

/// Non-continuation bytes, plus one more for each four-byte lead.
pub fn utf16_length_from_utf8(input: &[u8]) -> usize {
    active_implementation().utf16_length_from_utf8(input)
}

pub fn utf16_length_from_utf32(input: &[u32]) -> usize {
    active_implementation().utf16_length_from_utf32(input)
}

pub fn utf16_length_from_latin1(input: &[u8]) -> usize {
    input.len()
}

pub fn utf32_length_from_utf8(input: &[u8]) -> usize {
    count_utf8(input)
}

pub fn utf32_length_from_utf16(input: &[u16], endian: Endianness) -> usize {
    count_utf16(input, endian)
}

pub fn utf32_length_from_latin1(input: &[u8]) -> usize {
    input.len()
}

pub fn latin1_length_from_utf8(input: &[u8]) -> usize {
    count_utf8(input)
}

pub fn latin1_length_from_utf16(input: &[u16]) -> usize {
    input.len()
}

pub fn latin1_length_from_utf32(input: &[u32]) -> usize {
    input.len()
}

// UTF-16 utilities

/// Byte-swaps every unit, turning UTF-16LE into UTF-16BE and back.
///
/// # Panics
/// If `output` is shorter than `input`.
pub fn change_endianness_utf16(input: &[u16], output: &mut [u16]) {
    scalar::utf16::change_endianness(input, output);
}

/// Copies `input` with every unpaired surrogate replaced by U+FFFD.
///
/// # Panics
/// If `output` is shorter than `input`.
pub fn to_well_formed_utf16(input: &[u16], output: &mut [u16], endian: Endianness) {
    scalar::utf16::to_well_formed(input, output, endian);
}

/// Length of `input` without a trailing high surrogate, for splitting a
/// stream at a safe point.
pub fn trim_partial_utf16(input: &[u16], endian: Endianness) -> usize {
    scalar::utf16::trim_partial(input, endian)
}

/// Length of `input` without a trailing incomplete sequence (at most three
/// bytes dropped).
pub fn trim_partial_utf8(input: &[u8]) -> usize {
    scalar::utf8::trim_partial(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ConversionError, ErrorKind};

    const LE: Endianness = Endianness::Little;
    const BE: Endianness = Endianness::Big;

    fn native(units: &[u16], endian: Endianness) -> Vec<u16> {
        units.iter().map(|&u| endian.u16_to_native(u)).collect()
    }

    #[test]
    fn test_euro_sign() {
        let euro = b"\xE2\x82\xAC";
        assert!(validate_utf8(euro));
        let mut out = [0u16; 1];
        assert_eq!(convert_utf8_to_utf16(euro, &mut out, LE), 1);
        assert_eq!(native(&out, LE), [0x20AC]);
    }

    #[test]
    fn test_emoji_surrogate_pair() {
        let smile = b"\xF0\x9F\x98\x80";
        assert!(validate_utf8(smile));
        assert_eq!(utf16_length_from_utf8(smile), 2);
        let mut out = [0u16; 2];
        assert_eq!(convert_utf8_to_utf16(smile, &mut out, LE), 2);
        assert_eq!(native(&out, LE), [0xD83D, 0xDE00]);
    }

    #[test]
    fn test_lone_high_surrogate() {
        assert_eq!(
            validate_utf16_with_errors(&[LE.u16_from_native(0xD800)], LE),
            Err(ConversionError::new(ErrorKind::Surrogate, 0))
        );
    }

    #[test]
    fn test_overlong_nul() {
        assert_eq!(
            validate_utf8_with_errors(b"\xC0\x80"),
            Err(ConversionError::new(ErrorKind::Overlong, 0))
        );
    }

    #[test]
    fn test_convert_returns_zero_on_error() {
        let mut out = [0u16; 8];
        assert_eq!(convert_utf8_to_utf16(b"ab\xFF", &mut out, LE), 0);
        assert_eq!(
            convert_utf8_to_utf16_with_errors(b"ab\xFF", &mut out, LE),
            Err(ConversionError::new(ErrorKind::HeaderBits, 2))
        );
        let mut small = [0u8; 2];
        assert_eq!(convert_latin1_to_utf8(&[0xE9, 0xE9], &mut small), 0);
    }

    #[test]
    fn test_lengths_are_exact() {
        let text = "Grüße, 世界! 😀 ok";
        let utf16: Vec<u16> = text.encode_utf16().map(|u| BE.u16_from_native(u)).collect();
        let utf32: Vec<u32> = text.chars().map(|c| c as u32).collect();

        assert_eq!(utf16_length_from_utf8(text.as_bytes()), utf16.len());
        assert_eq!(utf32_length_from_utf8(text.as_bytes()), utf32.len());
        assert_eq!(utf8_length_from_utf16(&utf16, BE), text.len());
        assert_eq!(utf32_length_from_utf16(&utf16, BE), utf32.len());
        assert_eq!(utf8_length_from_utf32(&utf32), text.len());
        assert_eq!(utf16_length_from_utf32(&utf32), utf16.len());

        let mut out = vec![0u8; text.len()];
        assert_eq!(convert_valid_utf16_to_utf8(&utf16, &mut out, BE), text.len());
        assert_eq!(out, text.as_bytes());
    }

    #[test]
    fn test_latin1_paths() {
        let latin1: Vec<u8> = (0x20..=0xFFu8).collect();
        let expected: String = latin1.iter().map(|&b| b as char).collect();

        let mut utf8 = vec![0u8; utf8_length_from_latin1(&latin1)];
        assert_eq!(convert_latin1_to_utf8(&latin1, &mut utf8), expected.len());
        assert_eq!(utf8, expected.as_bytes());

        let mut back = vec![0u8; latin1_length_from_utf8(&utf8)];
        assert_eq!(convert_utf8_to_latin1(&utf8, &mut back), latin1.len());
        assert_eq!(back, latin1);

        let mut utf16 = vec![0u16; utf16_length_from_latin1(&latin1)];
        convert_latin1_to_utf16(&latin1, &mut utf16, LE);
        let mut back = vec![0u8; latin1_length_from_utf16(&utf16)];
        assert_eq!(convert_utf16_to_latin1(&utf16, &mut back, LE), latin1.len());
        assert_eq!(back, latin1);

        let mut utf32 = vec![0u32; utf32_length_from_latin1(&latin1)];
        convert_latin1_to_utf32(&latin1, &mut utf32);
        let mut back = vec![0u8; latin1_length_from_utf32(&utf32)];
        assert_eq!(convert_valid_utf32_to_latin1(&utf32, &mut back), latin1.len());
        assert_eq!(back, latin1);

        assert_eq!(
            convert_utf8_to_latin1_with_errors("aĀ".as_bytes(), &mut back),
            Err(ConversionError::new(ErrorKind::TooLarge, 1))
        );
    }

    #[test]
    fn test_ascii() {
        assert!(validate_ascii(b"hello world, plain ascii over sixteen bytes"));
        assert_eq!(
            validate_ascii_with_errors(b"0123456789abcdef0123\x80"),
            Err(ConversionError::new(ErrorKind::TooLarge, 20))
        );
    }

    #[test]
    fn test_counts() {
        assert_eq!(count_utf8("añ😀".as_bytes()), 3);
        let utf16: Vec<u16> = "añ😀".encode_utf16().collect();
        assert_eq!(count_utf16(&utf16, Endianness::NATIVE), 3);
    }

    #[test]
    fn test_utf16_utilities() {
        let le: Vec<u16> = [0x0041u16, 0xD83D, 0xDE00].iter().map(|&u| LE.u16_from_native(u)).collect();
        let mut be = vec![0u16; le.len()];
        change_endianness_utf16(&le, &mut be);
        assert_eq!(native(&be, BE), [0x0041, 0xD83D, 0xDE00]);

        let broken: Vec<u16> = [0xDC00u16, 0x41, 0xD800].iter().map(|&u| LE.u16_from_native(u)).collect();
        let mut fixed = vec![0u16; broken.len()];
        to_well_formed_utf16(&broken, &mut fixed, LE);
        assert_eq!(native(&fixed, LE), [0xFFFD, 0x41, 0xFFFD]);

        assert_eq!(trim_partial_utf16(&broken, LE), 2);
        assert_eq!(trim_partial_utf16(&le, LE), 3);
    }

    #[test]
    fn test_trim_partial_utf8() {
        assert_eq!(trim_partial_utf8(b"ab\xF0\x9F\x98"), 2);
        assert_eq!(trim_partial_utf8(b"ab\xE2\x82"), 2);
        assert_eq!(trim_partial_utf8(b"ab\xC3"), 2);
        assert_eq!(trim_partial_utf8("ab€".as_bytes()), 5);
    }

    #[test]
    fn test_with_replacement_through_active() {
        let mut out = [0u32; 4];
        assert_eq!(convert_utf8_to_utf32_with_replacement(b"a\x80b", &mut out), Ok(3));
        assert_eq!(out[..3], [0x61, 0xFFFD, 0x62]);
    }
}
