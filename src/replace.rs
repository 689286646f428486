//! Transcoding with replacement
//!
//! Built on the validating converters of a [`Codec`]: convert until the
//! first error, account for the valid prefix already written, emit one
//! replacement, skip the offending input and resume. Only a full output
//! buffer ends the loop early.

use crate::codec::Codec;
use crate::core::encoding::Endianness;
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};
use crate::scalar;

/// U+FFFD in UTF-8.
pub const REPLACEMENT_UTF8: [u8; 3] = [0xEF, 0xBF, 0xBD];
/// U+FFFD as a native code unit or code point.
pub const REPLACEMENT_CHARACTER: u32 = 0xFFFD;
/// Stand-in for anything Latin1 cannot represent.
pub const REPLACEMENT_LATIN1: u8 = b'?';

fn replacing<I, O: Copy>(
    input: &[I],
    output: &mut [O],
    replacement: &[O],
    mut convert: impl FnMut(&[I], &mut [O]) -> ConversionResult,
    written_for: impl Fn(&[I]) -> usize,
    span: impl Fn(&[I]) -> usize,
) -> ConversionResult {
    let mut pos = 0;
    let mut written = 0;
    loop {
        let error = match convert(&input[pos..], &mut output[written..]) {
            Ok(n) => return Ok(written + n),
            Err(e) if e.kind == ErrorKind::OutputBufferTooSmall => return Err(e.offset(pos)),
            Err(e) => e,
        };
        let bad = pos + error.position;
        written += written_for(&input[pos..bad]);
        if written + replacement.len() > output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, bad));
        }
        output[written..written + replacement.len()].copy_from_slice(replacement);
        written += replacement.len();
        pos = bad + span(&input[bad..]);
    }
}

pub(crate) fn utf8_to_utf16(codec: &dyn Codec, input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    replacing(
        input,
        output,
        &[endian.u16_from_native(REPLACEMENT_CHARACTER as u16)],
        |i, o| codec.convert_utf8_to_utf16(i, o, endian),
        |valid| codec.utf16_length_from_utf8(valid),
        scalar::utf8::replacement_span,
    )
}

pub(crate) fn utf8_to_utf32(codec: &dyn Codec, input: &[u8], output: &mut [u32]) -> ConversionResult {
    replacing(
        input,
        output,
        &[REPLACEMENT_CHARACTER],
        |i, o| codec.convert_utf8_to_utf32(i, o),
        |valid| codec.count_utf8(valid),
        scalar::utf8::replacement_span,
    )
}

pub(crate) fn utf8_to_latin1(codec: &dyn Codec, input: &[u8], output: &mut [u8]) -> ConversionResult {
    replacing(
        input,
        output,
        &[REPLACEMENT_LATIN1],
        |i, o| codec.convert_utf8_to_latin1(i, o),
        |valid| codec.count_utf8(valid),
        scalar::utf8::replacement_span,
    )
}

pub(crate) fn utf16_to_utf8(codec: &dyn Codec, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    replacing(
        input,
        output,
        &REPLACEMENT_UTF8,
        |i, o| codec.convert_utf16_to_utf8(i, o, endian),
        |valid| codec.utf8_length_from_utf16(valid, endian),
        |rest| scalar::utf16::replacement_span(rest, endian),
    )
}

pub(crate) fn utf16_to_utf32(codec: &dyn Codec, input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
    replacing(
        input,
        output,
        &[REPLACEMENT_CHARACTER],
        |i, o| codec.convert_utf16_to_utf32(i, o, endian),
        |valid| codec.count_utf16(valid, endian),
        |rest| scalar::utf16::replacement_span(rest, endian),
    )
}

pub(crate) fn utf16_to_latin1(codec: &dyn Codec, input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    replacing(
        input,
        output,
        &[REPLACEMENT_LATIN1],
        |i, o| codec.convert_utf16_to_latin1(i, o, endian),
        <[u16]>::len,
        |rest| scalar::utf16::replacement_span(rest, endian),
    )
}

pub(crate) fn utf32_to_utf8(codec: &dyn Codec, input: &[u32], output: &mut [u8]) -> ConversionResult {
    replacing(
        input,
        output,
        &REPLACEMENT_UTF8,
        |i, o| codec.convert_utf32_to_utf8(i, o),
        |valid| codec.utf8_length_from_utf32(valid),
        |_| 1,
    )
}

pub(crate) fn utf32_to_utf16(codec: &dyn Codec, input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
    replacing(
        input,
        output,
        &[endian.u16_from_native(REPLACEMENT_CHARACTER as u16)],
        |i, o| codec.convert_utf32_to_utf16(i, o, endian),
        |valid| codec.utf16_length_from_utf32(valid),
        |_| 1,
    )
}

pub(crate) fn utf32_to_latin1(codec: &dyn Codec, input: &[u32], output: &mut [u8]) -> ConversionResult {
    replacing(
        input,
        output,
        &[REPLACEMENT_LATIN1],
        |i, o| codec.convert_utf32_to_latin1(i, o),
        <[u32]>::len,
        |_| 1,
    )
}
