use super::{ASCII_STRIDE, is_ascii_stride};
use crate::core::encoding::Endianness;
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};

#[inline(always)]
pub(crate) fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Decodes the sequence starting at `input[pos]`.
///
/// Returns the code point and the sequence width, or the error kind. All
/// errors belong to the lead byte at `pos`.
#[inline(always)]
pub(crate) fn decode_at(input: &[u8], pos: usize) -> Result<(u32, usize), ErrorKind> {
    let lead = input[pos];
    if lead < 0x80 {
        return Ok((lead as u32, 1));
    }
    let remaining = input.len() - pos;
    if lead & 0xE0 == 0xC0 {
        if remaining < 2 || !is_continuation(input[pos + 1]) {
            return Err(ErrorKind::TooShort);
        }
        let cp = (lead as u32 & 0x1F) << 6 | (input[pos + 1] as u32 & 0x3F);
        if cp < 0x80 {
            return Err(ErrorKind::Overlong);
        }
        Ok((cp, 2))
    } else if lead & 0xF0 == 0xE0 {
        if remaining < 3 || !is_continuation(input[pos + 1]) || !is_continuation(input[pos + 2]) {
            return Err(ErrorKind::TooShort);
        }
        let cp = (lead as u32 & 0x0F) << 12
            | (input[pos + 1] as u32 & 0x3F) << 6
            | (input[pos + 2] as u32 & 0x3F);
        if cp < 0x800 {
            return Err(ErrorKind::Overlong);
        }
        if (0xD800..=0xDFFF).contains(&cp) {
            return Err(ErrorKind::Surrogate);
        }
        Ok((cp, 3))
    } else if lead & 0xF8 == 0xF0 {
        if remaining < 4
            || !is_continuation(input[pos + 1])
            || !is_continuation(input[pos + 2])
            || !is_continuation(input[pos + 3])
        {
            return Err(ErrorKind::TooShort);
        }
        let cp = (lead as u32 & 0x07) << 18
            | (input[pos + 1] as u32 & 0x3F) << 12
            | (input[pos + 2] as u32 & 0x3F) << 6
            | (input[pos + 3] as u32 & 0x3F);
        if cp <= 0xFFFF {
            return Err(ErrorKind::Overlong);
        }
        if cp > 0x10FFFF {
            return Err(ErrorKind::TooLarge);
        }
        Ok((cp, 4))
    } else if is_continuation(lead) {
        Err(ErrorKind::TooLong)
    } else {
        Err(ErrorKind::HeaderBits)
    }
}

/// Decodes without validation. Missing bytes read as zero, so malformed
/// input never reads past the slice.
#[inline(always)]
fn decode_valid_at(input: &[u8], pos: usize) -> (u32, usize) {
    let lead = input[pos];
    let byte = |i: usize| input.get(pos + i).map_or(0, |&b| b as u32 & 0x3F);
    if lead < 0x80 {
        (lead as u32, 1)
    } else if lead < 0xE0 {
        ((lead as u32 & 0x1F) << 6 | byte(1), 2)
    } else if lead < 0xF0 {
        ((lead as u32 & 0x0F) << 12 | byte(1) << 6 | byte(2), 3)
    } else {
        ((lead as u32 & 0x07) << 18 | byte(1) << 12 | byte(2) << 6 | byte(3), 4)
    }
}

/// Length of the invalid subsequence at the start of `input` that a single
/// replacement character stands for (maximal subpart of a valid sequence).
pub(crate) fn invalid_sequence_length(input: &[u8]) -> usize {
    let (needed, lower, upper) = match input[0] {
        0xC2..=0xDF => (1, 0x80, 0xBF),
        0xE0 => (2, 0xA0, 0xBF),
        0xE1..=0xEC | 0xEE..=0xEF => (2, 0x80, 0xBF),
        0xED => (2, 0x80, 0x9F),
        0xF0 => (3, 0x90, 0xBF),
        0xF1..=0xF3 => (3, 0x80, 0xBF),
        0xF4 => (3, 0x80, 0x8F),
        _ => return 1,
    };
    match input.get(1) {
        Some(&b) if (lower..=upper).contains(&b) => {}
        _ => return 1,
    }
    let mut len = 2;
    while len <= needed && input.get(len).is_some_and(|&b| is_continuation(b)) {
        len += 1;
    }
    len
}

/// Input consumed by one replacement: a whole sequence when it decodes
/// (the code point was merely unrepresentable), the maximal subpart otherwise.
pub(crate) fn replacement_span(input: &[u8]) -> usize {
    match decode_at(input, 0) {
        Ok((_, width)) => width,
        Err(_) => invalid_sequence_length(input),
    }
}

pub(crate) fn validate(input: &[u8]) -> bool {
    validate_with_errors(input).is_ok()
}

pub(crate) fn validate_with_errors(input: &[u8]) -> ConversionResult {
    let mut pos = 0;
    while pos < input.len() {
        if pos + ASCII_STRIDE <= input.len() && is_ascii_stride(&input[pos..]) {
            pos += ASCII_STRIDE;
            continue;
        }
        match decode_at(input, pos) {
            Ok((_, width)) => pos += width,
            Err(kind) => return Err(ConversionError::new(kind, pos)),
        }
    }
    Ok(input.len())
}

/// Start of the sequence that may straddle `pos`: the nearest byte in the
/// three before it that is not a continuation byte, or `pos` itself.
#[inline]
pub(crate) fn sequence_start(input: &[u8], pos: usize) -> usize {
    let floor = pos.saturating_sub(3);
    let mut i = pos;
    while i > floor {
        i -= 1;
        if !is_continuation(input[i]) {
            return i;
        }
    }
    pos
}

/// Re-validates from the sequence containing `pos` to the end. Everything
/// before that sequence must already be known valid.
pub(crate) fn rewind_and_validate_with_errors(input: &[u8], pos: usize) -> ConversionResult {
    let start = sequence_start(input, pos);
    validate_with_errors(&input[start..])
        .map(|_| input.len())
        .map_err(|e| e.offset(start))
}

/// Length of `input` without a trailing sequence whose lead declares more
/// bytes than remain (drops 0 to 3 bytes).
pub(crate) fn trim_partial(input: &[u8]) -> usize {
    let len = input.len();
    if len >= 1 && input[len - 1] >= 0xC0 {
        return len - 1;
    }
    if len >= 2 && input[len - 2] >= 0xE0 {
        return len - 2;
    }
    if len >= 3 && input[len - 3] >= 0xF0 {
        return len - 3;
    }
    len
}

/// Number of code points: bytes that are not continuation bytes.
pub(crate) fn count(input: &[u8]) -> usize {
    input.iter().filter(|&&b| (b as i8) > -65).count()
}

pub(crate) fn utf16_length(input: &[u8]) -> usize {
    input
        .iter()
        .map(|&b| ((b as i8) > -65) as usize + (b >= 0xF0) as usize)
        .sum()
}

pub(crate) fn utf32_length(input: &[u8]) -> usize {
    count(input)
}

#[inline(always)]
fn write_utf16(cp: u32, output: &mut [u16], at: usize, endian: Endianness) -> usize {
    if cp < 0x10000 {
        output[at] = endian.u16_from_native(cp as u16);
        1
    } else {
        let v = cp - 0x10000;
        output[at] = endian.u16_from_native(0xD800 + (v >> 10) as u16);
        output[at + 1] = endian.u16_from_native(0xDC00 + (v & 0x3FF) as u16);
        2
    }
}

pub(crate) fn convert_to_utf16(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        if pos + ASCII_STRIDE <= input.len()
            && written + ASCII_STRIDE <= output.len()
            && is_ascii_stride(&input[pos..])
        {
            for (dst, &b) in output[written..written + ASCII_STRIDE]
                .iter_mut()
                .zip(&input[pos..pos + ASCII_STRIDE])
            {
                *dst = endian.u16_from_native(b as u16);
            }
            pos += ASCII_STRIDE;
            written += ASCII_STRIDE;
            continue;
        }
        let (cp, width) = decode_at(input, pos).map_err(|kind| ConversionError::new(kind, pos))?;
        let units = if cp < 0x10000 { 1 } else { 2 };
        if written + units > output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        written += write_utf16(cp, output, written, endian);
        pos += width;
    }
    Ok(written)
}

/// # Panics
/// If `output` is shorter than `utf16_length(input)`.
pub(crate) fn convert_valid_to_utf16(input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_valid_at(input, pos);
        written += write_utf16(cp, output, written, endian);
        pos += width;
    }
    written
}

pub(crate) fn convert_to_utf32(input: &[u8], output: &mut [u32]) -> ConversionResult {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        if pos + ASCII_STRIDE <= input.len()
            && written + ASCII_STRIDE <= output.len()
            && is_ascii_stride(&input[pos..])
        {
            for (dst, &b) in output[written..written + ASCII_STRIDE]
                .iter_mut()
                .zip(&input[pos..pos + ASCII_STRIDE])
            {
                *dst = b as u32;
            }
            pos += ASCII_STRIDE;
            written += ASCII_STRIDE;
            continue;
        }
        let (cp, width) = decode_at(input, pos).map_err(|kind| ConversionError::new(kind, pos))?;
        if written >= output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        output[written] = cp;
        written += 1;
        pos += width;
    }
    Ok(written)
}

/// # Panics
/// If `output` is shorter than `utf32_length(input)`.
pub(crate) fn convert_valid_to_utf32(input: &[u8], output: &mut [u32]) -> usize {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_valid_at(input, pos);
        output[written] = cp;
        written += 1;
        pos += width;
    }
    written
}

/// Structural UTF-8 errors take precedence; a well-formed code point above
/// 0xFF is `TooLarge` at its lead byte.
pub(crate) fn convert_to_latin1(input: &[u8], output: &mut [u8]) -> ConversionResult {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_at(input, pos).map_err(|kind| ConversionError::new(kind, pos))?;
        if cp > 0xFF {
            return Err(ConversionError::new(ErrorKind::TooLarge, pos));
        }
        if written >= output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        output[written] = cp as u8;
        written += 1;
        pos += width;
    }
    Ok(written)
}

/// # Panics
/// If `output` is shorter than `count(input)`.
pub(crate) fn convert_valid_to_latin1(input: &[u8], output: &mut [u8]) -> usize {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_valid_at(input, pos);
        output[written] = cp as u8;
        written += 1;
        pos += width;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(kind: ErrorKind, position: usize) -> ConversionResult {
        Err(ConversionError::new(kind, position))
    }

    #[test]
    fn test_valid_sequences() {
        assert_eq!(validate_with_errors(b"\xE2\x82\xAC"), Ok(3));
        assert_eq!(validate_with_errors(b"\xF0\x9F\x98\x80"), Ok(4));
        assert!(validate("Grüße, 世界! 🦀".as_bytes()));
        assert!(validate(b""));
        assert!(validate(b"\xF4\x8F\xBF\xBF"));
        assert!(validate(b"\xED\x9F\xBF"));
    }

    #[test]
    fn test_error_kinds_and_positions() {
        assert_eq!(validate_with_errors(b"\xC0\x80"), err(ErrorKind::Overlong, 0));
        assert_eq!(validate_with_errors(b"ab\xE0\x80\x80"), err(ErrorKind::Overlong, 2));
        assert_eq!(validate_with_errors(b"\xF0\x8F\xBF\xBF"), err(ErrorKind::Overlong, 0));
        assert_eq!(validate_with_errors(b"x\xED\xA0\x80"), err(ErrorKind::Surrogate, 1));
        assert_eq!(validate_with_errors(b"\xF4\x90\x80\x80"), err(ErrorKind::TooLarge, 0));
        assert_eq!(validate_with_errors(b"a\x80"), err(ErrorKind::TooLong, 1));
        assert_eq!(validate_with_errors(b"\xC3\xA9\xA9"), err(ErrorKind::TooLong, 2));
        assert_eq!(validate_with_errors(b"\xF8\x88\x80\x80\x80"), err(ErrorKind::HeaderBits, 0));
        assert_eq!(validate_with_errors(b"\xFF"), err(ErrorKind::HeaderBits, 0));
        assert_eq!(validate_with_errors(b"\xC2\x41"), err(ErrorKind::TooShort, 0));
    }

    #[test]
    fn test_truncated_at_end() {
        assert_eq!(validate_with_errors(b"abc\xE2\x82"), err(ErrorKind::TooShort, 3));
        assert_eq!(validate_with_errors(b"\xF0\x9F\x98"), err(ErrorKind::TooShort, 0));
        assert_eq!(validate_with_errors(b"\xC2"), err(ErrorKind::TooShort, 0));
    }

    #[test]
    fn test_error_after_ascii_stride() {
        let mut input = vec![b'a'; 20];
        input.push(0xC0);
        input.push(0xAF);
        assert_eq!(validate_with_errors(&input), err(ErrorKind::Overlong, 20));
    }

    #[test]
    fn test_rewind() {
        let input = b"abcd\xF0\x9F\x98\x80\xF0\x9F\x98";
        assert_eq!(sequence_start(input, 6), 4);
        assert_eq!(sequence_start(input, 4), 3);
        assert_eq!(rewind_and_validate_with_errors(input, 6), err(ErrorKind::TooShort, 8));
        assert_eq!(rewind_and_validate_with_errors(&input[..8], 6), Ok(8));
    }

    #[test]
    fn test_trim_partial() {
        assert_eq!(trim_partial(b"ab\xE2\x82"), 2);
        assert_eq!(trim_partial(b"ab\xE2\x82\xAC"), 5);
        assert_eq!(trim_partial(b"\xF0\x9F\x98"), 0);
        assert_eq!(trim_partial(b"\xC3"), 0);
        assert_eq!(trim_partial(b"a"), 1);
        assert_eq!(trim_partial(b""), 0);
    }

    #[test]
    fn test_lengths() {
        let s = "a€😀é";
        assert_eq!(count(s.as_bytes()), 4);
        assert_eq!(utf16_length(s.as_bytes()), s.encode_utf16().count());
        assert_eq!(utf32_length(s.as_bytes()), 4);
    }

    #[test]
    fn test_convert_to_utf16() {
        let mut out = [0u16; 4];
        assert_eq!(convert_to_utf16(b"\xE2\x82\xAC", &mut out, Endianness::Little), Ok(1));
        assert_eq!(Endianness::Little.u16_to_native(out[0]), 0x20AC);

        assert_eq!(convert_to_utf16(b"\xF0\x9F\x98\x80", &mut out, Endianness::Little), Ok(2));
        assert_eq!(Endianness::Little.u16_to_native(out[0]), 0xD83D);
        assert_eq!(Endianness::Little.u16_to_native(out[1]), 0xDE00);

        assert_eq!(convert_to_utf16(b"\xF0\x9F\x98\x80", &mut out, Endianness::Big), Ok(2));
        assert_eq!(Endianness::Big.u16_to_native(out[0]), 0xD83D);
    }

    #[test]
    fn test_convert_output_too_small() {
        let mut out = [0u16; 2];
        assert_eq!(
            convert_to_utf16(b"ab\xF0\x9F\x98\x80", &mut out, Endianness::Little),
            err(ErrorKind::OutputBufferTooSmall, 2)
        );
        let mut out = [0u32; 1];
        assert_eq!(convert_to_utf32(b"ab", &mut out), err(ErrorKind::OutputBufferTooSmall, 1));
    }

    #[test]
    fn test_convert_stops_at_error_with_valid_prefix() {
        let mut out = [0u32; 8];
        assert_eq!(convert_to_utf32(b"a\xC3\xA9\xFFz", &mut out), err(ErrorKind::HeaderBits, 3));
        assert_eq!(&out[..2], &[0x61, 0xE9]);
    }

    #[test]
    fn test_convert_to_latin1() {
        let mut out = [0u8; 8];
        assert_eq!(convert_to_latin1("café".as_bytes(), &mut out), Ok(4));
        assert_eq!(&out[..4], b"caf\xE9");
        assert_eq!(convert_to_latin1("a€".as_bytes(), &mut out), err(ErrorKind::TooLarge, 1));
        assert_eq!(convert_to_latin1(b"\xC1\xBF", &mut out), err(ErrorKind::Overlong, 0));
        assert_eq!(convert_to_latin1(b"a\xC3", &mut out), err(ErrorKind::TooShort, 1));
    }

    #[test]
    fn test_convert_valid() {
        let s = "héllo 🦀";
        let mut out16 = vec![0u16; utf16_length(s.as_bytes())];
        let n = convert_valid_to_utf16(s.as_bytes(), &mut out16, Endianness::NATIVE);
        assert_eq!(&out16[..n], s.encode_utf16().collect::<Vec<_>>().as_slice());

        let mut out32 = vec![0u32; utf32_length(s.as_bytes())];
        convert_valid_to_utf32(s.as_bytes(), &mut out32);
        assert_eq!(out32, s.chars().map(|c| c as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_convert_valid_on_truncated_input_stays_in_bounds() {
        let mut out = [0u32; 4];
        assert_eq!(convert_valid_to_utf32(b"\xF0\x9F", &mut out), 1);
    }

    #[test]
    fn test_invalid_sequence_length() {
        assert_eq!(invalid_sequence_length(b"\xC0\x80"), 1);
        assert_eq!(invalid_sequence_length(b"\xE2\x82"), 2);
        assert_eq!(invalid_sequence_length(b"\xE2\x82A"), 2);
        assert_eq!(invalid_sequence_length(b"\xF0\x9F\x98"), 3);
        assert_eq!(invalid_sequence_length(b"\xED\xA0\x80"), 1);
        assert_eq!(invalid_sequence_length(b"\xF4\x90\x80\x80"), 1);
        assert_eq!(invalid_sequence_length(b"\x80"), 1);
        assert_eq!(replacement_span("€".as_bytes()), 3);
    }
}
