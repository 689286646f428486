use crate::core::encoding::Endianness;
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};

#[inline(always)]
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xD800
}

#[inline(always)]
pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xDC00
}

/// Decodes the code point starting at `input[pos]`; a lone surrogate of
/// either kind is `Surrogate` at `pos`.
#[inline(always)]
pub(crate) fn decode_at(input: &[u16], pos: usize, endian: Endianness) -> Result<(u32, usize), ErrorKind> {
    let unit = endian.u16_to_native(input[pos]);
    if unit & 0xF800 != 0xD800 {
        return Ok((unit as u32, 1));
    }
    if !is_high_surrogate(unit) || pos + 1 >= input.len() {
        return Err(ErrorKind::Surrogate);
    }
    let next = endian.u16_to_native(input[pos + 1]);
    if !is_low_surrogate(next) {
        return Err(ErrorKind::Surrogate);
    }
    let cp = (((unit as u32) - 0xD800) << 10) + ((next as u32) - 0xDC00) + 0x10000;
    Ok((cp, 2))
}

#[inline(always)]
fn decode_valid_at(input: &[u16], pos: usize, endian: Endianness) -> (u32, usize) {
    let unit = endian.u16_to_native(input[pos]);
    if unit & 0xF800 != 0xD800 {
        return (unit as u32, 1);
    }
    let next = input.get(pos + 1).map_or(0xDC00, |&u| endian.u16_to_native(u));
    let high = (unit as u32).wrapping_sub(0xD800) & 0x3FF;
    let low = (next as u32).wrapping_sub(0xDC00) & 0x3FF;
    ((high << 10) + low + 0x10000, 2)
}

/// Units consumed by one replacement character.
pub(crate) fn replacement_span(input: &[u16], endian: Endianness) -> usize {
    match decode_at(input, 0, endian) {
        Ok((_, width)) => width,
        Err(_) => 1,
    }
}

pub(crate) fn validate(input: &[u16], endian: Endianness) -> bool {
    validate_with_errors(input, endian).is_ok()
}

pub(crate) fn validate_with_errors(input: &[u16], endian: Endianness) -> ConversionResult {
    let mut pos = 0;
    while pos < input.len() {
        match decode_at(input, pos, endian) {
            Ok((_, width)) => pos += width,
            Err(kind) => return Err(ConversionError::new(kind, pos)),
        }
    }
    Ok(input.len())
}

/// Code points: units that are not low surrogates.
pub(crate) fn count(input: &[u16], endian: Endianness) -> usize {
    input
        .iter()
        .filter(|&&u| !is_low_surrogate(endian.u16_to_native(u)))
        .count()
}

/// Each half of a surrogate pair counts 2, so a pair yields 4.
pub(crate) fn utf8_length(input: &[u16], endian: Endianness) -> usize {
    input
        .iter()
        .map(|&u| {
            let u = endian.u16_to_native(u);
            let surrogate = u & 0xF800 == 0xD800;
            1 + (u > 0x7F) as usize + (u > 0x7FF && !surrogate) as usize
        })
        .sum()
}

pub(crate) fn utf32_length(input: &[u16], endian: Endianness) -> usize {
    count(input, endian)
}

/// Writes `cp` as UTF-8 at `output[at..]`, returning the byte count.
#[inline(always)]
pub(crate) fn write_utf8(cp: u32, output: &mut [u8], at: usize) -> usize {
    if cp < 0x80 {
        output[at] = cp as u8;
        1
    } else if cp < 0x800 {
        output[at] = 0xC0 | (cp >> 6) as u8;
        output[at + 1] = 0x80 | (cp & 0x3F) as u8;
        2
    } else if cp < 0x10000 {
        output[at] = 0xE0 | (cp >> 12) as u8;
        output[at + 1] = 0x80 | ((cp >> 6) & 0x3F) as u8;
        output[at + 2] = 0x80 | (cp & 0x3F) as u8;
        3
    } else {
        output[at] = 0xF0 | ((cp >> 18) & 0x07) as u8;
        output[at + 1] = 0x80 | ((cp >> 12) & 0x3F) as u8;
        output[at + 2] = 0x80 | ((cp >> 6) & 0x3F) as u8;
        output[at + 3] = 0x80 | (cp & 0x3F) as u8;
        4
    }
}

#[inline(always)]
pub(crate) fn utf8_width(cp: u32) -> usize {
    1 + (cp > 0x7F) as usize + (cp > 0x7FF) as usize + (cp > 0xFFFF) as usize
}

pub(crate) fn convert_to_utf8(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_at(input, pos, endian).map_err(|kind| ConversionError::new(kind, pos))?;
        if written + utf8_width(cp) > output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        written += write_utf8(cp, output, written);
        pos += width;
    }
    Ok(written)
}

/// # Panics
/// If `output` is shorter than `utf8_length(input)`.
pub(crate) fn convert_valid_to_utf8(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_valid_at(input, pos, endian);
        written += write_utf8(cp, output, written);
        pos += width;
    }
    written
}

pub(crate) fn convert_to_utf32(input: &[u16], output: &mut [u32], endian: Endianness) -> ConversionResult {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_at(input, pos, endian).map_err(|kind| ConversionError::new(kind, pos))?;
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
pub(crate) fn convert_valid_to_utf32(input: &[u16], output: &mut [u32], endian: Endianness) -> usize {
    let mut pos = 0;
    let mut written = 0;
    while pos < input.len() {
        let (cp, width) = decode_valid_at(input, pos, endian);
        output[written] = cp;
        written += 1;
        pos += width;
    }
    written
}

/// Any unit above 0xFF, surrogates included, is `TooLarge`.
pub(crate) fn convert_to_latin1(input: &[u16], output: &mut [u8], endian: Endianness) -> ConversionResult {
    for (pos, &unit) in input.iter().enumerate() {
        let unit = endian.u16_to_native(unit);
        if unit > 0xFF {
            return Err(ConversionError::new(ErrorKind::TooLarge, pos));
        }
        if pos >= output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        output[pos] = unit as u8;
    }
    Ok(input.len())
}

/// # Panics
/// If `output` is shorter than `input`.
pub(crate) fn convert_valid_to_latin1(input: &[u16], output: &mut [u8], endian: Endianness) -> usize {
    for (dst, &unit) in output[..input.len()].iter_mut().zip(input) {
        *dst = endian.u16_to_native(unit) as u8;
    }
    input.len()
}

/// Byte-swaps every unit.
///
/// # Panics
/// If `output` is shorter than `input`.
pub(crate) fn change_endianness(input: &[u16], output: &mut [u16]) {
    for (dst, &unit) in output[..input.len()].iter_mut().zip(input) {
        *dst = unit.swap_bytes();
    }
}

/// Copies `input`, replacing every unpaired surrogate with U+FFFD.
///
/// # Panics
/// If `output` is shorter than `input`.
pub(crate) fn to_well_formed(input: &[u16], output: &mut [u16], endian: Endianness) {
    let replacement = endian.u16_from_native(0xFFFD);
    let mut pos = 0;
    while pos < input.len() {
        match decode_at(input, pos, endian) {
            Ok((_, width)) => {
                output[pos..pos + width].copy_from_slice(&input[pos..pos + width]);
                pos += width;
            }
            Err(_) => {
                output[pos] = replacement;
                pos += 1;
            }
        }
    }
}

/// Length of `input` without a trailing high surrogate.
pub(crate) fn trim_partial(input: &[u16], endian: Endianness) -> usize {
    match input.last() {
        Some(&unit) if is_high_surrogate(endian.u16_to_native(unit)) => input.len() - 1,
        _ => input.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LE: Endianness = Endianness::Little;
    const BE: Endianness = Endianness::Big;

    fn le(units: &[u16]) -> Vec<u16> {
        units.iter().map(|&u| LE.u16_from_native(u)).collect()
    }

    fn be(units: &[u16]) -> Vec<u16> {
        units.iter().map(|&u| BE.u16_from_native(u)).collect()
    }

    fn err(kind: ErrorKind, position: usize) -> ConversionResult {
        Err(ConversionError::new(kind, position))
    }

    #[test]
    fn test_lone_high_surrogate_at_end() {
        assert_eq!(validate_with_errors(&le(&[0xD800]), LE), err(ErrorKind::Surrogate, 0));
        assert_eq!(validate_with_errors(&le(&[0x41, 0xD800]), LE), err(ErrorKind::Surrogate, 1));
    }

    #[test]
    fn test_surrogate_errors() {
        assert_eq!(validate_with_errors(&le(&[0xDC00, 0xD800]), LE), err(ErrorKind::Surrogate, 0));
        assert_eq!(validate_with_errors(&le(&[0xD800, 0xD800, 0xDC00]), LE), err(ErrorKind::Surrogate, 0));
        assert_eq!(validate_with_errors(&le(&[0xD83D, 0xDE00, 0x41]), LE), Ok(3));
        assert_eq!(validate_with_errors(&le(&[0x41, 0xD800, 0x41]), LE), err(ErrorKind::Surrogate, 1));
    }

    #[test]
    fn test_endianness_is_a_parameter() {
        let units = [0xD83D, 0xDE00];
        assert!(validate(&be(&units), BE));
        assert!(validate(&le(&units), LE));
        // The same memory read the other way is 0x3DD8 0x00DE
        assert!(validate(&le(&units), BE));
        assert!(!validate(&le(&[0x00D8]), BE));
    }

    #[test]
    fn test_convert_to_utf8() {
        let input = le(&[0x48, 0xE9, 0x20AC, 0xD83D, 0xDE00]);
        let mut out = vec![0u8; utf8_length(&input, LE)];
        assert_eq!(out.len(), 1 + 2 + 3 + 4);
        assert_eq!(convert_to_utf8(&input, &mut out, LE), Ok(10));
        assert_eq!(out, "Hé€😀".as_bytes());

        let mut small = [0u8; 5];
        assert_eq!(
            convert_to_utf8(&input, &mut small, LE),
            err(ErrorKind::OutputBufferTooSmall, 2)
        );
        assert_eq!(&small[..3], "Hé".as_bytes());
    }

    #[test]
    fn test_convert_valid_to_utf8() {
        let input = be(&[0x48, 0xD83E, 0xDD80]);
        let mut out = [0u8; 5];
        assert_eq!(convert_valid_to_utf8(&input, &mut out, BE), 5);
        assert_eq!(&out, "H🦀".as_bytes());
    }

    #[test]
    fn test_convert_to_utf32() {
        let input = le(&[0x41, 0xD83D, 0xDE00]);
        let mut out = [0u32; 2];
        assert_eq!(convert_to_utf32(&input, &mut out, LE), Ok(2));
        assert_eq!(out, [0x41, 0x1F600]);
        assert_eq!(utf32_length(&input, LE), 2);
    }

    #[test]
    fn test_convert_to_latin1() {
        let mut out = [0u8; 4];
        assert_eq!(convert_to_latin1(&le(&[0x63, 0xE9]), &mut out, LE), Ok(2));
        assert_eq!(&out[..2], b"c\xE9");
        assert_eq!(
            convert_to_latin1(&le(&[0x63, 0x100]), &mut out, LE),
            err(ErrorKind::TooLarge, 1)
        );
        assert_eq!(
            convert_to_latin1(&le(&[0xD83D, 0xDE00]), &mut out, LE),
            err(ErrorKind::TooLarge, 0)
        );
    }

    #[test]
    fn test_well_formed_and_trim() {
        let input = le(&[0x41, 0xDC00, 0xD83D, 0xDE00, 0xD800]);
        let mut out = vec![0u16; input.len()];
        to_well_formed(&input, &mut out, LE);
        assert_eq!(out, le(&[0x41, 0xFFFD, 0xD83D, 0xDE00, 0xFFFD]));
        assert_eq!(trim_partial(&input, LE), 4);
        assert_eq!(trim_partial(&le(&[0x41]), LE), 1);
    }

    #[test]
    fn test_change_endianness() {
        let input = le(&[0x1234, 0xD83D]);
        let mut out = [0u16; 2];
        change_endianness(&input, &mut out);
        assert_eq!(out.to_vec(), be(&[0x1234, 0xD83D]));
    }

    #[test]
    fn test_count() {
        assert_eq!(count(&le(&[0x41, 0xD83D, 0xDE00, 0xDC00]), LE), 2);
    }
}
