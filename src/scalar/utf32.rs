use super::utf16::{utf8_width, write_utf8};
use crate::core::encoding::Endianness;
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};

#[inline(always)]
pub(crate) fn check(cp: u32) -> Result<u32, ErrorKind> {
    if cp > 0x10FFFF {
        Err(ErrorKind::TooLarge)
    } else if cp & 0xFFFF_F800 == 0xD800 {
        Err(ErrorKind::Surrogate)
    } else {
        Ok(cp)
    }
}

pub(crate) fn validate(input: &[u32]) -> bool {
    validate_with_errors(input).is_ok()
}

pub(crate) fn validate_with_errors(input: &[u32]) -> ConversionResult {
    for (pos, &cp) in input.iter().enumerate() {
        check(cp).map_err(|kind| ConversionError::new(kind, pos))?;
    }
    Ok(input.len())
}

pub(crate) fn utf8_length(input: &[u32]) -> usize {
    input.iter().map(|&cp| utf8_width(cp)).sum()
}

pub(crate) fn utf16_length(input: &[u32]) -> usize {
    input.iter().map(|&cp| 1 + (cp > 0xFFFF) as usize).sum()
}

pub(crate) fn convert_to_utf8(input: &[u32], output: &mut [u8]) -> ConversionResult {
    let mut written = 0;
    for (pos, &cp) in input.iter().enumerate() {
        let cp = check(cp).map_err(|kind| ConversionError::new(kind, pos))?;
        if written + utf8_width(cp) > output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        written += write_utf8(cp, output, written);
    }
    Ok(written)
}

/// # Panics
/// If `output` is shorter than `utf8_length(input)`.
pub(crate) fn convert_valid_to_utf8(input: &[u32], output: &mut [u8]) -> usize {
    let mut written = 0;
    for &cp in input {
        written += write_utf8(cp, output, written);
    }
    written
}

#[inline(always)]
fn write_utf16(cp: u32, output: &mut [u16], at: usize, endian: Endianness) -> usize {
    if cp < 0x10000 {
        output[at] = endian.u16_from_native(cp as u16);
        1
    } else {
        let v = cp.wrapping_sub(0x10000);
        output[at] = endian.u16_from_native(0xD800 | ((v >> 10) & 0x3FF) as u16);
        output[at + 1] = endian.u16_from_native(0xDC00 | (v & 0x3FF) as u16);
        2
    }
}

pub(crate) fn convert_to_utf16(input: &[u32], output: &mut [u16], endian: Endianness) -> ConversionResult {
    let mut written = 0;
    for (pos, &cp) in input.iter().enumerate() {
        let cp = check(cp).map_err(|kind| ConversionError::new(kind, pos))?;
        let units = 1 + (cp > 0xFFFF) as usize;
        if written + units > output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        written += write_utf16(cp, output, written, endian);
    }
    Ok(written)
}

/// # Panics
/// If `output` is shorter than `utf16_length(input)`.
pub(crate) fn convert_valid_to_utf16(input: &[u32], output: &mut [u16], endian: Endianness) -> usize {
    let mut written = 0;
    for &cp in input {
        written += write_utf16(cp, output, written, endian);
    }
    written
}

pub(crate) fn convert_to_latin1(input: &[u32], output: &mut [u8]) -> ConversionResult {
    for (pos, &cp) in input.iter().enumerate() {
        if cp > 0xFF {
            return Err(ConversionError::new(ErrorKind::TooLarge, pos));
        }
        if pos >= output.len() {
            return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
        }
        output[pos] = cp as u8;
    }
    Ok(input.len())
}

/// # Panics
/// If `output` is shorter than `input`.
pub(crate) fn convert_valid_to_latin1(input: &[u32], output: &mut [u8]) -> usize {
    for (dst, &cp) in output[..input.len()].iter_mut().zip(input) {
        *dst = cp as u8;
    }
    input.len()
}
