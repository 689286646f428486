use crate::core::encoding::Endianness;
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};

pub(crate) fn utf8_length(input: &[u8]) -> usize {
    input.len() + input.iter().filter(|&&b| b >= 0x80).count()
}

pub(crate) fn convert_to_utf8(input: &[u8], output: &mut [u8]) -> ConversionResult {
    let mut written = 0;
    for (pos, &b) in input.iter().enumerate() {
        if b < 0x80 {
            if written >= output.len() {
                return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
            }
            output[written] = b;
            written += 1;
        } else {
            if written + 2 > output.len() {
                return Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, pos));
            }
            output[written] = 0xC0 | (b >> 6);
            output[written + 1] = 0x80 | (b & 0x3F);
            written += 2;
        }
    }
    Ok(written)
}

/// Ok when every byte was written; otherwise the prefix that fits is
/// written and the error points just past it.
fn fits(input: &[u8], written: usize) -> ConversionResult {
    if written < input.len() {
        Err(ConversionError::new(ErrorKind::OutputBufferTooSmall, written))
    } else {
        Ok(written)
    }
}

pub(crate) fn convert_to_utf16(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    let n = input.len().min(output.len());
    for (dst, &b) in output[..n].iter_mut().zip(input) {
        *dst = endian.u16_from_native(b as u16);
    }
    fits(input, n)
}

pub(crate) fn convert_to_utf32(input: &[u8], output: &mut [u32]) -> ConversionResult {
    let n = input.len().min(output.len());
    for (dst, &b) in output[..n].iter_mut().zip(input) {
        *dst = b as u32;
    }
    fits(input, n)
}
