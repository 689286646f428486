use super::{ASCII_STRIDE, is_ascii_stride};
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};

pub(crate) fn validate(input: &[u8]) -> bool {
    validate_with_errors(input).is_ok()
}

/// The first byte above 0x7F is `TooLarge`.
pub(crate) fn validate_with_errors(input: &[u8]) -> ConversionResult {
    let mut pos = 0;
    while pos + ASCII_STRIDE <= input.len() {
        if !is_ascii_stride(&input[pos..]) {
            break;
        }
        pos += ASCII_STRIDE;
    }
    match input[pos..].iter().position(|&b| b >= 0x80) {
        Some(offset) => Err(ConversionError::new(ErrorKind::TooLarge, pos + offset)),
        None => Ok(input.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        assert!(validate(b""));
        assert!(validate(b"plain old ascii, long enough to take the stride path"));
        assert_eq!(validate_with_errors(b"abc"), Ok(3));
    }

    #[test]
    fn test_first_high_byte() {
        let mut input = vec![b'a'; 40];
        input[33] = 0x80;
        input[35] = 0xFF;
        assert_eq!(
            validate_with_errors(&input),
            Err(ConversionError::new(ErrorKind::TooLarge, 33))
        );
        assert!(!validate(&[0xC3, 0xA9]));
    }
}
