use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification of a validation, conversion or Base64 failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No error.
    Success,
    /// A UTF-8 lead byte with an impossible bit pattern (0xF8..=0xFF).
    HeaderBits,
    /// A UTF-8 sequence is missing continuation bytes.
    TooShort,
    /// A UTF-8 continuation byte with no lead byte before it.
    TooLong,
    /// A UTF-8 sequence encodes a code point that fits in fewer bytes.
    Overlong,
    /// The code point exceeds U+10FFFF, or the target encoding's range
    /// (0xFF for Latin1, 0x7F for ASCII).
    TooLarge,
    /// A surrogate code point in UTF-8/UTF-32, or an unpaired surrogate in UTF-16.
    Surrogate,
    /// A byte that is neither in the Base64 alphabet nor ignorable.
    InvalidBase64Character,
    /// Base64 input ends with a single character, or with a group that
    /// padding cannot complete.
    Base64InputRemainder,
    /// Base64 trailing bits that must be zero are not.
    Base64ExtraBits,
    /// The output slice cannot hold the next code point or group.
    OutputBufferTooSmall,
    /// Never produced by the transcoders themselves.
    Other,
}

impl ErrorKind {
    /// The canonical upper-case name, e.g. `TOO_SHORT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Success => "SUCCESS",
            ErrorKind::HeaderBits => "HEADER_BITS",
            ErrorKind::TooShort => "TOO_SHORT",
            ErrorKind::TooLong => "TOO_LONG",
            ErrorKind::Overlong => "OVERLONG",
            ErrorKind::TooLarge => "TOO_LARGE",
            ErrorKind::Surrogate => "SURROGATE",
            ErrorKind::InvalidBase64Character => "INVALID_BASE64_CHARACTER",
            ErrorKind::Base64InputRemainder => "BASE64_INPUT_REMAINDER",
            ErrorKind::Base64ExtraBits => "BASE64_EXTRA_BITS",
            ErrorKind::OutputBufferTooSmall => "OUTPUT_BUFFER_TOO_SMALL",
            ErrorKind::Other => "OTHER",
        }
    }

    /// A short human-readable explanation.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Success => "no error",
            ErrorKind::HeaderBits => "invalid lead byte",
            ErrorKind::TooShort => "missing continuation byte",
            ErrorKind::TooLong => "unexpected continuation byte",
            ErrorKind::Overlong => "overlong encoding",
            ErrorKind::TooLarge => "code point out of range",
            ErrorKind::Surrogate => "surrogate code point",
            ErrorKind::InvalidBase64Character => "invalid base64 character",
            ErrorKind::Base64InputRemainder => "incomplete base64 group",
            ErrorKind::Base64ExtraBits => "non-zero trailing base64 bits",
            ErrorKind::OutputBufferTooSmall => "output buffer too small",
            ErrorKind::Other => "unspecified error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed validation or conversion: what went wrong and where.
///
/// `position` is an offset in *input units* (bytes for UTF-8, Latin1 and
/// Base64, `u16` for UTF-16, `u32` for UTF-32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[error("{} ({kind}) at input position {position}", .kind.description())]
pub struct ConversionError {
    pub kind: ErrorKind,
    pub position: usize,
}

impl ConversionError {
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self { kind, position }
    }

    /// Shifts the position by `base`, for errors found in a sub-slice.
    #[inline]
    pub(crate) fn offset(self, base: usize) -> Self {
        Self {
            kind: self.kind,
            position: self.position + base,
        }
    }
}

/// `Ok(units)` on success: output units written, or input units validated
/// for validate-only calls. `Err` carries the kind and the input offset of
/// the first invalid unit.
pub type ConversionResult = Result<usize, ConversionError>;

/// Flat `(error, count)` view of a [`ConversionResult`].
///
/// `count()` is the success count or the error position, matching the
/// classic single-integer result layout.
pub trait ResultExt {
    fn error_kind(&self) -> ErrorKind;
    fn count(&self) -> usize;
}

impl ResultExt for ConversionResult {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Ok(_) => ErrorKind::Success,
            Err(e) => e.kind,
        }
    }

    fn count(&self) -> usize {
        match self {
            Ok(n) => *n,
            Err(e) => e.position,
        }
    }
}

/// Result of an operation that reports consumed input and produced output
/// independently (Base64 decoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FullResult {
    pub error: ErrorKind,
    pub input_count: usize,
    pub output_count: usize,
    /// Set when the error was caused by misplaced `=` padding.
    pub padding_error: bool,
}

impl FullResult {
    pub fn new(error: ErrorKind, input_count: usize, output_count: usize) -> Self {
        Self {
            error,
            input_count,
            output_count,
            padding_error: false,
        }
    }

    pub(crate) fn padding(error: ErrorKind, input_count: usize, output_count: usize) -> Self {
        Self {
            error,
            input_count,
            output_count,
            padding_error: true,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error == ErrorKind::Success
    }

    /// Converts to a [`ConversionResult`]: output bytes on success,
    /// `input_count` as the error position otherwise.
    pub fn into_result(self) -> ConversionResult {
        if self.is_ok() {
            Ok(self.output_count)
        } else {
            Err(ConversionError::new(self.error, self.input_count))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ConversionError::new(ErrorKind::Overlong, 3);
        assert_eq!(
            err.to_string(),
            "overlong encoding (OVERLONG) at input position 3"
        );
    }

    #[test]
    fn test_flat_view() {
        let ok: ConversionResult = Ok(7);
        assert_eq!(ok.error_kind(), ErrorKind::Success);
        assert_eq!(ok.count(), 7);

        let err: ConversionResult = Err(ConversionError::new(ErrorKind::Surrogate, 2));
        assert_eq!(err.error_kind(), ErrorKind::Surrogate);
        assert_eq!(err.count(), 2);
    }

    #[test]
    fn test_serialize_names() {
        let json = serde_json::to_string(&ErrorKind::InvalidBase64Character).unwrap();
        assert_eq!(json, "\"INVALID_BASE64_CHARACTER\"");
    }

    #[test]
    fn test_full_result_into_result() {
        assert_eq!(FullResult::new(ErrorKind::Success, 8, 6).into_result(), Ok(6));
        assert_eq!(
            FullResult::new(ErrorKind::Base64ExtraBits, 3, 1).into_result(),
            Err(ConversionError::new(ErrorKind::Base64ExtraBits, 3))
        );
    }
}
