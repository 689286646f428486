//! Convenient re-exports for common usage.
//!
//! # Example
//!
//! ```
//! use utf_d::prelude::*;
//!
//! let bytes = transcode("héllo".as_bytes(), Encoding::Utf8, Encoding::Latin1).unwrap();
//! assert_eq!(bytes, b"h\xE9llo");
//! ```

pub use crate::{
    // Options
    Base64Options,
    // Results
    ConversionError,
    ConversionResult,
    Encoding,
    Endianness,
    ErrorKind,
    FullResult,
    LastChunkHandling,
    ResultExt,
    // Base64
    base64_to_binary_safe,
    binary_to_base64,
    // Allocating helpers
    convenience::{
        latin1_to_string, string_to_latin1, string_to_utf16, string_to_utf32, transcode,
        transcode_lossy, utf16_to_string, utf32_to_string,
    },
    // Validation
    validate_utf8,
    validate_utf8_with_errors,
    validate_utf16,
    validate_utf16_with_errors,
    validate_utf32,
    validate_utf32_with_errors,
};
