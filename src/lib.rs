//! Fast Unicode validation and transcoding between UTF-8, UTF-16LE/BE,
//! UTF-32 and Latin1, plus a Base64 codec.
//!
//! Every routine runs on the fastest backend this CPU supports, chosen once
//! at first use (see [`active_implementation`]). Backends differ only in
//! speed: results, including error kinds and positions, are identical.
//!
//! # Example
//! ```
//! use utf_d::{Endianness, ErrorKind, convert_utf8_to_utf16, validate_utf8_with_errors};
//!
//! let mut out = [0u16; 2];
//! assert_eq!(convert_utf8_to_utf16("😀".as_bytes(), &mut out, Endianness::Little), 2);
//!
//! let err = validate_utf8_with_errors(b"ok\xC0\x80").unwrap_err();
//! assert_eq!((err.kind, err.position), (ErrorKind::Overlong, 2));
//! ```

mod base64;
mod chunked;
mod codec;
mod core;
mod replace;
mod scalar;
mod simd;
mod transcode;

pub mod convenience;
pub mod prelude;

pub use base64::{
    Alphabet, Base64Options, LastChunkHandling, UnknownOption, base64_length_from_binary,
    base64_length_from_binary_with_lines, base64_to_binary, base64_to_binary_safe,
    base64_to_binary_utf16, base64_to_binary_utf16_safe, binary_to_base64,
    binary_to_base64_with_lines, maximal_binary_length_from_base64,
    maximal_binary_length_from_base64_utf16,
};
pub use codec::{
    Codec, CpuFeature, Descriptor, FORCE_IMPLEMENTATION_ENV, active_implementation,
    available_implementations, implementation_by_name,
};
pub use crate::core::config::{
    Base64Settings, ConfigError, DispatchSettings, Settings, TranscodeSettings,
};
pub use crate::core::encoding::{
    Encoding, Endianness, UnknownEncoding, autodetect_encoding, bom_byte_size, check_bom,
    detect_encodings,
};
pub use crate::core::error::{ConversionError, ConversionResult, ErrorKind, FullResult, ResultExt};
pub use replace::{REPLACEMENT_CHARACTER, REPLACEMENT_LATIN1, REPLACEMENT_UTF8};
pub use simd::{has_avx2, has_neon, has_ssse3};
pub use transcode::*;
