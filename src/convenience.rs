//! Allocating helpers over the slice API.
//!
//! These size the output buffer themselves and hand back owned `Vec`s and
//! `String`s. [`transcode`] works on raw bytes in any [`Encoding`], which
//! is what file and stream tooling usually has in hand.

use crate::codec::{Codec, active_implementation};
use crate::core::encoding::{Encoding, Endianness, units16, units32};
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};
use crate::replace::{self, REPLACEMENT_CHARACTER, REPLACEMENT_UTF8};
use crate::scalar;

/// Decodes native-endian UTF-16 into a `String`.
///
/// # Example
/// ```
/// use utf_d::{Endianness, convenience::utf16_to_string};
///
/// let units: Vec<u16> = "héllo".encode_utf16().collect();
/// assert_eq!(utf16_to_string(&units, Endianness::NATIVE).unwrap(), "héllo");
/// ```
pub fn utf16_to_string(input: &[u16], endian: Endianness) -> Result<String, ConversionError> {
    let bytes = fill(input.len() * 3, |out| active_implementation().convert_utf16_to_utf8(input, out, endian))?;
    into_string(bytes)
}

pub fn utf32_to_string(input: &[u32]) -> Result<String, ConversionError> {
    let bytes = fill(input.len() * 4, |out| active_implementation().convert_utf32_to_utf8(input, out))?;
    into_string(bytes)
}

/// Every byte is a code point, so this cannot fail.
pub fn latin1_to_string(input: &[u8]) -> String {
    input.iter().map(|&b| b as char).collect()
}

pub fn string_to_utf16(s: &str, endian: Endianness) -> Vec<u16> {
    let codec = active_implementation();
    let mut out = vec![0u16; codec.utf16_length_from_utf8(s.as_bytes())];
    let n = codec.convert_valid_utf8_to_utf16(s.as_bytes(), &mut out, endian);
    out.truncate(n);
    out
}

pub fn string_to_utf32(s: &str) -> Vec<u32> {
    let codec = active_implementation();
    let mut out = vec![0u32; codec.count_utf8(s.as_bytes())];
    let n = codec.convert_valid_utf8_to_utf32(s.as_bytes(), &mut out);
    out.truncate(n);
    out
}

/// Fails with `TooLarge` at the byte offset of the first character above
/// U+00FF.
pub fn string_to_latin1(s: &str) -> Result<Vec<u8>, ConversionError> {
    fill(s.chars().count(), |out| active_implementation().convert_utf8_to_latin1(s.as_bytes(), out))
}

/// Converts `bytes` from one encoding to another on the active backend.
///
/// Errors carry positions in units of `from` (bytes, `u16` or `u32`). A
/// trailing partial code unit, such as an odd byte in UTF-16 input, is
/// `Other` at the unit count.
///
/// # Example
/// ```
/// use utf_d::{Encoding, convenience::transcode};
///
/// let utf16 = transcode("ä€".as_bytes(), Encoding::Utf8, Encoding::UTF16BE).unwrap();
/// assert_eq!(utf16, [0x00, 0xE4, 0x20, 0xAC]);
/// ```
pub fn transcode(bytes: &[u8], from: Encoding, to: Encoding) -> Result<Vec<u8>, ConversionError> {
    transcode_with(active_implementation(), bytes, from, to)
}

pub fn transcode_with(
    codec: &dyn Codec,
    bytes: &[u8],
    from: Encoding,
    to: Encoding,
) -> Result<Vec<u8>, ConversionError> {
    let source = Source::read(bytes, from);
    if source.partial {
        source.validate(codec)?;
        return Err(ConversionError::new(ErrorKind::Other, source.len()));
    }
    source.write(codec, to, false)
}

/// Checks that `bytes` is well formed in `encoding`, returning the number
/// of code units. Latin1 is always valid.
///
/// Positions are in units of `encoding`. A trailing partial code unit is
/// `Other` at the unit count.
pub fn validate_encoded(bytes: &[u8], encoding: Encoding) -> ConversionResult {
    validate_encoded_with(active_implementation(), bytes, encoding)
}

pub fn validate_encoded_with(codec: &dyn Codec, bytes: &[u8], encoding: Encoding) -> ConversionResult {
    let source = Source::read(bytes, encoding);
    let units = source.validate(codec)?;
    if source.partial {
        return Err(ConversionError::new(ErrorKind::Other, units));
    }
    Ok(units)
}

/// Like [`transcode`], but malformed input becomes U+FFFD (`?` in Latin1)
/// and a trailing partial code unit becomes one more replacement.
pub fn transcode_lossy(bytes: &[u8], from: Encoding, to: Encoding) -> Vec<u8> {
    transcode_lossy_with(active_implementation(), bytes, from, to)
}

pub fn transcode_lossy_with(codec: &dyn Codec, bytes: &[u8], from: Encoding, to: Encoding) -> Vec<u8> {
    let source = Source::read(bytes, from);
    // worst-case capacities hold every replacement, so this cannot fail
    let mut out = source.write(codec, to, true).unwrap_or_default();
    if source.partial {
        out.extend_from_slice(replacement_bytes(to));
    }
    out
}

fn replacement_bytes(to: Encoding) -> &'static [u8] {
    match to {
        Encoding::Utf8 => &REPLACEMENT_UTF8,
        Encoding::Utf16(Endianness::Little) => &[0xFD, 0xFF],
        Encoding::Utf16(Endianness::Big) => &[0xFF, 0xFD],
        Encoding::Utf32(Endianness::Little) => &[0xFD, 0xFF, 0x00, 0x00],
        Encoding::Utf32(Endianness::Big) => &[0x00, 0x00, 0xFF, 0xFD],
        Encoding::Latin1 => b"?",
    }
}

fn fill<T: Copy + Default>(capacity: usize, convert: impl FnOnce(&mut [T]) -> ConversionResult) -> Result<Vec<T>, ConversionError> {
    let mut out = vec![T::default(); capacity];
    let n = convert(&mut out)?;
    out.truncate(n);
    Ok(out)
}

fn into_string(bytes: Vec<u8>) -> Result<String, ConversionError> {
    String::from_utf8(bytes).map_err(|e| ConversionError::new(ErrorKind::Other, e.utf8_error().valid_up_to()))
}

enum Units<'a> {
    Utf8(&'a [u8]),
    /// Units in `endian` byte order.
    Utf16(Vec<u16>, Endianness),
    /// Native code points.
    Utf32(Vec<u32>),
    Latin1(&'a [u8]),
}

struct Source<'a> {
    units: Units<'a>,
    /// Input ended inside a code unit.
    partial: bool,
}

impl<'a> Source<'a> {
    fn read(bytes: &'a [u8], from: Encoding) -> Self {
        let partial = bytes.len() % from.unit_size() != 0;
        let units = match from {
            Encoding::Utf8 => Units::Utf8(bytes),
            Encoding::Latin1 => Units::Latin1(bytes),
            Encoding::Utf16(endian) => Units::Utf16(units16(bytes), endian),
            Encoding::Utf32(endian) => {
                Units::Utf32(units32(bytes).into_iter().map(|u| endian.u32_to_native(u)).collect())
            }
        };
        Self { units, partial }
    }

    fn len(&self) -> usize {
        match &self.units {
            Units::Utf8(b) | Units::Latin1(b) => b.len(),
            Units::Utf16(u, _) => u.len(),
            Units::Utf32(u) => u.len(),
        }
    }

    fn validate(&self, codec: &dyn Codec) -> ConversionResult {
        match &self.units {
            Units::Utf8(b) => codec.validate_utf8_with_errors(b),
            Units::Utf16(u, endian) => codec.validate_utf16_with_errors(u, *endian),
            Units::Utf32(u) => codec.validate_utf32_with_errors(u),
            Units::Latin1(b) => Ok(b.len()),
        }
    }

    fn write(&self, codec: &dyn Codec, to: Encoding, lossy: bool) -> Result<Vec<u8>, ConversionError> {
        match to {
            Encoding::Utf8 | Encoding::Latin1 => self.to_bytes(codec, to == Encoding::Latin1, lossy),
            Encoding::Utf16(endian) => {
                let units = self.to_utf16(codec, endian, lossy)?;
                Ok(units.iter().flat_map(|u| u.to_ne_bytes()).collect())
            }
            Encoding::Utf32(endian) => {
                let units = self.to_utf32(codec, lossy)?;
                Ok(match endian {
                    Endianness::Little => units.iter().flat_map(|u| u.to_le_bytes()).collect(),
                    Endianness::Big => units.iter().flat_map(|u| u.to_be_bytes()).collect(),
                })
            }
        }
    }

    fn to_bytes(&self, codec: &dyn Codec, latin1: bool, lossy: bool) -> Result<Vec<u8>, ConversionError> {
        match (&self.units, latin1) {
            (Units::Utf8(b), false) if lossy => Ok(String::from_utf8_lossy(b).into_owned().into_bytes()),
            (Units::Utf8(b), false) => codec.validate_utf8_with_errors(b).map(|_| b.to_vec()),
            (Units::Latin1(b), true) => Ok(b.to_vec()),
            (Units::Utf8(b), true) => fill(b.len(), |out| match lossy {
                true => replace::utf8_to_latin1(codec, b, out),
                false => codec.convert_utf8_to_latin1(b, out),
            }),
            (Units::Latin1(b), false) => fill(2 * b.len(), |out| codec.convert_latin1_to_utf8(b, out)),
            (Units::Utf16(u, endian), false) => fill(3 * u.len(), |out| match lossy {
                true => replace::utf16_to_utf8(codec, u, out, *endian),
                false => codec.convert_utf16_to_utf8(u, out, *endian),
            }),
            (Units::Utf16(u, endian), true) => fill(u.len(), |out| match lossy {
                true => replace::utf16_to_latin1(codec, u, out, *endian),
                false => codec.convert_utf16_to_latin1(u, out, *endian),
            }),
            (Units::Utf32(u), false) => fill(4 * u.len(), |out| match lossy {
                true => replace::utf32_to_utf8(codec, u, out),
                false => codec.convert_utf32_to_utf8(u, out),
            }),
            (Units::Utf32(u), true) => fill(u.len(), |out| match lossy {
                true => replace::utf32_to_latin1(codec, u, out),
                false => codec.convert_utf32_to_latin1(u, out),
            }),
        }
    }

    fn to_utf16(&self, codec: &dyn Codec, to: Endianness, lossy: bool) -> Result<Vec<u16>, ConversionError> {
        match &self.units {
            Units::Utf16(u, from) => {
                let mut out = vec![0u16; u.len()];
                if lossy {
                    scalar::utf16::to_well_formed(u, &mut out, *from);
                } else {
                    codec.validate_utf16_with_errors(u, *from)?;
                    out.copy_from_slice(u);
                }
                if from != &to {
                    out.iter_mut().for_each(|unit| *unit = unit.swap_bytes());
                }
                Ok(out)
            }
            Units::Utf8(b) => fill(b.len(), |out| match lossy {
                true => replace::utf8_to_utf16(codec, b, out, to),
                false => codec.convert_utf8_to_utf16(b, out, to),
            }),
            Units::Utf32(u) => fill(2 * u.len(), |out| match lossy {
                true => replace::utf32_to_utf16(codec, u, out, to),
                false => codec.convert_utf32_to_utf16(u, out, to),
            }),
            Units::Latin1(b) => fill(b.len(), |out| codec.convert_latin1_to_utf16(b, out, to)),
        }
    }

    fn to_utf32(&self, codec: &dyn Codec, lossy: bool) -> Result<Vec<u32>, ConversionError> {
        match &self.units {
            Units::Utf32(u) if lossy => Ok(u
                .iter()
                .map(|&cp| scalar::utf32::check(cp).unwrap_or(REPLACEMENT_CHARACTER))
                .collect()),
            Units::Utf32(u) => codec.validate_utf32_with_errors(u).map(|_| u.clone()),
            Units::Utf8(b) => fill(b.len(), |out| match lossy {
                true => replace::utf8_to_utf32(codec, b, out),
                false => codec.convert_utf8_to_utf32(b, out),
            }),
            Units::Utf16(u, endian) => fill(u.len(), |out| match lossy {
                true => replace::utf16_to_utf32(codec, u, out, *endian),
                false => codec.convert_utf16_to_utf32(u, out, *endian),
            }),
            Units::Latin1(b) => fill(b.len(), |out| codec.convert_latin1_to_utf32(b, out)),
        }
    }
}
