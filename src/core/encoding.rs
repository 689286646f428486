use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte order of a multi-byte code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endianness = Endianness::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endianness = Endianness::Big;

    #[inline(always)]
    pub fn is_native(self) -> bool {
        self == Self::NATIVE
    }

    /// Reads a unit stored in this byte order as a native value.
    #[inline(always)]
    pub fn u16_to_native(self, unit: u16) -> u16 {
        if self.is_native() { unit } else { unit.swap_bytes() }
    }

    /// Stores a native value in this byte order.
    #[inline(always)]
    pub fn u16_from_native(self, unit: u16) -> u16 {
        self.u16_to_native(unit)
    }

    #[inline(always)]
    pub fn u32_to_native(self, unit: u32) -> u32 {
        if self.is_native() { unit } else { unit.swap_bytes() }
    }
}

/// A text encoding handled by this crate.
///
/// UTF-32 carries an endianness only for the byte-oriented layers (BOMs,
/// files, the CLI). The `u32` conversion API is native-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encoding {
    Utf8,
    Utf16(Endianness),
    Utf32(Endianness),
    Latin1,
}

impl Encoding {
    pub const UTF16LE: Encoding = Encoding::Utf16(Endianness::Little);
    pub const UTF16BE: Encoding = Encoding::Utf16(Endianness::Big);
    pub const UTF32LE: Encoding = Encoding::Utf32(Endianness::Little);
    pub const UTF32BE: Encoding = Encoding::Utf32(Endianness::Big);

    /// Every encoding, in listing order.
    pub const ALL: [Encoding; 6] = [
        Encoding::Utf8,
        Encoding::UTF16LE,
        Encoding::UTF16BE,
        Encoding::UTF32LE,
        Encoding::UTF32BE,
        Encoding::Latin1,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16(Endianness::Little) => "UTF-16LE",
            Encoding::Utf16(Endianness::Big) => "UTF-16BE",
            Encoding::Utf32(Endianness::Little) => "UTF-32LE",
            Encoding::Utf32(Endianness::Big) => "UTF-32BE",
            Encoding::Latin1 => "Latin1",
        }
    }

    /// Size of one code unit in bytes.
    pub fn unit_size(&self) -> usize {
        match self {
            Encoding::Utf8 | Encoding::Latin1 => 1,
            Encoding::Utf16(_) => 2,
            Encoding::Utf32(_) => 4,
        }
    }

    /// The byte-order mark for this encoding; empty for Latin1.
    pub fn bom(&self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16(Endianness::Little) => &[0xFF, 0xFE],
            Encoding::Utf16(Endianness::Big) => &[0xFE, 0xFF],
            Encoding::Utf32(Endianness::Little) => &[0xFF, 0xFE, 0x00, 0x00],
            Encoding::Utf32(Endianness::Big) => &[0x00, 0x00, 0xFE, 0xFF],
            Encoding::Latin1 => &[],
        }
    }

    /// Identifies the encoding announced by a leading byte-order mark.
    ///
    /// `FF FE 00 00` is tested before `FF FE`, so a UTF-32LE mark is never
    /// mistaken for UTF-16LE.
    pub fn from_bom(bytes: &[u8]) -> Option<Encoding> {
        match bytes {
            [0xFF, 0xFE, 0x00, 0x00, ..] => Some(Encoding::UTF32LE),
            [0xFF, 0xFE, ..] => Some(Encoding::UTF16LE),
            [0xFE, 0xFF, ..] => Some(Encoding::UTF16BE),
            [0x00, 0x00, 0xFE, 0xFF, ..] => Some(Encoding::UTF32BE),
            [0xEF, 0xBB, 0xBF, ..] => Some(Encoding::Utf8),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An encoding name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown encoding '{0}' (expected one of: utf-8, utf-16le, utf-16be, utf-32le, utf-32be, latin1)")]
pub struct UnknownEncoding(pub String);

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "utf16" | "utf16le" => Ok(Encoding::UTF16LE),
            "utf16be" => Ok(Encoding::UTF16BE),
            "utf32" | "utf32le" => Ok(Encoding::UTF32LE),
            "utf32be" => Ok(Encoding::UTF32BE),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = UnknownEncoding;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.name().to_string()
    }
}

/// The encoding announced by a byte-order mark, if any.
pub fn check_bom(bytes: &[u8]) -> Option<Encoding> {
    Encoding::from_bom(bytes)
}

/// Length of the byte-order mark at the start of `bytes`, or 0.
pub fn bom_byte_size(bytes: &[u8]) -> usize {
    Encoding::from_bom(bytes).map_or(0, |e| e.bom().len())
}

/// Reinterprets bytes as in-memory `u16` units; a trailing odd byte is dropped.
pub(crate) fn units16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
        .collect()
}

/// Reinterprets bytes as in-memory `u32` units; trailing bytes are dropped.
pub(crate) fn units32(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|quad| u32::from_ne_bytes([quad[0], quad[1], quad[2], quad[3]]))
        .collect()
}

/// Guesses the encoding of `bytes`.
///
/// A byte-order mark wins. Otherwise the first of UTF-8, UTF-16LE and
/// UTF-32LE that validates is returned.
pub fn autodetect_encoding(bytes: &[u8]) -> Option<Encoding> {
    if let Some(encoding) = Encoding::from_bom(bytes) {
        return Some(encoding);
    }
    detect_encodings(bytes).into_iter().next()
}

/// Every Unicode encoding under which `bytes` is well formed.
///
/// With a byte-order mark only the announced encoding is returned.
pub fn detect_encodings(bytes: &[u8]) -> Vec<Encoding> {
    if let Some(encoding) = Encoding::from_bom(bytes) {
        return vec![encoding];
    }
    let mut found = Vec::new();
    if crate::validate_utf8(bytes) {
        found.push(Encoding::Utf8);
    }
    if bytes.len() % 2 == 0 && crate::validate_utf16(&units16(bytes), Endianness::Little) {
        found.push(Encoding::UTF16LE);
    }
    if bytes.len() % 4 == 0 {
        let units: Vec<u32> = units32(bytes)
            .into_iter()
            .map(|u| Endianness::Little.u32_to_native(u))
            .collect();
        if crate::validate_utf32(&units) {
            found.push(Encoding::UTF32LE);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_detection_order() {
        assert_eq!(
            Encoding::from_bom(&[0xFF, 0xFE, 0x00, 0x00, 0x41]),
            Some(Encoding::UTF32LE)
        );
        assert_eq!(Encoding::from_bom(&[0xFF, 0xFE, 0x41, 0x00]), Some(Encoding::UTF16LE));
        assert_eq!(Encoding::from_bom(&[0xFE, 0xFF]), Some(Encoding::UTF16BE));
        assert_eq!(Encoding::from_bom(&[0x00, 0x00, 0xFE, 0xFF]), Some(Encoding::UTF32BE));
        assert_eq!(Encoding::from_bom(b"\xEF\xBB\xBFabc"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_bom(b"abc"), None);
        assert_eq!(Encoding::from_bom(&[0xEF, 0xBB]), None);
    }

    #[test]
    fn test_bom_byte_size() {
        assert_eq!(bom_byte_size(b"\xEF\xBB\xBFx"), 3);
        assert_eq!(bom_byte_size(&[0xFF, 0xFE, 0x00, 0x00]), 4);
        assert_eq!(bom_byte_size(b"plain"), 0);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf16".parse::<Encoding>().unwrap(), Encoding::UTF16LE);
        assert_eq!("UTF-16BE".parse::<Encoding>().unwrap(), Encoding::UTF16BE);
        assert_eq!("utf_32be".parse::<Encoding>().unwrap(), Encoding::UTF32BE);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for encoding in Encoding::ALL {
            assert_eq!(encoding.name().parse::<Encoding>().unwrap(), encoding);
        }
    }

    #[test]
    fn test_autodetect() {
        assert_eq!(autodetect_encoding("héllo".as_bytes()), Some(Encoding::Utf8));
        // "hi" in UTF-16LE is also valid UTF-8 (it has NULs), UTF-8 wins
        assert_eq!(autodetect_encoding(&[b'h', 0, b'i', 0]), Some(Encoding::Utf8));
        // 0xD83D 0xDE00 in UTF-16LE, not UTF-8
        assert_eq!(autodetect_encoding(&[0x3D, 0xD8, 0x00, 0xDE]), Some(Encoding::UTF16LE));
        assert_eq!(autodetect_encoding(&[0xFE, 0xFF, 0x00, 0x41]), Some(Encoding::UTF16BE));
        assert_eq!(autodetect_encoding(&[0xFF]), None);
    }

    #[test]
    fn test_detect_encodings() {
        let both = detect_encodings(&[b'a', 0, b'b', 0]);
        assert_eq!(both, vec![Encoding::Utf8, Encoding::UTF16LE]);
        assert_eq!(
            detect_encodings(&[b'a', 0, 0, 0]),
            vec![Encoding::Utf8, Encoding::UTF16LE, Encoding::UTF32LE]
        );
        assert_eq!(detect_encodings(&[0x00, 0xD8, 0x00, 0xDC]), vec![Encoding::UTF16LE]);
    }
}
