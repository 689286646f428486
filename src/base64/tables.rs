//! Alphabets and 256-entry decode tables.
//!
//! Decode tables map a byte to its 6-bit value, [`SPACE`] for ignorable
//! whitespace, or [`INVALID`].

pub(crate) const STANDARD: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub(crate) const URL: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub(crate) const SPACE: u8 = 64;
pub(crate) const INVALID: u8 = 255;

const fn build(primary: &[u8; 64], secondary: Option<&[u8; 64]>) -> [u8; 256] {
    let mut table = [INVALID; 256];
    table[b' ' as usize] = SPACE;
    table[b'\t' as usize] = SPACE;
    table[b'\n' as usize] = SPACE;
    table[b'\r' as usize] = SPACE;
    table[0x0C] = SPACE;
    let mut i = 0;
    while i < 64 {
        table[primary[i] as usize] = i as u8;
        i += 1;
    }
    if let Some(extra) = secondary {
        let mut i = 0;
        while i < 64 {
            table[extra[i] as usize] = i as u8;
            i += 1;
        }
    }
    table
}

pub(crate) static DECODE_STANDARD: [u8; 256] = build(STANDARD, None);
pub(crate) static DECODE_URL: [u8; 256] = build(URL, None);
pub(crate) static DECODE_STANDARD_OR_URL: [u8; 256] = build(STANDARD, Some(URL));
