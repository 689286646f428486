//! Base64 codec (RFC 4648)
//!
//! Decoding follows a 4-character group state machine with configurable
//! alphabet, ignorable whitespace, optional garbage skipping and four
//! policies for an incomplete final group. Backends may supply a kernel that
//! decodes or encodes 16 characters at a time; groups it cannot handle fall
//! through to the scalar loop, which is authoritative for every error.
//!
//! Decoding also accepts native-endian UTF-16 code units. A unit above 0xFF
//! is never an alphabet character, whitespace or padding.

use crate::codec::active_implementation;
use crate::core::error::FullResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod tables;

/// Character set accepted or produced by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// `A-Z a-z 0-9 + /`
    Standard,
    /// `A-Z a-z 0-9 - _`
    Url,
    /// Either of the above when decoding; encodes as [`Alphabet::Standard`].
    StandardOrUrl,
}

impl Alphabet {
    pub(crate) fn decode_table(self) -> &'static [u8; 256] {
        match self {
            Alphabet::Standard => &tables::DECODE_STANDARD,
            Alphabet::Url => &tables::DECODE_URL,
            Alphabet::StandardOrUrl => &tables::DECODE_STANDARD_OR_URL,
        }
    }

    pub(crate) fn encode_table(self) -> &'static [u8; 64] {
        match self {
            Alphabet::Url => tables::URL,
            Alphabet::Standard | Alphabet::StandardOrUrl => tables::STANDARD,
        }
    }
}

/// Named option sets: alphabet, padding on encode, garbage tolerance on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Base64Options {
    /// Standard alphabet, padded.
    #[default]
    Default,
    /// URL alphabet, unpadded.
    Url,
    DefaultNoPadding,
    UrlWithPadding,
    /// Standard alphabet; decoding skips any byte outside it.
    DefaultAcceptGarbage,
    UrlAcceptGarbage,
    /// Decoding accepts both alphabets; encodes like `Default`.
    DefaultOrUrl,
    DefaultOrUrlAcceptGarbage,
}

impl Base64Options {
    pub const ALL: [Base64Options; 8] = [
        Base64Options::Default,
        Base64Options::Url,
        Base64Options::DefaultNoPadding,
        Base64Options::UrlWithPadding,
        Base64Options::DefaultAcceptGarbage,
        Base64Options::UrlAcceptGarbage,
        Base64Options::DefaultOrUrl,
        Base64Options::DefaultOrUrlAcceptGarbage,
    ];

    pub fn alphabet(self) -> Alphabet {
        match self {
            Base64Options::Default
            | Base64Options::DefaultNoPadding
            | Base64Options::DefaultAcceptGarbage => Alphabet::Standard,
            Base64Options::Url | Base64Options::UrlWithPadding | Base64Options::UrlAcceptGarbage => {
                Alphabet::Url
            }
            Base64Options::DefaultOrUrl | Base64Options::DefaultOrUrlAcceptGarbage => {
                Alphabet::StandardOrUrl
            }
        }
    }

    /// Whether encoding emits `=` padding: standard sets pad, URL sets do
    /// not, and the `NoPadding`/`WithPadding` variants flip that.
    pub fn uses_padding(self) -> bool {
        !matches!(
            self,
            Base64Options::Url | Base64Options::UrlAcceptGarbage | Base64Options::DefaultNoPadding
        )
    }

    pub fn accepts_garbage(self) -> bool {
        matches!(
            self,
            Base64Options::DefaultAcceptGarbage
                | Base64Options::UrlAcceptGarbage
                | Base64Options::DefaultOrUrlAcceptGarbage
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Base64Options::Default => "default",
            Base64Options::Url => "url",
            Base64Options::DefaultNoPadding => "default_no_padding",
            Base64Options::UrlWithPadding => "url_with_padding",
            Base64Options::DefaultAcceptGarbage => "default_accept_garbage",
            Base64Options::UrlAcceptGarbage => "url_accept_garbage",
            Base64Options::DefaultOrUrl => "default_or_url",
            Base64Options::DefaultOrUrlAcceptGarbage => "default_or_url_accept_garbage",
        }
    }
}

/// What to do with a final group of fewer than four characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastChunkHandling {
    /// Decode a 2- or 3-character remainder, with or without padding.
    #[default]
    Loose,
    /// Require padding to complete the group and zero leftover bits.
    Strict,
    /// Stop before an unpadded partial group, reporting how far decoding got.
    StopBeforePartial,
    /// Stop before any partial group, padded or not.
    OnlyFullChunks,
}

impl LastChunkHandling {
    pub const ALL: [LastChunkHandling; 4] = [
        LastChunkHandling::Loose,
        LastChunkHandling::Strict,
        LastChunkHandling::StopBeforePartial,
        LastChunkHandling::OnlyFullChunks,
    ];

    pub(crate) fn is_partial(self) -> bool {
        matches!(
            self,
            LastChunkHandling::StopBeforePartial | LastChunkHandling::OnlyFullChunks
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            LastChunkHandling::Loose => "loose",
            LastChunkHandling::Strict => "strict",
            LastChunkHandling::StopBeforePartial => "stop_before_partial",
            LastChunkHandling::OnlyFullChunks => "only_full_chunks",
        }
    }
}

/// An option name that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{name}' (expected one of: {expected})")]
pub struct UnknownOption {
    kind: &'static str,
    name: String,
    expected: String,
}

fn parse_named<T: Copy>(
    s: &str,
    all: &[T],
    name: impl Fn(T) -> &'static str,
    kind: &'static str,
) -> Result<T, UnknownOption> {
    let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
    all.iter()
        .copied()
        .find(|&option| name(option) == wanted)
        .ok_or_else(|| UnknownOption {
            kind,
            name: s.to_string(),
            expected: all.iter().map(|&o| name(o)).collect::<Vec<_>>().join(", "),
        })
}

impl FromStr for Base64Options {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Base64Options::ALL, Base64Options::name, "base64 option set")
    }
}

impl FromStr for LastChunkHandling {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &LastChunkHandling::ALL, LastChunkHandling::name, "last-chunk mode")
    }
}

impl fmt::Display for Base64Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for LastChunkHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 16-character Base64 kernels a vector backend can provide.
///
/// The defaults are table-driven; `ENABLED = false` keeps the scalar
/// reference from taking the block path at all.
pub(crate) trait Base64Blocks {
    const ENABLED: bool = true;

    /// Decodes 16 characters into 12 bytes. Returns false, with `output`
    /// unspecified, if any character is not a 6-bit value of `alphabet`.
    fn decode_block(input: &[u8; 16], output: &mut [u8; 12], alphabet: Alphabet) -> bool {
        decode_block_scalar(input, output, alphabet)
    }

    /// Encodes the first 12 bytes of `input` into 16 characters.
    fn encode_block(input: &[u8; 16], output: &mut [u8; 16], alphabet: Alphabet) {
        encode_block_scalar(input, output, alphabet)
    }
}

/// A character of Base64 input: a byte or a native UTF-16 code unit.
pub(crate) trait Unit: Copy {
    /// The byte this unit stands for, or `None` if it is wider than a byte.
    fn byte(self) -> Option<u8>;
}

impl Unit for u8 {
    #[inline(always)]
    fn byte(self) -> Option<u8> {
        Some(self)
    }
}

impl Unit for u16 {
    #[inline(always)]
    fn byte(self) -> Option<u8> {
        u8::try_from(self).ok()
    }
}

/// No block kernel: every group goes through the scalar loop.
pub(crate) struct NoBlocks;

impl Base64Blocks for NoBlocks {
    const ENABLED: bool = false;
}

pub(crate) fn decode_block_scalar(input: &[u8; 16], output: &mut [u8; 12], alphabet: Alphabet) -> bool {
    let table = alphabet.decode_table();
    for (group, out) in input.chunks_exact(4).zip(output.chunks_exact_mut(3)) {
        let values = [
            table[group[0] as usize],
            table[group[1] as usize],
            table[group[2] as usize],
            table[group[3] as usize],
        ];
        if values.iter().any(|&v| v > 63) {
            return false;
        }
        let triple = (values[0] as u32) << 18
            | (values[1] as u32) << 12
            | (values[2] as u32) << 6
            | values[3] as u32;
        out[0] = (triple >> 16) as u8;
        out[1] = (triple >> 8) as u8;
        out[2] = triple as u8;
    }
    true
}

pub(crate) fn encode_block_scalar(input: &[u8; 16], output: &mut [u8; 16], alphabet: Alphabet) {
    let table = alphabet.encode_table();
    for (group, out) in input[..12].chunks_exact(3).zip(output.chunks_exact_mut(4)) {
        let triple = (group[0] as u32) << 16 | (group[1] as u32) << 8 | group[2] as u32;
        out[0] = table[(triple >> 18) as usize & 0x3F];
        out[1] = table[(triple >> 12) as usize & 0x3F];
        out[2] = table[(triple >> 6) as usize & 0x3F];
        out[3] = table[triple as usize & 0x3F];
    }
}

pub(crate) fn maximal_binary_length<T: Unit>(input: &[T]) -> usize {
    let is_equal = |at: usize| input[at].byte() == Some(b'=');
    let mut padding = 0;
    if !input.is_empty() && is_equal(input.len() - 1) {
        padding += 1;
        if input.len() >= 2 && is_equal(input.len() - 2) {
            padding += 1;
        }
    }
    let actual = input.len() - padding;
    if actual % 4 <= 1 {
        actual / 4 * 3
    } else {
        actual / 4 * 3 + actual % 4 - 1
    }
}

/// Upper bound on the decoded size of `input`: every character except up
/// to two trailing `=` is assumed to carry data.
pub fn maximal_binary_length_from_base64(input: &[u8]) -> usize {
    maximal_binary_length(input)
}

/// [`maximal_binary_length_from_base64`] for UTF-16 input.
pub fn maximal_binary_length_from_base64_utf16(input: &[u16]) -> usize {
    maximal_binary_length(input)
}

/// Encoded length of `len` bytes, with or without padding per `options`.
pub fn base64_length_from_binary(len: usize, options: Base64Options) -> usize {
    if options.uses_padding() {
        len.div_ceil(3) * 4
    } else {
        let rem = len % 3;
        len / 3 * 4 + if rem == 0 { 0 } else { rem + 1 }
    }
}

pub(crate) fn effective_line_length(line_length: usize) -> usize {
    line_length.max(4)
}

/// Encoded length including a `\n` after every full line except the last.
pub fn base64_length_from_binary_with_lines(
    len: usize,
    options: Base64Options,
    line_length: usize,
) -> usize {
    let chars = base64_length_from_binary(len, options);
    if chars == 0 {
        return 0;
    }
    chars + (chars - 1) / effective_line_length(line_length)
}

/// Decodes `input` into `output`.
///
/// On success `input_count` is the input consumed and `output_count` the
/// bytes written. On error `input_count` locates the offending character.
///
/// # Panics
/// If `output` is shorter than [`maximal_binary_length_from_base64`]; use
/// [`base64_to_binary_safe`] for a bounded output.
pub fn base64_to_binary(
    input: &[u8],
    output: &mut [u8],
    options: Base64Options,
    last_chunk: LastChunkHandling,
) -> FullResult {
    active_implementation().base64_to_binary(input, output, options, last_chunk)
}

/// Like [`base64_to_binary`] but stops with `OutputBufferTooSmall` when the
/// next group does not fit, reporting the bytes written so far.
pub fn base64_to_binary_safe(
    input: &[u8],
    output: &mut [u8],
    options: Base64Options,
    last_chunk: LastChunkHandling,
) -> FullResult {
    active_implementation().base64_to_binary_safe(input, output, options, last_chunk)
}

/// Decodes native-endian UTF-16 `input` into `output`. Positions in the
/// result count code units.
///
/// # Panics
/// If `output` is shorter than [`maximal_binary_length_from_base64_utf16`].
pub fn base64_to_binary_utf16(
    input: &[u16],
    output: &mut [u8],
    options: Base64Options,
    last_chunk: LastChunkHandling,
) -> FullResult {
    active_implementation().base64_to_binary_utf16(input, output, options, last_chunk)
}

/// [`base64_to_binary_safe`] for native-endian UTF-16 input.
pub fn base64_to_binary_utf16_safe(
    input: &[u16],
    output: &mut [u8],
    options: Base64Options,
    last_chunk: LastChunkHandling,
) -> FullResult {
    active_implementation().base64_to_binary_utf16_safe(input, output, options, last_chunk)
}

/// Encodes `input`, returning the number of characters written.
///
/// # Panics
/// If `output` is shorter than [`base64_length_from_binary`].
pub fn binary_to_base64(input: &[u8], output: &mut [u8], options: Base64Options) -> usize {
    active_implementation().binary_to_base64(input, output, options)
}

/// Encodes `input` with a `\n` after every `line_length` characters (at
/// least 4), except after the final line.
///
/// # Panics
/// If `output` is shorter than [`base64_length_from_binary_with_lines`].
pub fn binary_to_base64_with_lines(
    input: &[u8],
    output: &mut [u8],
    line_length: usize,
    options: Base64Options,
) -> usize {
    active_implementation().binary_to_base64_with_lines(input, output, line_length, options)
}
