//! UTF-8 validation, counting and transcoding
//!
//! Validation uses the lookup algorithm of Keiser and Lemire ("Validating
//! UTF-8 In Less Than One Instruction Per Byte", 2021): three 16-entry table
//! lookups on the high and low nibble of the previous byte and the high
//! nibble of the current byte yield a bitset of the error classes the byte
//! pair could belong to. The bits that survive the AND are errors, except
//! that the second and third continuation bytes of 3- and 4-byte sequences
//! are reconciled separately from the bytes two and three positions back.

use crate::core::encoding::Endianness;
use crate::core::error::{ConversionError, ConversionResult, ErrorKind};
use crate::scalar;
use crate::simd::Vector;

// Error classes, one bit each (TOO_LARGE_1000 and OVERLONG_4 share a bit:
// they are told apart by the byte-1 tables).
const TOO_SHORT: u8 = 1 << 0; // 11______ 0_______ or 11______ 11______
const TOO_LONG: u8 = 1 << 1; // 0_______ 10______
const OVERLONG_3: u8 = 1 << 2; // 11100000 100_____
const TOO_LARGE: u8 = 1 << 3; // 11110100 1001____ and above
const SURROGATE: u8 = 1 << 4; // 11101101 101_____
const OVERLONG_2: u8 = 1 << 5; // 1100000_ 10______
const TOO_LARGE_1000: u8 = 1 << 6; // 11110101..11111111 1000____
const OVERLONG_4: u8 = 1 << 6; // 11110000 1000____
const TWO_CONTS: u8 = 1 << 7; // 10______ 10______
const CARRY: u8 = TOO_SHORT | TOO_LONG | TWO_CONTS;

const BYTE_1_HIGH: [u8; 16] = [
    // 0_______ ASCII
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    // 10______ continuation
    TWO_CONTS,
    TWO_CONTS,
    TWO_CONTS,
    TWO_CONTS,
    // 1100____
    TOO_SHORT | OVERLONG_2,
    // 1101____
    TOO_SHORT,
    // 1110____
    TOO_SHORT | OVERLONG_3 | SURROGATE,
    // 1111____
    TOO_SHORT | TOO_LARGE | TOO_LARGE_1000 | OVERLONG_4,
];

const BYTE_1_LOW: [u8; 16] = [
    CARRY | OVERLONG_3 | OVERLONG_2 | OVERLONG_4,
    CARRY | OVERLONG_2,
    CARRY,
    CARRY,
    CARRY | TOO_LARGE,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000 | SURROGATE,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
];

const BYTE_2_HIGH: [u8; 16] = [
    // 0_______
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    // 1000____
    TOO_LONG | OVERLONG_2 | TWO_CONTS | OVERLONG_3 | TOO_LARGE_1000 | OVERLONG_4,
    // 1001____
    TOO_LONG | OVERLONG_2 | TWO_CONTS | OVERLONG_3 | TOO_LARGE,
    // 101_____
    TOO_LONG | OVERLONG_2 | TWO_CONTS | SURROGATE | TOO_LARGE,
    TOO_LONG | OVERLONG_2 | TWO_CONTS | SURROGATE | TOO_LARGE,
    // 11______
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
];

/// Upper bound on each lane for the chunk to end on a sequence boundary:
/// a lead byte in one of the last three lanes needing more bytes than remain
/// exceeds it. Loaded at offset `64 - LANES`.
static INCOMPLETE_MAX: [u8; 64] = {
    let mut max = [0xFFu8; 64];
    max[61] = 0b1111_0000 - 1;
    max[62] = 0b1110_0000 - 1;
    max[63] = 0b1100_0000 - 1;
    max
};

/// High nibble to 0x80 for continuation bytes (`10xx____`).
const CONTINUATION: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0x80, 0x80, 0x80, 0x80, 0, 0, 0, 0];

/// High nibble to 0x80 for 4-byte leads (`1111____`).
const FOUR_BYTE_LEAD: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x80];

/// Running state of the lookup validator across consecutive chunks.
struct Checker<V: Vector> {
    error: V,
    prev_input: V,
    prev_incomplete: V,
}

impl<V: Vector> Checker<V> {
    #[inline(always)]
    fn new() -> Self {
        let zero = V::splat(0);
        Self {
            error: zero,
            prev_input: zero,
            prev_incomplete: zero,
        }
    }

    #[inline(always)]
    fn special_cases(input: V, prev1: V) -> V {
        let byte_1_high = prev1.shr4().lookup16(&BYTE_1_HIGH);
        let byte_1_low = prev1.and(V::splat(0x0F)).lookup16(&BYTE_1_LOW);
        let byte_2_high = input.shr4().lookup16(&BYTE_2_HIGH);
        byte_1_high.and(byte_1_low).and(byte_2_high)
    }

    /// Flags a continuation byte where a lead two or three bytes back
    /// requires one, and vice versa. TWO_CONTS from the tables marks exactly
    /// the positions that are legal only in that case.
    #[inline(always)]
    fn multibyte_lengths(input: V, prev_input: V, special_cases: V) -> V {
        let prev2 = input.prev2(prev_input);
        let prev3 = input.prev3(prev_input);
        let must_be_2_3_continuation = prev2
            .saturating_sub(V::splat(0xE0 - 0x80))
            .or(prev3.saturating_sub(V::splat(0xF0 - 0x80)));
        must_be_2_3_continuation.and(V::splat(0x80)).xor(special_cases)
    }

    #[inline(always)]
    fn is_incomplete(input: V) -> V {
        input.saturating_sub(V::load(&INCOMPLETE_MAX[64 - V::LANES..]))
    }

    #[inline(always)]
    fn check(&mut self, input: V) {
        if input.is_ascii() {
            // A sequence left open by the previous chunk is cut short here.
            self.error = self.error.or(self.prev_incomplete);
            self.prev_incomplete = V::splat(0);
        } else {
            let prev1 = input.prev1(self.prev_input);
            let special_cases = Self::special_cases(input, prev1);
            self.error = self
                .error
                .or(Self::multibyte_lengths(input, self.prev_input, special_cases));
            self.prev_incomplete = Self::is_incomplete(input);
        }
        self.prev_input = input;
    }

    #[inline(always)]
    fn check_eof(&mut self) {
        self.error = self.error.or(self.prev_incomplete);
    }

    #[inline(always)]
    fn has_error(&self) -> bool {
        self.error.any_set()
    }
}

/// True if `chunk`, taken to start on a sequence boundary, contains no
/// error other than a sequence cut off at its end.
#[inline(always)]
fn chunk_is_valid<V: Vector>(chunk: V) -> bool {
    let mut checker = Checker::<V>::new();
    checker.check(chunk);
    !checker.has_error()
}

pub(crate) fn validate<V: Vector>(input: &[u8]) -> bool {
    V::with_features(|| {
        let mut checker = Checker::<V>::new();
        let mut chunks = input.chunks_exact(V::LANES);
        for chunk in &mut chunks {
            checker.check(V::load(chunk));
        }
        let rest = chunks.remainder();
        if !rest.is_empty() {
            let mut padded = [0u8; 64];
            padded[..rest.len()].copy_from_slice(rest);
            checker.check(V::load(&padded));
        }
        checker.check_eof();
        !checker.has_error()
    })
}

pub(crate) fn validate_with_errors<V: Vector>(input: &[u8]) -> ConversionResult {
    V::with_features(|| {
        let mut checker = Checker::<V>::new();
        let mut pos = 0;
        while pos + V::LANES <= input.len() {
            checker.check(V::load(&input[pos..]));
            if checker.has_error() {
                return scalar::utf8::rewind_and_validate_with_errors(input, pos);
            }
            pos += V::LANES;
        }
        scalar::utf8::rewind_and_validate_with_errors(input, pos)
    })
}

pub(crate) fn validate_ascii<V: Vector>(input: &[u8]) -> bool {
    validate_ascii_with_errors::<V>(input).is_ok()
}

pub(crate) fn validate_ascii_with_errors<V: Vector>(input: &[u8]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        while pos + V::LANES <= input.len() {
            let high = V::load(&input[pos..]).high_bits();
            if high != 0 {
                let at = pos + high.trailing_zeros() as usize;
                return Err(ConversionError::new(ErrorKind::TooLarge, at));
            }
            pos += V::LANES;
        }
        scalar::ascii::validate_with_errors(&input[pos..]).map(|_| input.len()).map_err(|e| e.offset(pos))
    })
}

pub(crate) fn count<V: Vector>(input: &[u8]) -> usize {
    V::with_features(|| {
        let mut chunks = input.chunks_exact(V::LANES);
        let mut total = 0;
        for chunk in &mut chunks {
            let continuations = V::load(chunk).shr4().lookup16(&CONTINUATION).high_bits();
            total += V::LANES - continuations.count_ones() as usize;
        }
        total + scalar::utf8::count(chunks.remainder())
    })
}

pub(crate) fn utf16_length<V: Vector>(input: &[u8]) -> usize {
    V::with_features(|| {
        let mut chunks = input.chunks_exact(V::LANES);
        let mut total = 0;
        for chunk in &mut chunks {
            let nibbles = V::load(chunk).shr4();
            let continuations = nibbles.lookup16(&CONTINUATION).high_bits();
            let four_byte_leads = nibbles.lookup16(&FOUR_BYTE_LEAD).high_bits();
            total += V::LANES - continuations.count_ones() as usize + four_byte_leads.count_ones() as usize;
        }
        total + scalar::utf8::utf16_length(chunks.remainder())
    })
}

pub(crate) fn convert_to_utf16<V: Vector>(input: &[u8], output: &mut [u16], endian: Endianness) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            let v = V::load(chunk);
            if v.is_ascii() {
                for (dst, &b) in output[written..written + V::LANES].iter_mut().zip(chunk) {
                    *dst = endian.u16_from_native(b as u16);
                }
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            if !chunk_is_valid(v) {
                break;
            }
            let complete = scalar::utf8::trim_partial(chunk);
            written += scalar::utf8::convert_valid_to_utf16(&chunk[..complete], &mut output[written..], endian);
            pos += complete;
        }
        scalar::utf8::convert_to_utf16(&input[pos..], &mut output[written..], endian)
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `utf16_length(input)`.
pub(crate) fn convert_valid_to_utf16<V: Vector>(input: &[u8], output: &mut [u16], endian: Endianness) -> usize {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() {
            let chunk = &input[pos..pos + V::LANES];
            if V::load(chunk).is_ascii() {
                for (dst, &b) in output[written..written + V::LANES].iter_mut().zip(chunk) {
                    *dst = endian.u16_from_native(b as u16);
                }
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            let complete = scalar::utf8::trim_partial(chunk);
            written += scalar::utf8::convert_valid_to_utf16(&chunk[..complete], &mut output[written..], endian);
            pos += complete;
        }
        written + scalar::utf8::convert_valid_to_utf16(&input[pos..], &mut output[written..], endian)
    })
}

pub(crate) fn convert_to_utf32<V: Vector>(input: &[u8], output: &mut [u32]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            let v = V::load(chunk);
            if v.is_ascii() {
                for (dst, &b) in output[written..written + V::LANES].iter_mut().zip(chunk) {
                    *dst = b as u32;
                }
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            if !chunk_is_valid(v) {
                break;
            }
            let complete = scalar::utf8::trim_partial(chunk);
            written += scalar::utf8::convert_valid_to_utf32(&chunk[..complete], &mut output[written..]);
            pos += complete;
        }
        scalar::utf8::convert_to_utf32(&input[pos..], &mut output[written..])
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `count(input)`.
pub(crate) fn convert_valid_to_utf32<V: Vector>(input: &[u8], output: &mut [u32]) -> usize {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() {
            let chunk = &input[pos..pos + V::LANES];
            if V::load(chunk).is_ascii() {
                for (dst, &b) in output[written..written + V::LANES].iter_mut().zip(chunk) {
                    *dst = b as u32;
                }
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            let complete = scalar::utf8::trim_partial(chunk);
            written += scalar::utf8::convert_valid_to_utf32(&chunk[..complete], &mut output[written..]);
            pos += complete;
        }
        written + scalar::utf8::convert_valid_to_utf32(&input[pos..], &mut output[written..])
    })
}

pub(crate) fn convert_to_latin1<V: Vector>(input: &[u8], output: &mut [u8]) -> ConversionResult {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() && written + V::LANES <= output.len() {
            let chunk = &input[pos..pos + V::LANES];
            let v = V::load(chunk);
            if v.is_ascii() {
                output[written..written + V::LANES].copy_from_slice(chunk);
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            if !chunk_is_valid(v) {
                break;
            }
            let complete = scalar::utf8::trim_partial(chunk);
            match scalar::utf8::convert_to_latin1(&chunk[..complete], &mut output[written..]) {
                Ok(n) => written += n,
                Err(_) => break,
            }
            pos += complete;
        }
        scalar::utf8::convert_to_latin1(&input[pos..], &mut output[written..])
            .map(|n| written + n)
            .map_err(|e| e.offset(pos))
    })
}

/// # Panics
/// If `output` is shorter than `count(input)`.
pub(crate) fn convert_valid_to_latin1<V: Vector>(input: &[u8], output: &mut [u8]) -> usize {
    V::with_features(|| {
        let mut pos = 0;
        let mut written = 0;
        while pos + V::LANES <= input.len() {
            let chunk = &input[pos..pos + V::LANES];
            if V::load(chunk).is_ascii() {
                output[written..written + V::LANES].copy_from_slice(chunk);
                pos += V::LANES;
                written += V::LANES;
                continue;
            }
            let complete = scalar::utf8::trim_partial(chunk);
            written += scalar::utf8::convert_valid_to_latin1(&chunk[..complete], &mut output[written..]);
            pos += complete;
        }
        written + scalar::utf8::convert_valid_to_latin1(&input[pos..], &mut output[written..])
    })
}
