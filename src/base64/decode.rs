//! Base64 decoding state machine

use super::tables::{INVALID, SPACE};
use super::{Base64Blocks, Base64Options, LastChunkHandling, Unit};
use crate::core::error::{ErrorKind, FullResult};

/// Input with trailing whitespace and padding located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Trimmed {
    /// Number of `=` found at the end, 0 to 2.
    equal_signs: usize,
    /// Offset of the first of those `=`, or `len` if none.
    equal_location: usize,
    /// Length of the data before padding and trailing whitespace.
    len: usize,
    /// Length counted as consumed by a complete decode.
    full_len: usize,
}

/// Table code of `unit`; anything wider than a byte is invalid.
#[inline(always)]
fn code<T: Unit>(table: &[u8; 256], unit: T) -> u8 {
    unit.byte().map_or(INVALID, |b| table[b as usize])
}

#[inline(always)]
fn is_equal_sign<T: Unit>(unit: T) -> bool {
    unit.byte() == Some(b'=')
}

/// Whitespace always; anything outside the alphabet in garbage mode.
fn is_ignorable<T: Unit>(unit: T, options: Base64Options) -> bool {
    let code = code(options.alphabet().decode_table(), unit);
    code == SPACE || (code > 63 && options.accepts_garbage())
}

/// The next 16 units as bytes, if none is wider than a byte.
#[inline(always)]
fn narrow_block<T: Unit>(units: &[T]) -> Option<[u8; 16]> {
    let mut block = [0u8; 16];
    for (b, &unit) in block.iter_mut().zip(units) {
        *b = unit.byte()?;
    }
    Some(block)
}

fn find_end<T: Unit>(input: &[T], options: Base64Options) -> Trimmed {
    let table = options.alphabet().decode_table();
    let full_len = input.len();

    if options.accepts_garbage() {
        // Everything from the first '=' on is ignored.
        return match input.iter().position(|&u| is_equal_sign(u)) {
            Some(at) => Trimmed {
                equal_signs: 1,
                equal_location: at,
                len: at,
                full_len: at + 1,
            },
            None => Trimmed {
                equal_signs: 0,
                equal_location: full_len,
                len: full_len,
                full_len,
            },
        };
    }

    let is_space = |u: T| code(table, u) == SPACE;
    let mut len = full_len;
    while len > 0 && is_space(input[len - 1]) {
        len -= 1;
    }
    let mut equal_location = len;
    let mut equal_signs = 0;
    if len > 0 && is_equal_sign(input[len - 1]) {
        len -= 1;
        equal_location = len;
        equal_signs = 1;
        while len > 0 && is_space(input[len - 1]) {
            len -= 1;
        }
        if len > 0 && is_equal_sign(input[len - 1]) {
            len -= 1;
            equal_location = len;
            equal_signs = 2;
        }
    }
    Trimmed {
        equal_signs,
        equal_location,
        len,
        full_len,
    }
}

#[inline]
fn write_triple(output: &mut [u8], at: usize, triple: u32, count: usize) {
    let bytes = [(triple >> 16) as u8, (triple >> 8) as u8, triple as u8];
    output[at..at + count].copy_from_slice(&bytes[..count]);
}

/// Decodes `input` (padding already removed) group by group.
///
/// Errors report the scan position; a group that does not fit reports the
/// start of that group.
fn tail_decode<B: Base64Blocks, T: Unit>(
    output: &mut [u8],
    input: &[T],
    padding: usize,
    options: Base64Options,
    last_chunk: LastChunkHandling,
    check_capacity: bool,
) -> FullResult {
    let alphabet = options.alphabet();
    let table = alphabet.decode_table();
    let garbage = options.accepts_garbage();
    let mut s = 0;
    let mut d = 0;

    loop {
        if B::ENABLED {
            while s + 16 <= input.len() && d + 12 <= output.len() {
                let Some(block) = narrow_block(&input[s..s + 16]) else {
                    break;
                };
                let Ok(out) = <&mut [u8; 12]>::try_from(&mut output[d..d + 12]) else {
                    break;
                };
                if !B::decode_block(&block, out, alphabet) {
                    break;
                }
                s += 16;
                d += 12;
            }
        }

        while s + 4 <= input.len() {
            let v = [
                code(table, input[s]),
                code(table, input[s + 1]),
                code(table, input[s + 2]),
                code(table, input[s + 3]),
            ];
            if v.iter().any(|&c| c > 63) {
                break;
            }
            if check_capacity && output.len() - d < 3 {
                return FullResult::new(ErrorKind::OutputBufferTooSmall, s, d);
            }
            let triple = (v[0] as u32) << 18 | (v[1] as u32) << 12 | (v[2] as u32) << 6 | v[3] as u32;
            write_triple(output, d, triple, 3);
            s += 4;
            d += 3;
        }

        let group_start = s;
        let mut buffer = [0u8; 4];
        let mut idx = 0;
        while idx < 4 && s < input.len() {
            let c = code(table, input[s]);
            if c <= 63 {
                buffer[idx] = c;
                idx += 1;
            } else if !garbage && c != SPACE {
                return FullResult::new(ErrorKind::InvalidBase64Character, s, d);
            }
            s += 1;
        }

        let triple = (buffer[0] as u32) << 18
            | (buffer[1] as u32) << 12
            | (buffer[2] as u32) << 6
            | buffer[3] as u32;

        if idx != 4 {
            if !garbage && idx + padding > 4 {
                return FullResult::padding(ErrorKind::InvalidBase64Character, s, d);
            }
            // Padding, when present, must complete the group.
            if !garbage
                && last_chunk == LastChunkHandling::Loose
                && idx >= 2
                && padding > 0
                && (idx + padding) & 3 != 0
            {
                return FullResult::padding(ErrorKind::InvalidBase64Character, s, d);
            }
            if !garbage
                && last_chunk == LastChunkHandling::Strict
                && idx >= 2
                && (idx + padding) & 3 != 0
            {
                return FullResult::padding(ErrorKind::Base64InputRemainder, s, d);
            }
            let stop = match last_chunk {
                LastChunkHandling::StopBeforePartial => {
                    padding + idx < 4 && idx != 0 && (idx >= 2 || padding == 0)
                }
                LastChunkHandling::OnlyFullChunks => idx >= 2 || padding == 0,
                _ => false,
            };
            if stop {
                return FullResult::new(ErrorKind::Success, group_start, d);
            }
            let strict = !garbage && last_chunk == LastChunkHandling::Strict;
            match idx {
                2 => {
                    if strict && triple & 0xFFFF != 0 {
                        return FullResult::new(ErrorKind::Base64ExtraBits, s, d);
                    }
                    if check_capacity && output.len() - d < 1 {
                        return FullResult::new(ErrorKind::OutputBufferTooSmall, group_start, d);
                    }
                    write_triple(output, d, triple, 1);
                    d += 1;
                }
                3 => {
                    if strict && triple & 0xFF != 0 {
                        return FullResult::new(ErrorKind::Base64ExtraBits, s, d);
                    }
                    if check_capacity && output.len() - d < 2 {
                        return FullResult::new(ErrorKind::OutputBufferTooSmall, group_start, d);
                    }
                    write_triple(output, d, triple, 2);
                    d += 2;
                }
                1 if !garbage && (!last_chunk.is_partial() || padding > 0) => {
                    return FullResult::new(ErrorKind::Base64InputRemainder, s, d);
                }
                0 if !garbage && padding > 0 => {
                    return FullResult::padding(ErrorKind::InvalidBase64Character, s, d);
                }
                _ => {}
            }
            return FullResult::new(ErrorKind::Success, s, d);
        }

        if check_capacity && output.len() - d < 3 {
            return FullResult::new(ErrorKind::OutputBufferTooSmall, group_start, d);
        }
        write_triple(output, d, triple, 3);
        d += 3;
    }
}

/// Full decode: locate padding, run the group machine, then apply the
/// end-of-input rules.
pub(crate) fn decode<B: Base64Blocks, T: Unit>(
    input: &[T],
    output: &mut [u8],
    options: Base64Options,
    last_chunk: LastChunkHandling,
    check_capacity: bool,
) -> FullResult {
    let garbage = options.accepts_garbage();
    let trimmed = find_end(input, options);

    if trimmed.len == 0 {
        if !garbage && trimmed.equal_signs > 0 {
            return FullResult::new(ErrorKind::InvalidBase64Character, trimmed.equal_location, 0);
        }
        return FullResult::new(ErrorKind::Success, trimmed.full_len, 0);
    }

    let mut r = tail_decode::<B, T>(
        output,
        &input[..trimmed.len],
        trimmed.equal_signs,
        options,
        last_chunk,
        check_capacity,
    );

    if r.padding_error {
        r.input_count = trimmed.equal_location;
    }
    if r.is_ok() && (!last_chunk.is_partial() || r.output_count % 3 != 0) {
        r.input_count = trimmed.full_len;
    }

    // Padding must exactly complete the final group.
    if !last_chunk.is_partial() && r.is_ok() && trimmed.equal_signs > 0 && !garbage {
        let rem = r.output_count % 3;
        if rem == 0 || rem + 1 + trimmed.equal_signs != 4 {
            return FullResult::new(
                ErrorKind::InvalidBase64Character,
                trimmed.equal_location,
                r.output_count,
            );
        }
    }

    // A partial decode ends at end of input or right after a data character.
    if last_chunk.is_partial() && r.is_ok() && r.input_count < trimmed.full_len {
        while r.input_count < trimmed.full_len && is_ignorable(input[r.input_count], options) {
            r.input_count += 1;
        }
        if r.input_count < trimmed.full_len {
            while r.input_count > 0 && is_ignorable(input[r.input_count - 1], options) {
                r.input_count -= 1;
            }
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64::NoBlocks;

    fn run(input: &str, options: Base64Options, last: LastChunkHandling) -> (FullResult, Vec<u8>) {
        let mut out = vec![0u8; input.len()];
        let r = decode::<NoBlocks, _>(input.as_bytes(), &mut out, options, last, true);
        out.truncate(r.output_count);
        (r, out)
    }

    fn loose(input: &str) -> (FullResult, Vec<u8>) {
        run(input, Base64Options::Default, LastChunkHandling::Loose)
    }

    #[test]
    fn test_find_end() {
        let t = find_end(b"QQ== \n", Base64Options::Default);
        assert_eq!(t.equal_signs, 2);
        assert_eq!(t.equal_location, 2);
        assert_eq!(t.len, 2);
        assert_eq!(t.full_len, 6);

        let t = find_end(b"QQ= =", Base64Options::Default);
        assert_eq!(t.equal_signs, 2);
        assert_eq!(t.equal_location, 2);

        let t = find_end(b"QQ=!=zz", Base64Options::DefaultAcceptGarbage);
        assert_eq!(t.equal_signs, 1);
        assert_eq!(t.len, 2);
        assert_eq!(t.full_len, 3);
    }

    #[test]
    fn test_basic() {
        assert_eq!(loose("Zm9vYmFy"), (FullResult::new(ErrorKind::Success, 8, 6), b"foobar".to_vec()));
        assert_eq!(loose("Zm9vYg==").1, b"foob");
        assert_eq!(loose("Zm9vYmE=").1, b"fooba");
        assert_eq!(loose("Zm9v\nYm Fy\r\n").1, b"foobar");
        assert_eq!(loose("").0, FullResult::new(ErrorKind::Success, 0, 0));
        assert_eq!(loose("  \n").0, FullResult::new(ErrorKind::Success, 3, 0));
    }

    #[test]
    fn test_loose_accepts_missing_padding() {
        let (r, out) = loose("Zm9vYg");
        assert_eq!(r, FullResult::new(ErrorKind::Success, 6, 4));
        assert_eq!(out, b"foob");
    }

    #[test]
    fn test_invalid_characters() {
        let (r, _) = loose("Zm9v!mFy");
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 4);

        // '=' in the middle is not data
        let (r, _) = loose("Zm=vYmFy");
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 2);

        let (r, _) = loose("Zm9v-_");
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 4);
    }

    #[test]
    fn test_padding_errors() {
        // one '=' after two characters
        let (r, _) = loose("Zm9vYg=");
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 6);
        assert!(r.padding_error);

        // padding after a full group
        let (r, _) = loose("Zm9v==");
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 4);

        // only padding
        let (r, _) = loose("==");
        assert_eq!(r, FullResult::new(ErrorKind::InvalidBase64Character, 0, 0));

        // too much padding for the group
        let (r, _) = loose("Zm9vYmE==");
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 7);
    }

    #[test]
    fn test_single_leftover_character() {
        let (r, _) = loose("Zm9vY");
        assert_eq!(r.error, ErrorKind::Base64InputRemainder);
        assert_eq!(r.input_count, 5);
        assert_eq!(r.output_count, 3);
    }

    #[test]
    fn test_strict() {
        let strict = |s: &str| run(s, Base64Options::Default, LastChunkHandling::Strict);

        assert_eq!(strict("Zm9vYg==").1, b"foob");
        let (r, _) = strict("Zm9vYg");
        assert_eq!(r.error, ErrorKind::Base64InputRemainder);
        assert!(r.padding_error);

        // "Zh==" leaves non-zero bits in the discarded part
        let (r, _) = strict("Zh==");
        assert_eq!(r.error, ErrorKind::Base64ExtraBits);
        let (r, out) = loose("Zh==");
        assert!(r.is_ok());
        assert_eq!(out, b"f");

        let (r, _) = strict("Zm9=");
        assert_eq!(r.error, ErrorKind::Base64ExtraBits);
        assert!(strict("Zm8=").0.is_ok());
    }

    #[test]
    fn test_stop_before_partial() {
        let partial = |s: &str| run(s, Base64Options::Default, LastChunkHandling::StopBeforePartial);

        let (r, out) = partial("Zm9vYmFyYg");
        assert_eq!(r, FullResult::new(ErrorKind::Success, 8, 6));
        assert_eq!(out, b"foobar");

        // trailing whitespace before the partial group is not consumed
        let (r, _) = partial("Zm9v YmFy Yg");
        assert_eq!(r.input_count, 9);
        assert_eq!(r.output_count, 6);

        // complete padded input decodes fully
        let (r, out) = partial("Zm9vYg==");
        assert_eq!(r, FullResult::new(ErrorKind::Success, 8, 4));
        assert_eq!(out, b"foob");

        // trailing whitespace after complete data is consumed
        let (r, _) = partial("Zm9v  ");
        assert_eq!(r, FullResult::new(ErrorKind::Success, 6, 3));
    }

    #[test]
    fn test_only_full_chunks() {
        let full = |s: &str| run(s, Base64Options::Default, LastChunkHandling::OnlyFullChunks);

        let (r, out) = full("Zm9vYg==");
        assert_eq!(r, FullResult::new(ErrorKind::Success, 4, 3));
        assert_eq!(out, b"foo");

        let (r, _) = full("Zm9vYmFy");
        assert_eq!(r, FullResult::new(ErrorKind::Success, 8, 6));
    }

    #[test]
    fn test_garbage_mode() {
        let (r, out) = run("Zm9v!!Ym*Fy", Base64Options::DefaultAcceptGarbage, LastChunkHandling::Loose);
        assert!(r.is_ok());
        assert_eq!(out, b"foobar");

        // decoding stops at the first '='
        let (r, out) = run("Zm9vYg==Zm9v", Base64Options::DefaultAcceptGarbage, LastChunkHandling::Loose);
        assert!(r.is_ok());
        assert_eq!(r.input_count, 7);
        assert_eq!(out, b"foob");
    }

    #[test]
    fn test_url_and_mixed_alphabets() {
        let (r, out) = run("-_-_", Base64Options::Url, LastChunkHandling::Loose);
        assert!(r.is_ok());
        assert_eq!(out, [0xFB, 0xFF, 0xBF]);

        let (r, _) = run("+/+/", Base64Options::Url, LastChunkHandling::Loose);
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);

        let (r, out) = run("-/+_", Base64Options::DefaultOrUrl, LastChunkHandling::Loose);
        assert!(r.is_ok());
        assert_eq!(out, [0xFB, 0xFF, 0xBF]);
    }

    #[test]
    fn test_output_capacity() {
        let mut out = [0u8; 4];
        let r = decode::<NoBlocks, _>(b"Zm9vYmFy", &mut out, Base64Options::Default, LastChunkHandling::Loose, true);
        assert_eq!(r, FullResult::new(ErrorKind::OutputBufferTooSmall, 4, 3));
        assert_eq!(&out[..3], b"foo");

        let mut out = [0u8; 3];
        let r = decode::<NoBlocks, _>(b"Zm9vYg==", &mut out, Base64Options::Default, LastChunkHandling::Loose, true);
        assert_eq!(r.error, ErrorKind::OutputBufferTooSmall);
        assert_eq!(r.input_count, 4);
        assert_eq!(r.output_count, 3);
    }

    #[test]
    fn test_block_path_agrees() {
        struct TableBlocks;
        impl Base64Blocks for TableBlocks {}

        let inputs = [
            "U29tZSBsb25nZXIgdGV4dCB0aGF0IHNwYW5zIHNldmVyYWwgYmxvY2tz",
            "U29tZSBsb25nZXIgdGV4dCB0aG\nF0IHNwYW5zIHNldmVyYWwgYmxvY2tzLg==",
            "U29tZSBsb25nZXIgdGV4dCB0aGF0IHNw!W5zIHNldmVyYWwgYmxvY2tz",
        ];
        for input in inputs {
            for last in LastChunkHandling::ALL {
                let mut a = vec![0u8; input.len()];
                let mut b = vec![0u8; input.len()];
                let ra = decode::<NoBlocks, _>(input.as_bytes(), &mut a, Base64Options::Default, last, true);
                let rb = decode::<TableBlocks, _>(input.as_bytes(), &mut b, Base64Options::Default, last, true);
                assert_eq!(ra, rb, "{input:?} {last}");
                assert_eq!(a[..ra.output_count], b[..rb.output_count]);
            }
        }
    }

    fn wide(input: &str) -> Vec<u16> {
        input.encode_utf16().collect()
    }

    #[test]
    fn test_utf16_units_match_bytes() {
        struct TableBlocks;
        impl Base64Blocks for TableBlocks {}

        let inputs = [
            "Zm9vYmFy",
            "Zm9vYg==",
            "Zm9v\nYm Fy\r\n",
            "Zm9vY",
            "Zm9vYg=",
            "Zh==",
            "Zm9v!!Ym*Fy",
            "Zm9vYg==Zm9v",
            "U29tZSBsb25nZXIgdGV4dCB0aG\nF0IHNwYW5zIHNldmVyYWwgYmxvY2tzLg==",
        ];
        for input in inputs {
            for options in Base64Options::ALL {
                for last in LastChunkHandling::ALL {
                    let mut a = vec![0u8; input.len()];
                    let mut b = vec![0u8; input.len()];
                    let ra = decode::<NoBlocks, _>(input.as_bytes(), &mut a, options, last, true);
                    let rb = decode::<TableBlocks, _>(&wide(input), &mut b, options, last, true);
                    assert_eq!(ra, rb, "{input:?} {options} {last}");
                    assert_eq!(a[..ra.output_count], b[..rb.output_count]);
                }
            }
        }
    }

    #[test]
    fn test_wide_unit_is_not_a_character() {
        // U+0141 shares its low byte with 'A'
        let mut input = wide("Zm9vYmFyZm9vYmFyZm9vYmFy");
        input[9] = 0x0141;
        let mut out = vec![0u8; input.len()];
        let r = decode::<NoBlocks, _>(&input, &mut out, Base64Options::Default, LastChunkHandling::Loose, true);
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 9);

        let r = decode::<NoBlocks, _>(
            &input,
            &mut out,
            Base64Options::DefaultAcceptGarbage,
            LastChunkHandling::Loose,
            true,
        );
        assert!(r.is_ok());
        let expected = run("Zm9vYmFyZ9vYmFyZm9vYmFy", Base64Options::Default, LastChunkHandling::Loose).1;
        assert_eq!(out[..r.output_count], expected[..]);

        // a wide '=' look-alike does not count as padding
        let mut padded = wide("Zm9vYmE=");
        padded[7] = 0x013D;
        let r = decode::<NoBlocks, _>(&padded, &mut out, Base64Options::Default, LastChunkHandling::Loose, true);
        assert_eq!(r.error, ErrorKind::InvalidBase64Character);
        assert_eq!(r.input_count, 7);
    }
}
