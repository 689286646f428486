//! Base64 encoding

use super::{Base64Blocks, Base64Options, base64_length_from_binary};

/// Encodes `input` into the front of `output`, returning characters written.
///
/// # Panics
/// If `output` is shorter than the encoded length.
pub(crate) fn encode<B: Base64Blocks>(input: &[u8], output: &mut [u8], options: Base64Options) -> usize {
    let needed = base64_length_from_binary(input.len(), options);
    assert!(
        output.len() >= needed,
        "base64 output buffer too small: {} < {needed}",
        output.len()
    );

    let alphabet = options.alphabet();
    let mut i = 0;
    let mut o = 0;

    // Kernels read 16 bytes but consume only 12.
    if B::ENABLED {
        while i + 16 <= input.len() && o + 16 <= output.len() {
            let Ok(block) = <&[u8; 16]>::try_from(&input[i..i + 16]) else {
                break;
            };
            let Ok(out) = <&mut [u8; 16]>::try_from(&mut output[o..o + 16]) else {
                break;
            };
            B::encode_block(block, out, alphabet);
            i += 12;
            o += 16;
        }
    }

    let table = alphabet.encode_table();
    let mut chunks = input[i..].chunks_exact(3);
    for group in &mut chunks {
        let triple = (group[0] as u32) << 16 | (group[1] as u32) << 8 | group[2] as u32;
        output[o] = table[(triple >> 18) as usize & 0x3F];
        output[o + 1] = table[(triple >> 12) as usize & 0x3F];
        output[o + 2] = table[(triple >> 6) as usize & 0x3F];
        output[o + 3] = table[triple as usize & 0x3F];
        o += 4;
    }

    match *chunks.remainder() {
        [a] => {
            output[o] = table[(a >> 2) as usize];
            output[o + 1] = table[((a & 0x03) << 4) as usize];
            o += 2;
            if options.uses_padding() {
                output[o..o + 2].copy_from_slice(b"==");
                o += 2;
            }
        }
        [a, b] => {
            output[o] = table[(a >> 2) as usize];
            output[o + 1] = table[(((a & 0x03) << 4) | (b >> 4)) as usize];
            output[o + 2] = table[((b & 0x0F) << 2) as usize];
            o += 3;
            if options.uses_padding() {
                output[o] = b'=';
                o += 1;
            }
        }
        _ => {}
    }
    o
}

/// Spreads `written` characters at the front of `output` into lines of
/// `line_length`, in place, returning the new length.
pub(crate) fn spread_lines(output: &mut [u8], written: usize, line_length: usize) -> usize {
    if written == 0 {
        return 0;
    }
    let total = written + (written - 1) / line_length;
    for i in (0..written).rev() {
        let dest = i + i / line_length;
        output[dest] = output[i];
        if i > 0 && i % line_length == 0 {
            output[dest - 1] = b'\n';
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64::NoBlocks;

    fn enc(input: &[u8], options: Base64Options) -> String {
        let mut out = vec![0u8; base64_length_from_binary(input.len(), options)];
        let n = encode::<NoBlocks>(input, &mut out, options);
        assert_eq!(n, out.len());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_rfc4648_vectors() {
        let cases = [
            ("", ""),
            ("f", "Zg=="),
            ("fo", "Zm8="),
            ("foo", "Zm9v"),
            ("foob", "Zm9vYg=="),
            ("fooba", "Zm9vYmE="),
            ("foobar", "Zm9vYmFy"),
        ];
        for (plain, encoded) in cases {
            assert_eq!(enc(plain.as_bytes(), Base64Options::Default), encoded);
        }
    }

    #[test]
    fn test_url_without_padding() {
        assert_eq!(enc(&[0xFB, 0xFF], Base64Options::Url), "-_8");
        assert_eq!(enc(&[0xFB, 0xFF], Base64Options::UrlWithPadding), "-_8=");
        assert_eq!(enc(&[0xFB, 0xFF], Base64Options::Default), "+/8=");
        assert_eq!(enc(b"f", Base64Options::DefaultNoPadding), "Zg");
    }

    #[test]
    fn test_block_path_agrees() {
        struct TableBlocks;
        impl Base64Blocks for TableBlocks {}

        let data: Vec<u8> = (0..=255u8).cycle().take(100).collect();
        for len in [0, 11, 12, 15, 16, 17, 28, 40, 100] {
            for options in [Base64Options::Default, Base64Options::Url] {
                let mut block = vec![0u8; base64_length_from_binary(len, options)];
                let n = encode::<TableBlocks>(&data[..len], &mut block, options);
                assert_eq!(n, block.len());
                assert_eq!(String::from_utf8(block).unwrap(), enc(&data[..len], options));
            }
        }
    }

    #[test]
    fn test_spread_lines() {
        let mut buf = *b"abcdefghij\0\0";
        let n = spread_lines(&mut buf, 10, 4);
        assert_eq!(n, 12);
        assert_eq!(&buf, b"abcd\nefgh\nij");

        let mut buf = *b"abcdefgh\0";
        let n = spread_lines(&mut buf, 8, 4);
        assert_eq!(&buf[..n], b"abcd\nefgh");
    }

    #[test]
    #[should_panic(expected = "base64 output buffer too small")]
    fn test_short_output_panics() {
        let mut out = [0u8; 3];
        encode::<NoBlocks>(b"foo", &mut out[..2], Base64Options::Default);
    }
}
