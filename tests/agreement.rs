//! Every supported backend must answer exactly like the scalar fallback.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use utf_d::{Base64Options, Codec, Endianness, LastChunkHandling, available_implementations, implementation_by_name};

fn backends() -> Vec<&'static dyn Codec> {
    available_implementations()
        .filter(|d| d.is_supported())
        .filter_map(|d| implementation_by_name(d.name))
        .collect()
}

fn fallback() -> &'static dyn Codec {
    implementation_by_name("fallback").unwrap()
}

/// Mostly valid text with a sprinkling of damage.
fn sample_utf8(rng: &mut StdRng) -> Vec<u8> {
    const PIECES: [&str; 6] = ["plain ascii ", "é", "€", "😀", "世界", "\u{10FFFF}"];
    let mut bytes = Vec::new();
    let len = rng.random_range(0..200);
    while bytes.len() < len {
        bytes.extend_from_slice(PIECES[rng.random_range(0..PIECES.len())].as_bytes());
    }
    if rng.random_range(0..3) == 0 && !bytes.is_empty() {
        let at = rng.random_range(0..bytes.len());
        bytes[at] = rng.random();
    }
    bytes
}

fn sample_utf16(rng: &mut StdRng) -> Vec<u16> {
    let len = rng.random_range(0..150);
    (0..len)
        .map(|_| match rng.random_range(0..10) {
            0 => rng.random_range(0xD800..0xE000),
            1..=3 => rng.random_range(0x80..0xD800),
            _ => rng.random_range(0..0x80),
        })
        .collect()
}

#[test]
fn test_validation_agrees() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let reference = fallback();
    for _ in 0..500 {
        let utf8 = sample_utf8(&mut rng);
        let utf16 = sample_utf16(&mut rng);
        for codec in backends() {
            assert_eq!(
                codec.validate_utf8_with_errors(&utf8),
                reference.validate_utf8_with_errors(&utf8),
                "{} on {utf8:02x?}",
                codec.name()
            );
            assert_eq!(
                codec.validate_utf16_with_errors(&utf16, Endianness::NATIVE),
                reference.validate_utf16_with_errors(&utf16, Endianness::NATIVE),
                "{} on {utf16:04x?}",
                codec.name()
            );
        }
    }
}

#[test]
fn test_conversion_agrees() {
    let mut rng = StdRng::seed_from_u64(42);
    let reference = fallback();
    for _ in 0..300 {
        let utf8 = sample_utf8(&mut rng);
        let mut expected = vec![0u16; utf8.len()];
        let want = reference.convert_utf8_to_utf16(&utf8, &mut expected, Endianness::Big);

        let utf16 = sample_utf16(&mut rng);
        let mut expected8 = vec![0u8; utf16.len() * 3];
        let want8 = reference.convert_utf16_to_utf8(&utf16, &mut expected8, Endianness::Little);

        for codec in backends() {
            let mut out = vec![0u16; utf8.len()];
            let got = codec.convert_utf8_to_utf16(&utf8, &mut out, Endianness::Big);
            assert_eq!(got, want, "{}", codec.name());
            if let Ok(n) = got {
                assert_eq!(out[..n], expected[..n], "{}", codec.name());
            }

            let mut out8 = vec![0u8; utf16.len() * 3];
            let got8 = codec.convert_utf16_to_utf8(&utf16, &mut out8, Endianness::Little);
            assert_eq!(got8, want8, "{}", codec.name());
            if let Ok(n) = got8 {
                assert_eq!(out8[..n], expected8[..n], "{}", codec.name());
            }
        }
    }
}

#[test]
fn test_sequences_straddling_blocks() {
    let reference = fallback();
    for seq in ["é", "€", "😀"] {
        for at in 0..70 {
            let mut text = vec![b'a'; at];
            text.extend_from_slice(seq.as_bytes());
            text.extend_from_slice(&[b'b'; 70]);
            for cut in [None, Some(1)] {
                // dropping the last byte of the sequence leaves it truncated mid-block
                let mut input = text.clone();
                if let Some(n) = cut {
                    input.remove(at + seq.len() - n);
                }
                let mut expected = vec![0u16; input.len()];
                let want = reference.convert_utf8_to_utf16(&input, &mut expected, Endianness::Little);
                for codec in backends() {
                    assert_eq!(codec.validate_utf8_with_errors(&input), reference.validate_utf8_with_errors(&input));
                    let mut out = vec![0u16; input.len()];
                    let got = codec.convert_utf8_to_utf16(&input, &mut out, Endianness::Little);
                    assert_eq!(got, want, "{} {seq} at {at}", codec.name());
                    if got.is_ok() {
                        assert_eq!(out, expected, "{} {seq} at {at}", codec.name());
                    }
                }
            }
        }
    }
}

#[test]
fn test_base64_agrees() {
    let mut rng = StdRng::seed_from_u64(7);
    let reference = fallback();
    for _ in 0..200 {
        let len = rng.random_range(0..300);
        let data: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        for options in [Base64Options::Default, Base64Options::Url] {
            let mut expected = vec![0u8; utf_d::base64_length_from_binary(len, options)];
            reference.binary_to_base64(&data, &mut expected, options);

            for codec in backends() {
                let mut encoded = vec![0u8; expected.len()];
                codec.binary_to_base64(&data, &mut encoded, options);
                assert_eq!(encoded, expected, "{} {options}", codec.name());

                let mut decoded = vec![0u8; utf_d::maximal_binary_length_from_base64(&encoded)];
                let result = codec.base64_to_binary(&encoded, &mut decoded, options, LastChunkHandling::Loose);
                assert!(result.is_ok(), "{} {options}: {result:?}", codec.name());
                assert_eq!(decoded[..result.output_count], data[..]);
            }
        }

        // damage one character and compare the reported failure
        if len > 0 {
            let mut encoded = vec![0u8; utf_d::base64_length_from_binary(len, Base64Options::Default)];
            reference.binary_to_base64(&data, &mut encoded, Base64Options::Default);
            let at = rng.random_range(0..encoded.len());
            encoded[at] = b'*';
            let mut scratch = vec![0u8; utf_d::maximal_binary_length_from_base64(&encoded)];
            let want = reference.base64_to_binary(&encoded, &mut scratch, Base64Options::Default, LastChunkHandling::Loose);
            for codec in backends() {
                let got = codec.base64_to_binary(&encoded, &mut scratch, Base64Options::Default, LastChunkHandling::Loose);
                assert_eq!(got, want, "{}", codec.name());
            }

            // the same text as UTF-16, with the damage widened past a byte
            let mut wide: Vec<u16> = encoded.iter().map(|&b| b as u16).collect();
            wide[at] = 0x0100 | encoded[(at + 1) % encoded.len()] as u16;
            let mut scratch = vec![0u8; utf_d::maximal_binary_length_from_base64_utf16(&wide)];
            for codec in backends() {
                let got = codec.base64_to_binary_utf16(&wide, &mut scratch, Base64Options::Default, LastChunkHandling::Loose);
                assert_eq!(got.error, want.error, "{}", codec.name());
                assert_eq!(got.input_count, want.input_count, "{}", codec.name());
            }
        }
    }
}
