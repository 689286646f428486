//! SSSE3 Base64 kernels: 12 bytes to 16 characters and back.
//!
//! Based on the algorithms from https://github.com/aklomp/base64 and
//! Muła/Lemire, "Faster Base64 Encoding and Decoding using AVX2 Instructions".

use std::arch::x86_64::*;

/// Encodes the first 12 bytes of `input` into 16 characters.
#[target_feature(enable = "ssse3")]
pub(super) unsafe fn encode_block(input: &[u8; 16], output: &mut [u8; 16], url: bool) {
    unsafe {
        let bytes = _mm_loadu_si128(input.as_ptr() as *const __m128i);
        let encoded = translate(reshuffle(bytes), url);
        _mm_storeu_si128(output.as_mut_ptr() as *mut __m128i, encoded);
    }
}

/// Decodes 16 standard-alphabet characters; false if any is outside it.
#[target_feature(enable = "ssse3")]
pub(super) unsafe fn decode_block_standard(input: &[u8; 16], output: &mut [u8; 12]) -> bool {
    unsafe {
        let chars = _mm_loadu_si128(input.as_ptr() as *const __m128i);
        if !validate(chars) {
            return false;
        }
        let packed = reshuffle_decode(translate_decode(chars));
        let mut buf = [0u8; 16];
        _mm_storeu_si128(buf.as_mut_ptr() as *mut __m128i, packed);
        output.copy_from_slice(&buf[..12]);
        true
    }
}

/// Spreads each 3-byte group over 4 lanes holding one 6-bit index each.
#[target_feature(enable = "ssse3")]
unsafe fn reshuffle(input: __m128i) -> __m128i {
    // For 3 bytes ABC: [AAAAAA] [AABBBB] [BBBBCC] [CCCCCC]
    let shuffled = _mm_shuffle_epi8(
        input,
        _mm_set_epi8(10, 11, 9, 10, 7, 8, 6, 7, 4, 5, 3, 4, 1, 2, 0, 1),
    );

    // Indices 0 and 2 of each group
    let t0 = _mm_and_si128(shuffled, _mm_set1_epi32(0x0FC0FC00_u32 as i32));
    let t1 = _mm_mulhi_epu16(t0, _mm_set1_epi32(0x04000040_u32 as i32));

    // Indices 1 and 3
    let t2 = _mm_and_si128(shuffled, _mm_set1_epi32(0x003F03F0_u32 as i32));
    let t3 = _mm_mullo_epi16(t2, _mm_set1_epi32(0x01000010_u32 as i32));

    _mm_or_si128(t1, t3)
}

/// Maps 6-bit indices to characters by adding a per-range offset.
///
/// - [0..25]  -> 'A'..'Z'  +65
/// - [26..51] -> 'a'..'z'  +71
/// - [52..61] -> '0'..'9'  -4
/// - [62]     -> '+' -19, or '-' -17
/// - [63]     -> '/' -16, or '_' +32
#[target_feature(enable = "ssse3")]
unsafe fn translate(indices: __m128i, url: bool) -> __m128i {
    let lut = if url {
        _mm_setr_epi8(65, 71, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -17, 32, 0, 0)
    } else {
        _mm_setr_epi8(65, 71, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -19, -16, 0, 0)
    };

    let mut lut_indices = _mm_subs_epu8(indices, _mm_set1_epi8(51));
    let mask = _mm_cmpgt_epi8(indices, _mm_set1_epi8(25));
    lut_indices = _mm_sub_epi8(lut_indices, mask);

    _mm_add_epi8(indices, _mm_shuffle_epi8(lut, lut_indices))
}

/// True if every lane is in the standard alphabet. Bytes with the top bit
/// set hit the 0x10 class in both tables.
#[target_feature(enable = "ssse3")]
unsafe fn validate(input: __m128i) -> bool {
    let lut_lo = _mm_setr_epi8(
        0x15, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x13, 0x1A, 0x1B, 0x1B, 0x1B,
        0x1A,
    );
    let lut_hi = _mm_setr_epi8(
        0x10, 0x10, 0x01, 0x02, 0x04, 0x08, 0x04, 0x08, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10,
        0x10,
    );

    let lo_nibbles = _mm_and_si128(input, _mm_set1_epi8(0x0F));
    let hi_nibbles = _mm_and_si128(_mm_srli_epi32::<4>(input), _mm_set1_epi8(0x0F));
    let classes = _mm_and_si128(
        _mm_shuffle_epi8(lut_lo, lo_nibbles),
        _mm_shuffle_epi8(lut_hi, hi_nibbles),
    );

    _mm_movemask_epi8(_mm_cmpeq_epi8(classes, _mm_setzero_si128())) == 0xFFFF
}

/// Characters to 6-bit indices; the roll index is the high nibble, minus
/// one for '/'.
#[target_feature(enable = "ssse3")]
unsafe fn translate_decode(input: __m128i) -> __m128i {
    let lut_roll = _mm_setr_epi8(0, 16, 19, 4, -65, -65, -71, -71, 0, 0, 0, 0, 0, 0, 0, 0);
    let hi_nibbles = _mm_and_si128(_mm_srli_epi32::<4>(input), _mm_set1_epi8(0x0F));
    let eq_2f = _mm_cmpeq_epi8(input, _mm_set1_epi8(0x2F));
    let roll = _mm_shuffle_epi8(lut_roll, _mm_add_epi8(eq_2f, hi_nibbles));
    _mm_add_epi8(input, roll)
}

/// Packs 16 6-bit indices into 12 bytes at the front of the register.
#[target_feature(enable = "ssse3")]
unsafe fn reshuffle_decode(indices: __m128i) -> __m128i {
    let merged = _mm_maddubs_epi16(indices, _mm_set1_epi32(0x01400140u32 as i32));
    let words = _mm_madd_epi16(merged, _mm_set1_epi32(0x00011000u32 as i32));
    _mm_shuffle_epi8(
        words,
        _mm_setr_epi8(2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, -1, -1, -1, -1),
    )
}
