//! Word transform applied to the decompressed archive payload.
//!
//! The payload is treated as a run of little-endian `u32` words. Decrypting a
//! word rotates it left by 5 and subtracts [`WORD_KEY`]; a trailing 1-3 byte
//! remainder is passed through untouched.

pub const WORD_KEY: u32 = 0x3939_3939;
const ROTATION: u32 = 5;

pub fn decrypt_word(word: u32) -> u32 {
    word.rotate_left(ROTATION).wrapping_sub(WORD_KEY)
}

pub fn encrypt_word(plain: u32) -> u32 {
    plain.wrapping_add(WORD_KEY).rotate_right(ROTATION)
}

/// Decrypts `data`, returning a buffer of the same length.
pub fn decrypt(data: &[u8]) -> Vec<u8> {
    map_words(data, decrypt_word)
}

/// Inverse of [`decrypt`].
pub fn encrypt(data: &[u8]) -> Vec<u8> {
    map_words(data, encrypt_word)
}

fn map_words(data: &[u8], f: fn(u32) -> u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut words = data.chunks_exact(4);
    for w in &mut words {
        let word = u32::from_le_bytes([w[0], w[1], w[2], w[3]]);
        out.extend_from_slice(&f(word).to_le_bytes());
    }
    out.extend_from_slice(words.remainder());
    out
}
