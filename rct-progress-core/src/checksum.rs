/// Added to the folded accumulator once every byte has been consumed.
pub const CHECKSUM_SALT: u32 = 120_001;

/// Computes the trailing checksum for a compressed archive body.
///
/// Each byte is added into the low 8 bits of the accumulator (the upper 24
/// bits are left alone), then the whole word is rotated left by 3.
pub fn checksum(body: &[u8]) -> u32 {
    let acc = body.iter().fold(0u32, |acc, &b| {
        let low = (acc as u8).wrapping_add(b);
        ((acc & 0xFFFF_FF00) | u32::from(low)).rotate_left(3)
    });
    acc.wrapping_add(CHECKSUM_SALT)
}

/// Returns whether `expected` matches the checksum of `body`, along with the
/// calculated value so callers can report both.
pub fn verify(body: &[u8], expected: u32) -> (bool, u32) {
    let calculated = checksum(body);
    (calculated == expected, calculated)
}
