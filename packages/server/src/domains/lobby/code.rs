//! Six-digit join codes.

use rand::Rng;

pub const CODE_LENGTH: usize = 6;

/// Attempts at finding an unused code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 10;

/// Uniformly random code, zero-padded (`"004217"`).
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:06}", rng.gen_range(0..1_000_000u32))
}

/// Exactly six ASCII digits.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
