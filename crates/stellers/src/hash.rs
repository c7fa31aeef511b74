//! Deterministic string hashing for sign and angle selection.
//!
//! This is the rolling `h = h * 31 + unit * seed` scheme over UTF-16 code units with 32-bit
//! wrapping arithmetic. It is fixed bit-for-bit: layouts must replay identically across
//! processes, so `std::hash` (randomly keyed) is never used here.

use std::cmp::Ordering;

/// Seed used by the local phase diffusion pass.
pub const PHASE_DIFFUSION_SEED: i32 = 7919;

/// Rolling hash with a per-unit multiplier.
pub fn hash_str_seeded(s: &str, seed: i32) -> i32 {
    let mut h: i32 = 0;
    for unit in s.encode_utf16() {
        h = h
            .wrapping_shl(5)
            .wrapping_sub(h)
            .wrapping_add((unit as i32).wrapping_mul(seed));
    }
    h
}

pub fn hash_str(s: &str) -> i32 {
    hash_str_seeded(s, 1)
}

/// Maps a hash onto `[0, 1)` in steps of `1/1000`.
pub fn unit_fraction(h: i32) -> f64 {
    ((h as i64).abs() % 1000) as f64 / 1000.0
}

/// Orders ids by UTF-16 code units, which differs from `str`'s byte order once ids mix
/// supplementary-plane characters with `U+E000..=U+FFFF`.
pub fn cmp_utf16(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Canonical `lo:hi` key for an unordered node pair, in [`cmp_utf16`] order.
pub fn pair_key(a: &str, b: &str) -> String {
    if cmp_utf16(a, b) == Ordering::Less {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}
