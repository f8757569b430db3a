//! Stable hashing and index generation for deterministic daily content.
//!
//! The algorithms here are a compatibility surface: every constant and the
//! order of operations decide which card every user sees on which day, so
//! they are fixed — FNV-1a (64-bit) for string hashing, SplitMix64 for the
//! index stream. Both are specified bit-for-bit and reproduce identically
//! on any platform. Never substitute a language/platform default hash.

use crate::constants::{FNV_OFFSET_BASIS, FNV_PRIME, SPLITMIX_GAMMA};
use crate::day::CalendarDay;

/// FNV-1a 64-bit hash.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// The 64-bit key that seeds a user's index stream for one calendar day:
/// the user hash XORed with the integer day encoding spread across the key
/// space by the SplitMix64 gamma.
pub fn daily_key(user_id: &str, day: CalendarDay) -> u64 {
    fnv1a_64(user_id.as_bytes()) ^ (day.ymd_key() as u64).wrapping_mul(SPLITMIX_GAMMA)
}

/// SplitMix64 (Steele, Lea & Flood) — a tiny, fully deterministic 64-bit
/// generator with a one-word state. Not cryptographic; statistical quality
/// is more than enough for spreading indices over content tables.
#[derive(Clone, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX_GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Next index in `0..bound` via modulo. The modulo bias is negligible
    /// for the table sizes involved (≤ a few hundred entries against 2^64).
    pub fn next_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        (self.next_u64() % bound as u64) as usize
    }
}
