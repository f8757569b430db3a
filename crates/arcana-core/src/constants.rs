/// Number of cards in the tarot deck (22 major + 56 minor arcana).
pub const TAROT_DECK_SIZE: usize = 78;

/// Numerology master numbers, returned un-reduced by digit-sum reduction.
pub const MASTER_NUMBERS: [u8; 3] = [11, 22, 33];

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// SplitMix64 increment (golden-ratio gamma). Also used to spread the
/// integer day encoding across the 64-bit key space.
pub const SPLITMIX_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Maximum affirmation re-draws per calendar day.
pub const MAX_AFFIRMATION_SHUFFLES: u32 = 2;

/// Free uses seeded for the premium reveal feature.
pub const PREMIUM_REVEAL_FREE_USES: u32 = 1;

/// Point cost of a premium reveal once free uses are exhausted.
pub const PREMIUM_REVEAL_COST: i64 = 50;
