//! Deterministic content generation: (identity seed, calendar day) → insight.
//!
//! Pure functions with no stored state. The key construction and draw order
//! are frozen (see `prng`): the index stream seeded by `daily_key` yields
//! the tarot card first, then the affirmation index; the numerology
//! fallback value comes from the key itself without consuming the stream.

use crate::constants::TAROT_DECK_SIZE;
use crate::day::CalendarDay;
use crate::insight::{DailyInsight, NumerologyNumber};
use crate::numerology::life_path;
use crate::prng::{SplitMix64, daily_key};
use crate::seed::IdentitySeed;
use crate::zodiac::HoroscopeSign;

/// Shape of the external content tables the generator indexes into.
/// The tables themselves (card text, affirmation text) live outside the
/// engine; only their sizes and the no-birth-date default sign matter here.
#[derive(Clone, Copy, Debug)]
pub struct ContentCatalog {
    pub affirmation_count: usize,
    pub default_sign: HoroscopeSign,
}

impl Default for ContentCatalog {
    fn default() -> Self {
        Self {
            affirmation_count: 10,
            default_sign: HoroscopeSign::Aries,
        }
    }
}

/// Generate one user's insight for one calendar day.
pub fn generate(seed: &IdentitySeed, day: CalendarDay, catalog: &ContentCatalog) -> DailyInsight {
    let key = daily_key(&seed.user_id, day);
    let mut rng = SplitMix64::new(key);

    let tarot_card = rng.next_index(TAROT_DECK_SIZE) as u8;
    let affirmation_index = rng.next_index(catalog.affirmation_count.max(1));

    let numerology = match seed.birth_date {
        Some(birth) => NumerologyNumber {
            value: life_path(birth),
            fallback: false,
        },
        // No birth date: derive 1..=9 from the daily key itself.
        None => NumerologyNumber {
            value: (key % 9) as u8 + 1,
            fallback: true,
        },
    };

    DailyInsight {
        day,
        tarot_card,
        sign: HoroscopeSign::for_birth_date(seed.birth_date, catalog.default_sign),
        numerology,
        affirmation_index,
    }
}

/// Affirmation index after `shuffle` same-day re-draws.
///
/// Shuffle 0 is the base affirmation from `generate`; each re-draw takes the
/// next index from the same per-day stream, so the sequence is fixed for the
/// day and re-entering never changes an already-shuffled result.
pub fn shuffled_affirmation(
    seed: &IdentitySeed,
    day: CalendarDay,
    shuffle: u32,
    catalog: &ContentCatalog,
) -> usize {
    let mut rng = SplitMix64::new(daily_key(&seed.user_id, day));
    rng.next_u64(); // tarot draw
    let mut index = rng.next_index(catalog.affirmation_count.max(1));
    for _ in 0..shuffle {
        index = rng.next_index(catalog.affirmation_count.max(1));
    }
    index
}
