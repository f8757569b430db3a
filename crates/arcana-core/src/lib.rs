//! Daily engagement engine.
//!
//! Deterministically derives a user's daily insight (tarot card, horoscope
//! sign, numerology number, affirmation) from stable identity data and the
//! calendar date, tracks the once-per-day reveal as a small state machine
//! with lazy local-day rollover, and gates premium actions through an
//! append-only points ledger with free-quota allowances.
//!
//! Zero I/O — pure logic with no opinions about transport or persistence.
//! State goes in as parameters and comes back out as values; storage and
//! clocks belong to the caller.

pub mod constants;
pub mod day;
pub mod generate;
pub mod insight;
pub mod ledger;
pub mod numerology;
pub mod prng;
pub mod quota;
pub mod reveal;
pub mod seed;
pub mod state;
pub mod zodiac;

pub use constants::{
    MASTER_NUMBERS, MAX_AFFIRMATION_SHUFFLES, PREMIUM_REVEAL_COST, PREMIUM_REVEAL_FREE_USES,
    TAROT_DECK_SIZE,
};
pub use day::{CalendarDay, now_iso8601, now_unix_secs, unix_to_iso8601};
pub use generate::{ContentCatalog, generate, shuffled_affirmation};
pub use insight::{DailyInsight, NumerologyNumber};
pub use ledger::{LedgerEntry, LedgerError, PointsLedger};
pub use numerology::life_path;
pub use prng::{SplitMix64, daily_key, fnv1a_64};
pub use quota::{FeatureQuota, NeedsPoints};
pub use reveal::{RevealError, RevealOutcome, SelectedItem, TodayView, reveal_selection, today_insight};
pub use seed::{BirthTime, IdentitySeed};
pub use state::{
    DailyStateError, DailyStateRecord, commit_reveal, commit_shuffle, ensure_current_day,
};
pub use zodiac::HoroscopeSign;
