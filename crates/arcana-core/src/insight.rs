use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;
use crate::zodiac::HoroscopeSign;

/// A life-path (or fallback) numerology number.
///
/// `fallback` is true when no birth date was available and the value was
/// derived from the per-day key instead — callers must not present a
/// fallback value as if it were date-derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumerologyNumber {
    pub value: u8,
    pub fallback: bool,
}

/// One user's derived content for one calendar day.
///
/// Never persisted — recomputable at any time from the identity seed and
/// the day, and byte-identical on every recomputation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyInsight {
    pub day: CalendarDay,
    /// Index into the 78-card deck, 0..=77.
    pub tarot_card: u8,
    pub sign: HoroscopeSign,
    pub numerology: NumerologyNumber,
    /// Index into the external affirmation table.
    pub affirmation_index: usize,
}
