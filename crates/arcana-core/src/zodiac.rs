//! Sun-sign lookup from birth month/day.
//!
//! Twelve fixed closed ranges covering all 366 month/day pairs with no gaps
//! or overlaps. Pisces spans Feb 20 – Mar 20, so Feb 29 falls inside it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoroscopeSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl HoroscopeSign {
    pub const ALL: [HoroscopeSign; 12] = [
        HoroscopeSign::Aries,
        HoroscopeSign::Taurus,
        HoroscopeSign::Gemini,
        HoroscopeSign::Cancer,
        HoroscopeSign::Leo,
        HoroscopeSign::Virgo,
        HoroscopeSign::Libra,
        HoroscopeSign::Scorpio,
        HoroscopeSign::Sagittarius,
        HoroscopeSign::Capricorn,
        HoroscopeSign::Aquarius,
        HoroscopeSign::Pisces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HoroscopeSign::Aries => "aries",
            HoroscopeSign::Taurus => "taurus",
            HoroscopeSign::Gemini => "gemini",
            HoroscopeSign::Cancer => "cancer",
            HoroscopeSign::Leo => "leo",
            HoroscopeSign::Virgo => "virgo",
            HoroscopeSign::Libra => "libra",
            HoroscopeSign::Scorpio => "scorpio",
            HoroscopeSign::Sagittarius => "sagittarius",
            HoroscopeSign::Capricorn => "capricorn",
            HoroscopeSign::Aquarius => "aquarius",
            HoroscopeSign::Pisces => "pisces",
        }
    }

    /// The sign whose date range contains the given month/day.
    pub fn for_month_day(month: u8, day: u8) -> HoroscopeSign {
        match (month, day) {
            (3, 21..=31) | (4, 1..=19) => HoroscopeSign::Aries,
            (4, 20..=30) | (5, 1..=20) => HoroscopeSign::Taurus,
            (5, 21..=31) | (6, 1..=20) => HoroscopeSign::Gemini,
            (6, 21..=30) | (7, 1..=22) => HoroscopeSign::Cancer,
            (7, 23..=31) | (8, 1..=22) => HoroscopeSign::Leo,
            (8, 23..=31) | (9, 1..=22) => HoroscopeSign::Virgo,
            (9, 23..=30) | (10, 1..=22) => HoroscopeSign::Libra,
            (10, 23..=31) | (11, 1..=21) => HoroscopeSign::Scorpio,
            (11, 22..=30) | (12, 1..=21) => HoroscopeSign::Sagittarius,
            (12, 22..=31) | (1, 1..=19) => HoroscopeSign::Capricorn,
            (1, 20..=31) | (2, 1..=19) => HoroscopeSign::Aquarius,
            // (2, 20..=29) | (3, 1..=20), and anything out of range
            _ => HoroscopeSign::Pisces,
        }
    }

    /// Sign for a birth date, or the caller-supplied default when absent.
    pub fn for_birth_date(birth_date: Option<CalendarDay>, default: HoroscopeSign) -> HoroscopeSign {
        match birth_date {
            Some(date) => Self::for_month_day(date.month, date.day),
            None => default,
        }
    }
}

impl fmt::Display for HoroscopeSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct ParseSignError(String);

impl fmt::Display for ParseSignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown horoscope sign: {}", self.0)
    }
}

impl std::error::Error for ParseSignError {}

impl FromStr for HoroscopeSign {
    type Err = ParseSignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        HoroscopeSign::ALL
            .into_iter()
            .find(|sign| sign.as_str() == lower)
            .ok_or_else(|| ParseSignError(s.to_string()))
    }
}
