use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;

/// Time-of-day component of a birth instant, UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthTime {
    pub hour: u8,
    pub minute: u8,
}

impl BirthTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }
}

/// Stable per-user identity attributes. Supplied by an external identity
/// collaborator (onboarding/profile); the engine treats it as read-only.
///
/// `user_id` is the opaque stable handle the daily key is derived from;
/// birth date and time are optional refinements. Birth time is carried for
/// collaborators that need it (rising-sign charts) but does not influence
/// daily generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySeed {
    pub user_id: String,
    pub birth_date: Option<CalendarDay>,
    pub birth_time: Option<BirthTime>,
}

impl IdentitySeed {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            birth_date: None,
            birth_time: None,
        }
    }

    pub fn with_birth_date(mut self, date: CalendarDay) -> Self {
        self.birth_date = Some(date);
        self
    }

    pub fn with_birth_time(mut self, time: BirthTime) -> Self {
        self.birth_time = Some(time);
        self
    }
}
