//! Per-user daily state machine: `Pending` until the day's reveal, then
//! `Revealed` until the next local-day rollover.
//!
//! Transitions are pure — callers persist the returned record. Rollover is
//! detected lazily by running every read path through `ensure_current_day`,
//! so a day boundary crossed while the process was down is picked up on the
//! next access without any background timer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_AFFIRMATION_SHUFFLES;
use crate::day::CalendarDay;

/// Persisted once per user. `revealed_today == true` always implies
/// `revealed_item_id.is_some()`; `last_reset_day` never moves backwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStateRecord {
    pub last_reset_day: CalendarDay,
    pub revealed_today: bool,
    pub revealed_item_id: Option<String>,
    pub affirmation_shuffles: u32,
}

impl DailyStateRecord {
    /// Fresh record for a user's first day.
    pub fn new(today: CalendarDay) -> Self {
        Self {
            last_reset_day: today,
            revealed_today: false,
            revealed_item_id: None,
            affirmation_shuffles: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DailyStateError {
    /// Today's reveal already happened; show the cached result.
    AlreadyRevealedToday,
    /// The record claims a reset day in the future — the clock moved
    /// backwards. Never auto-reset; the caller decides.
    StaleState {
        recorded: CalendarDay,
        today: CalendarDay,
    },
    /// The per-day affirmation shuffle allowance is used up.
    ShuffleLimitReached,
}

impl fmt::Display for DailyStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailyStateError::AlreadyRevealedToday => {
                write!(f, "today's reveal has already happened")
            }
            DailyStateError::StaleState { recorded, today } => write!(
                f,
                "daily state is from the future (recorded {recorded}, today {today})"
            ),
            DailyStateError::ShuffleLimitReached => write!(
                f,
                "affirmation shuffle limit ({MAX_AFFIRMATION_SHUFFLES}/day) reached"
            ),
        }
    }
}

impl std::error::Error for DailyStateError {}

/// Roll the record forward to `today` if a day boundary has passed.
///
/// Same day → unchanged. Earlier day → hard reset to `Pending`. Future day
/// → `StaleState` (the record is never silently discarded). Idempotent:
/// applying twice with the same `today` equals applying once.
pub fn ensure_current_day(
    record: &DailyStateRecord,
    today: CalendarDay,
) -> Result<DailyStateRecord, DailyStateError> {
    if record.last_reset_day > today {
        return Err(DailyStateError::StaleState {
            recorded: record.last_reset_day,
            today,
        });
    }
    if record.last_reset_day == today {
        return Ok(record.clone());
    }
    Ok(DailyStateRecord::new(today))
}

/// Commit today's reveal of `item_id`.
///
/// Rolls the record first, then fails `AlreadyRevealedToday` if today's
/// reveal already happened — the record is unchanged by a failed commit.
pub fn commit_reveal(
    record: &DailyStateRecord,
    today: CalendarDay,
    item_id: &str,
) -> Result<DailyStateRecord, DailyStateError> {
    let current = ensure_current_day(record, today)?;
    if current.revealed_today {
        return Err(DailyStateError::AlreadyRevealedToday);
    }
    Ok(DailyStateRecord {
        last_reset_day: today,
        revealed_today: true,
        revealed_item_id: Some(item_id.to_string()),
        affirmation_shuffles: current.affirmation_shuffles,
    })
}

/// Record one affirmation shuffle, capped per day.
pub fn commit_shuffle(
    record: &DailyStateRecord,
    today: CalendarDay,
) -> Result<DailyStateRecord, DailyStateError> {
    let mut current = ensure_current_day(record, today)?;
    if current.affirmation_shuffles >= MAX_AFFIRMATION_SHUFFLES {
        return Err(DailyStateError::ShuffleLimitReached);
    }
    current.affirmation_shuffles += 1;
    Ok(current)
}
