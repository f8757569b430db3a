//! Reveal coordination: the once-per-day user action that fixes and
//! discloses the day's content.
//!
//! The coordinator threads one reveal attempt through the daily state
//! tracker, the feature quota and the points ledger, committing state only
//! after every gate has passed. Failures never leave partial mutations:
//! payment gating is checked before the ledger or record is touched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::PREMIUM_REVEAL_COST;
use crate::day::CalendarDay;
use crate::generate::{ContentCatalog, generate};
use crate::insight::DailyInsight;
use crate::ledger::{LedgerEntry, LedgerError, PointsLedger};
use crate::quota::FeatureQuota;
use crate::seed::IdentitySeed;
use crate::state::{DailyStateError, DailyStateRecord, commit_reveal, ensure_current_day};

/// The item the user asked to reveal. `locked` items are premium-gated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: String,
    pub locked: bool,
}

/// Read-only view of a user's day: today's insight plus the (possibly
/// rolled-over) record the caller should persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodayView {
    pub insight: DailyInsight,
    pub record: DailyStateRecord,
    pub revealed: bool,
}

/// A committed reveal and everything the caller must persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealOutcome {
    pub insight: DailyInsight,
    pub record: DailyStateRecord,
    /// Updated quota when the item was locked.
    pub quota: Option<FeatureQuota>,
    pub used_free_unit: bool,
    /// Spend entry to append when points were charged.
    pub spend_entry: Option<LedgerEntry>,
    pub points_spent: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealError {
    /// Soft: today's result is already fixed. Carries the recomputed
    /// insight so the caller shows the cached content, not an error.
    AlreadyRevealedToday { insight: DailyInsight },
    /// The gated item needs points the user doesn't have. Nothing was
    /// mutated; the caller routes to an earn/purchase flow.
    PaymentRequired { cost: i64, balance: i64 },
    /// Persisted state is future-dated relative to `today` (the clock
    /// moved backwards); surfaced for the caller, never auto-reset.
    StaleState {
        recorded: CalendarDay,
        today: CalendarDay,
    },
}

impl fmt::Display for RevealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealError::AlreadyRevealedToday { .. } => {
                write!(f, "today's reveal has already happened")
            }
            RevealError::PaymentRequired { cost, balance } => {
                write!(f, "needs {cost} points (balance {balance})")
            }
            RevealError::StaleState { recorded, today } => write!(
                f,
                "daily state is from the future (recorded {recorded}, today {today})"
            ),
        }
    }
}

impl std::error::Error for RevealError {}

fn state_error(
    err: DailyStateError,
    seed: &IdentitySeed,
    today: CalendarDay,
    catalog: &ContentCatalog,
) -> RevealError {
    match err {
        DailyStateError::StaleState { recorded, today } => {
            RevealError::StaleState { recorded, today }
        }
        DailyStateError::AlreadyRevealedToday | DailyStateError::ShuffleLimitReached => {
            RevealError::AlreadyRevealedToday {
                insight: generate(seed, today, catalog),
            }
        }
    }
}

/// Today's insight without committing anything. Safe to call repeatedly;
/// the returned record reflects any lazy rollover and should be persisted.
pub fn today_insight(
    seed: &IdentitySeed,
    record: &DailyStateRecord,
    today: CalendarDay,
    catalog: &ContentCatalog,
) -> Result<TodayView, RevealError> {
    let current =
        ensure_current_day(record, today).map_err(|e| state_error(e, seed, today, catalog))?;
    let revealed = current.revealed_today;
    Ok(TodayView {
        insight: generate(seed, today, catalog),
        record: current,
        revealed,
    })
}

/// Reveal the selected item for today.
///
/// At most one reveal commits per (user, calendar day). Re-running on the
/// same day returns `AlreadyRevealedToday` with the identical insight —
/// reopening the screen never re-rolls content.
pub fn reveal_selection(
    seed: &IdentitySeed,
    record: &DailyStateRecord,
    today: CalendarDay,
    item: &SelectedItem,
    ledger: &mut PointsLedger,
    quota: Option<FeatureQuota>,
    catalog: &ContentCatalog,
) -> Result<RevealOutcome, RevealError> {
    let current =
        ensure_current_day(record, today).map_err(|e| state_error(e, seed, today, catalog))?;

    if current.revealed_today {
        return Err(RevealError::AlreadyRevealedToday {
            insight: generate(seed, today, catalog),
        });
    }

    let mut new_quota = None;
    let mut used_free_unit = false;
    let mut spend_entry = None;
    let mut points_spent = 0;

    if item.locked {
        // Missing quota row means no free allowance: straight to paid at
        // the default premium cost.
        let gate = quota.unwrap_or_else(|| FeatureQuota::new(0, PREMIUM_REVEAL_COST));
        match gate.consume() {
            Ok((updated, free)) => {
                new_quota = Some(updated);
                used_free_unit = free;
            }
            Err(needs) if needs.cost > 0 => {
                let reason = format!("premium_reveal:{}", item.id);
                match ledger.spend(needs.cost, &reason) {
                    Ok(entry) => {
                        points_spent = needs.cost;
                        spend_entry = Some(entry);
                        new_quota = Some(gate);
                    }
                    Err(LedgerError::InsufficientPoints { requested, balance }) => {
                        return Err(RevealError::PaymentRequired {
                            cost: requested,
                            balance,
                        });
                    }
                    Err(LedgerError::InvalidAmount(_)) => {
                        // cost > 0 was checked; unreachable in practice,
                        // treated as payment-required to stay side-effect free
                        return Err(RevealError::PaymentRequired {
                            cost: needs.cost,
                            balance: ledger.balance(),
                        });
                    }
                }
            }
            // Zero-cost gate: exhausted free uses but nothing to charge.
            Err(_) => new_quota = Some(gate),
        }
    }

    let committed = commit_reveal(&current, today, &item.id)
        .map_err(|e| state_error(e, seed, today, catalog))?;

    Ok(RevealOutcome {
        insight: generate(seed, today, catalog),
        record: committed,
        quota: new_quota,
        used_free_unit,
        spend_entry,
        points_spent,
    })
}
