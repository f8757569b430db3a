//! Append-only points ledger with a derived, never-trusted balance.
//!
//! Entries are immutable once appended and never deleted — the log is the
//! audit trail, the balance is always recomputable from it. `spend` is the
//! only place the non-negativity invariant is enforced; nothing outside the
//! ledger ever "corrects" a balance.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::day::now_iso8601;

/// One immutable ledger line. Positive delta = credit, negative = spend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub timestamp: String,
    pub delta: i64,
    pub reason: String,
}

impl LedgerEntry {
    fn new(delta: i64, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: now_iso8601(),
            delta,
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// Non-positive amount — a programmer error, rejected at the boundary
    /// rather than clamped.
    InvalidAmount(i64),
    InsufficientPoints { requested: i64, balance: i64 },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InvalidAmount(amount) => {
                write!(f, "amount must be positive, got {amount}")
            }
            LedgerError::InsufficientPoints { requested, balance } => write!(
                f,
                "insufficient points: requested {requested}, balance {balance}"
            ),
        }
    }
}

impl std::error::Error for LedgerError {}

/// The transaction log plus an incrementally maintained balance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointsLedger {
    entries: Vec<LedgerEntry>,
    balance: i64,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries; the balance is recomputed from the
    /// log, never taken on faith from a cache.
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        let balance = entries.iter().map(|e| e.delta).sum();
        Self { entries, balance }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Current spendable balance. O(1); always equals the sum of deltas.
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Sum of all credits ever received (spends don't reduce it).
    pub fn lifetime_points(&self) -> i64 {
        self.entries.iter().map(|e| e.delta.max(0)).sum()
    }

    /// Append a credit. Returns a copy of the new entry for the caller to
    /// persist.
    pub fn credit(&mut self, amount: i64, reason: &str) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let entry = LedgerEntry::new(amount, reason);
        self.balance += amount;
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Append a spend. Fails without touching the log when the balance
    /// doesn't cover the amount.
    pub fn spend(&mut self, amount: i64, reason: &str) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientPoints {
                requested: amount,
                balance: self.balance,
            });
        }
        let entry = LedgerEntry::new(-amount, reason);
        self.balance -= amount;
        self.entries.push(entry.clone());
        Ok(entry)
    }
}
