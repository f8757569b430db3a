//! Free-usage allowances for gated features, separate from the points
//! ledger so free-tier counting and paid spending audit independently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Allowance state for one gated feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureQuota {
    pub free_uses_remaining: u32,
    pub cost_per_use_after_free: i64,
}

impl FeatureQuota {
    pub fn new(free_uses: u32, cost_per_use_after_free: i64) -> Self {
        Self {
            free_uses_remaining: free_uses,
            cost_per_use_after_free,
        }
    }

    /// Consume one access. While free uses remain, the counter is drawn
    /// down (never below zero) and the access costs nothing; once
    /// exhausted, `NeedsPoints` tells the caller what an explicit `spend`
    /// would cost — the quota itself never touches the ledger.
    pub fn consume(&self) -> Result<(FeatureQuota, bool), NeedsPoints> {
        if self.free_uses_remaining > 0 {
            let next = FeatureQuota {
                free_uses_remaining: self.free_uses_remaining - 1,
                cost_per_use_after_free: self.cost_per_use_after_free,
            };
            return Ok((next, true));
        }
        Err(NeedsPoints {
            cost: self.cost_per_use_after_free,
        })
    }
}

/// Free allowance exhausted; the access costs `cost` points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeedsPoints {
    pub cost: i64,
}

impl fmt::Display for NeedsPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "free uses exhausted, costs {} points", self.cost)
    }
}

impl std::error::Error for NeedsPoints {}
