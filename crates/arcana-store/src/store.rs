use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use arcana_core::{CalendarDay, DailyStateRecord, FeatureQuota, LedgerEntry, PointsLedger};

use crate::error::{Result, StoreError};
use crate::schema;

/// Persistence for one user's engagement state. One SQLite file per user —
/// the per-user mutual-exclusion scope is the database itself (WAL plus
/// busy_timeout serialize writers), and the check-then-act commits below
/// re-assert their guards inside the write so racing processes cannot both
/// win.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Database size in bytes (0 for in-memory).
    pub fn db_size(&self) -> u64 {
        self.conn
            .path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Daily state ---

    pub fn load_daily_state(&self) -> Result<Option<DailyStateRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT last_reset_day, revealed_today, revealed_item_id, affirmation_shuffles
             FROM daily_state WHERE id = 1",
        )?;
        let row = stmt
            .query_row([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? != 0,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .optional()?;

        match row {
            None => Ok(None),
            Some((day_str, revealed_today, revealed_item_id, shuffles)) => {
                Ok(Some(DailyStateRecord {
                    last_reset_day: parse_day(&day_str)?,
                    revealed_today,
                    revealed_item_id,
                    affirmation_shuffles: shuffles as u32,
                }))
            }
        }
    }

    pub fn save_daily_state(&self, record: &DailyStateRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_state
             (id, last_reset_day, revealed_today, revealed_item_id, affirmation_shuffles)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                record.last_reset_day.to_string(),
                record.revealed_today as i64,
                record.revealed_item_id,
                record.affirmation_shuffles,
            ],
        )?;
        Ok(())
    }

    /// Persist a committed reveal — record, optional spend entry, optional
    /// quota update — as one transaction, with both check-then-act guards
    /// re-asserted at the SQL layer. Returns false (persisting nothing)
    /// when a concurrent writer already committed today's reveal or
    /// drained the balance first; the caller should reload and show the
    /// cached result instead of treating it as a fresh commit.
    pub fn persist_reveal_txn(
        &self,
        record: &DailyStateRecord,
        spend: Option<&LedgerEntry>,
        quota: Option<(&str, &FeatureQuota)>,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;

        let rows = tx.execute(
            "INSERT INTO daily_state
             (id, last_reset_day, revealed_today, revealed_item_id, affirmation_shuffles)
             VALUES (1, ?1, 1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 last_reset_day = excluded.last_reset_day,
                 revealed_today = 1,
                 revealed_item_id = excluded.revealed_item_id,
                 affirmation_shuffles = excluded.affirmation_shuffles
             WHERE NOT (daily_state.last_reset_day = excluded.last_reset_day
                        AND daily_state.revealed_today = 1)",
            params![
                record.last_reset_day.to_string(),
                record.revealed_item_id,
                record.affirmation_shuffles,
            ],
        )?;
        if rows == 0 {
            return Ok(false); // dropped tx rolls back
        }

        if let Some(entry) = spend {
            tx.execute("INSERT OR IGNORE INTO balance (id, total) VALUES (1, 0)", [])?;
            let rows = tx.execute(
                "UPDATE balance SET total = total + ?1 WHERE id = 1 AND total + ?1 >= 0",
                [entry.delta],
            )?;
            if rows == 0 {
                return Ok(false); // reveal rolled back with the failed spend
            }
            self.insert_entry_on(&tx, entry)?;
        }

        if let Some((feature, quota)) = quota {
            tx.execute(
                "INSERT OR REPLACE INTO feature_quotas (feature, free_uses_remaining, cost_per_use)
                 VALUES (?1, ?2, ?3)",
                params![feature, quota.free_uses_remaining, quota.cost_per_use_after_free],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    // --- Points ledger ---

    /// Load the full ledger. The cached running total is compared against
    /// the recomputed sum and repaired if they disagree — the cache is
    /// never trusted over the log.
    pub fn load_ledger(&self) -> Result<PointsLedger> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, delta, reason FROM ledger_entries ORDER BY rowid",
        )?;
        let entries: Vec<LedgerEntry> = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id_str, timestamp, delta, reason)| {
                Ok(LedgerEntry {
                    id: parse_uuid(&id_str)?,
                    timestamp,
                    delta,
                    reason,
                })
            })
            .collect::<Result<_>>()?;

        let ledger = PointsLedger::from_entries(entries);

        let cached: Option<i64> = self
            .conn
            .query_row("SELECT total FROM balance WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        match cached {
            Some(total) if total == ledger.balance() => {}
            Some(total) => {
                tracing::warn!(
                    cached = total,
                    recomputed = ledger.balance(),
                    "ledger balance cache inconsistent; repairing from log"
                );
                self.conn.execute(
                    "UPDATE balance SET total = ?1 WHERE id = 1",
                    [ledger.balance()],
                )?;
            }
            None => {
                self.conn.execute(
                    "INSERT INTO balance (id, total) VALUES (1, ?1)",
                    [ledger.balance()],
                )?;
            }
        }

        Ok(ledger)
    }

    /// Append a ledger entry and roll its delta into the cached balance,
    /// atomically.
    pub fn append_ledger_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("INSERT OR IGNORE INTO balance (id, total) VALUES (1, 0)", [])?;
        tx.execute(
            "UPDATE balance SET total = total + ?1 WHERE id = 1",
            [entry.delta],
        )?;
        self.insert_entry_on(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    /// Append a spend entry with the non-negativity guard re-asserted
    /// inside the transaction. Returns false (and appends nothing) when
    /// the on-disk balance no longer covers it.
    pub fn append_spend_guarded(&self, entry: &LedgerEntry) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("INSERT OR IGNORE INTO balance (id, total) VALUES (1, 0)", [])?;
        let rows = tx.execute(
            "UPDATE balance SET total = total + ?1 WHERE id = 1 AND total + ?1 >= 0",
            [entry.delta],
        )?;
        if rows == 0 {
            return Ok(false); // dropped tx rolls back
        }
        self.insert_entry_on(&tx, entry)?;
        tx.commit()?;
        Ok(true)
    }

    fn insert_entry_on(&self, conn: &Connection, entry: &LedgerEntry) -> Result<()> {
        conn.execute(
            "INSERT INTO ledger_entries (id, timestamp, delta, reason) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id.to_string(),
                entry.timestamp,
                entry.delta,
                entry.reason,
            ],
        )?;
        Ok(())
    }

    pub fn ledger_entry_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM ledger_entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // --- Feature quotas ---

    pub fn load_quota(&self, feature: &str) -> Result<Option<FeatureQuota>> {
        let mut stmt = self.conn.prepare(
            "SELECT free_uses_remaining, cost_per_use FROM feature_quotas WHERE feature = ?1",
        )?;
        let row = stmt
            .query_row([feature], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .optional()?;
        Ok(row.map(|(free, cost)| FeatureQuota::new(free.max(0) as u32, cost)))
    }

    pub fn save_quota(&self, feature: &str, quota: &FeatureQuota) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO feature_quotas (feature, free_uses_remaining, cost_per_use)
             VALUES (?1, ?2, ?3)",
            params![
                feature,
                quota.free_uses_remaining,
                quota.cost_per_use_after_free,
            ],
        )?;
        Ok(())
    }

    pub fn quotas(&self) -> Result<Vec<(String, FeatureQuota)>> {
        let mut stmt = self.conn.prepare(
            "SELECT feature, free_uses_remaining, cost_per_use
             FROM feature_quotas ORDER BY feature",
        )?;
        stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .map(|r| {
            let (feature, free, cost) = r?;
            Ok((feature, FeatureQuota::new(free.max(0) as u32, cost)))
        })
        .collect()
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}

fn parse_day(s: &str) -> Result<CalendarDay> {
    s.parse()
        .map_err(|e| StoreError::InvalidData(format!("invalid calendar day '{s}': {e}")))
}
