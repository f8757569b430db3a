//! Versioned JSON export/import of a user's full persisted state.
//!
//! The wire format is camelCase and carries the daily state, every ledger
//! entry, and the quota rows. Import replaces the database contents
//! wholesale (it is a restore, not a merge) and rebuilds the balance cache
//! from the imported log.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use arcana_core::{DailyStateRecord, LedgerEntry, PointsLedger, now_iso8601};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const EXPORT_VERSION: &str = "1";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDailyState {
    last_reset_day: String,
    revealed_today: bool,
    revealed_item_id: Option<String>,
    #[serde(default)]
    affirmation_shuffles: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLedgerEntry {
    id: String,
    timestamp: String,
    delta: i64,
    reason: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuota {
    free_uses_remaining: u32,
    cost_per_use: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportFile {
    version: String,
    exported_at: String,
    daily_state: Option<WireDailyState>,
    ledger: Vec<WireLedgerEntry>,
    quotas: BTreeMap<String, WireQuota>,
}

impl Store {
    /// Export the store contents as a versioned JSON string.
    pub fn export_json_string(&self) -> Result<String> {
        let daily_state = self.load_daily_state()?.map(|r| WireDailyState {
            last_reset_day: r.last_reset_day.to_string(),
            revealed_today: r.revealed_today,
            revealed_item_id: r.revealed_item_id,
            affirmation_shuffles: r.affirmation_shuffles,
        });

        let ledger = self
            .load_ledger()?
            .entries()
            .iter()
            .map(|e| WireLedgerEntry {
                id: e.id.to_string(),
                timestamp: e.timestamp.clone(),
                delta: e.delta,
                reason: e.reason.clone(),
            })
            .collect();

        let quotas = self
            .quotas()?
            .into_iter()
            .map(|(feature, q)| {
                (
                    feature,
                    WireQuota {
                        free_uses_remaining: q.free_uses_remaining,
                        cost_per_use: q.cost_per_use_after_free,
                    },
                )
            })
            .collect();

        let file = ExportFile {
            version: EXPORT_VERSION.to_string(),
            exported_at: now_iso8601(),
            daily_state,
            ledger,
            quotas,
        };

        serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }

    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json_string()?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Import a JSON export, replacing the current contents.
    pub fn import_json_str(&self, json: &str) -> Result<()> {
        let file: ExportFile = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        if file.version != EXPORT_VERSION {
            return Err(StoreError::InvalidData(format!(
                "unsupported export version '{}'",
                file.version
            )));
        }

        // Validate up front so a bad file can't half-import.
        let record = match file.daily_state {
            Some(ws) => {
                let last_reset_day = ws.last_reset_day.parse().map_err(|e| {
                    StoreError::InvalidData(format!(
                        "invalid lastResetDay '{}': {e}",
                        ws.last_reset_day
                    ))
                })?;
                if ws.revealed_today && ws.revealed_item_id.is_none() {
                    return Err(StoreError::InvalidData(
                        "revealedToday without revealedItemId".to_string(),
                    ));
                }
                Some(DailyStateRecord {
                    last_reset_day,
                    revealed_today: ws.revealed_today,
                    revealed_item_id: ws.revealed_item_id,
                    affirmation_shuffles: ws.affirmation_shuffles,
                })
            }
            None => None,
        };

        let entries: Vec<LedgerEntry> = file
            .ledger
            .into_iter()
            .map(|we| {
                let id = we.id.parse().map_err(|e| {
                    StoreError::InvalidData(format!("invalid entry id '{}': {e}", we.id))
                })?;
                Ok(LedgerEntry {
                    id,
                    timestamp: we.timestamp,
                    delta: we.delta,
                    reason: we.reason,
                })
            })
            .collect::<Result<_>>()?;
        let balance = PointsLedger::from_entries(entries.clone()).balance();

        let tx = self.conn().unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM daily_state; DELETE FROM ledger_entries;
             DELETE FROM balance; DELETE FROM feature_quotas;",
        )?;
        for entry in &entries {
            tx.execute(
                "INSERT INTO ledger_entries (id, timestamp, delta, reason) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![entry.id.to_string(), entry.timestamp, entry.delta, entry.reason],
            )?;
        }
        tx.execute(
            "INSERT INTO balance (id, total) VALUES (1, ?1)",
            [balance],
        )?;
        for (feature, wq) in &file.quotas {
            tx.execute(
                "INSERT INTO feature_quotas (feature, free_uses_remaining, cost_per_use)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![feature, wq.free_uses_remaining, wq.cost_per_use],
            )?;
        }
        if let Some(record) = &record {
            tx.execute(
                "INSERT INTO daily_state
                 (id, last_reset_day, revealed_today, revealed_item_id, affirmation_shuffles)
                 VALUES (1, ?1, ?2, ?3, ?4)",
                rusqlite::params![
                    record.last_reset_day.to_string(),
                    record.revealed_today as i64,
                    record.revealed_item_id,
                    record.affirmation_shuffles,
                ],
            )?;
        }
        tx.commit()?;

        tracing::info!(
            entries = entries.len(),
            "imported user state from JSON export"
        );
        Ok(())
    }

    pub fn import_json_file(&self, path: &Path) -> Result<()> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::{CalendarDay, FeatureQuota, commit_reveal};

    fn populated_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        let today = CalendarDay::new(2026, 2, 21).unwrap();
        let record =
            commit_reveal(&DailyStateRecord::new(today), today, "card-3").unwrap();
        store.save_daily_state(&record).unwrap();

        let mut ledger = PointsLedger::new();
        let credit = ledger.credit(100, "onboarding").unwrap();
        let spend = ledger.spend(50, "premium_reveal:card-3").unwrap();
        store.append_ledger_entry(&credit).unwrap();
        store.append_ledger_entry(&spend).unwrap();

        store
            .save_quota("premium_reveal", &FeatureQuota::new(0, 50))
            .unwrap();
        store
    }

    #[test]
    fn test_export_import_roundtrip() {
        let original = populated_store();
        let json = original.export_json_string().unwrap();

        let restored = Store::open_in_memory().unwrap();
        restored.import_json_str(&json).unwrap();

        assert_eq!(
            restored.load_daily_state().unwrap(),
            original.load_daily_state().unwrap()
        );
        let ledger = restored.load_ledger().unwrap();
        assert_eq!(ledger.balance(), 50);
        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(restored.quotas().unwrap(), original.quotas().unwrap());
    }

    #[test]
    fn test_wire_format_shape() {
        let store = populated_store();
        let json = store.export_json_string().unwrap();
        let wire: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(wire["version"], "1");
        assert!(wire["exportedAt"].is_string());
        assert_eq!(wire["dailyState"]["lastResetDay"], "2026-02-21");
        assert_eq!(wire["dailyState"]["revealedToday"], true);
        assert!(wire["ledger"].is_array());
        assert_eq!(wire["ledger"][0]["delta"], 100);
        assert!(wire["quotas"]["premium_reveal"]["freeUsesRemaining"].is_number());
    }

    #[test]
    fn test_import_replaces_previous_contents() {
        let store = populated_store();
        let empty = Store::open_in_memory().unwrap();
        let empty_json = empty.export_json_string().unwrap();

        store.import_json_str(&empty_json).unwrap();
        assert!(store.load_daily_state().unwrap().is_none());
        assert_eq!(store.load_ledger().unwrap().entries().len(), 0);
        assert!(store.quotas().unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.import_json_str("not valid json").is_err());
    }

    #[test]
    fn test_import_rejects_unknown_version() {
        let store = Store::open_in_memory().unwrap();
        let json = r#"{"version": "99", "exportedAt": "", "dailyState": null, "ledger": [], "quotas": {}}"#;
        assert!(store.import_json_str(json).is_err());
    }

    #[test]
    fn test_import_rejects_reveal_without_item() {
        let store = Store::open_in_memory().unwrap();
        let json = r#"{
            "version": "1",
            "exportedAt": "2026-02-21T00:00:00Z",
            "dailyState": {
                "lastResetDay": "2026-02-21",
                "revealedToday": true,
                "revealedItemId": null
            },
            "ledger": [],
            "quotas": {}
        }"#;
        let err = store.import_json_str(json).unwrap_err();
        assert!(err.to_string().contains("revealedToday"));
        // nothing was written
        assert!(store.load_daily_state().unwrap().is_none());
    }

    #[test]
    fn test_import_file_roundtrip() {
        let dir = std::env::temp_dir().join("arcana-store-test-json");
        let _ = fs::create_dir_all(&dir);
        let json_path = dir.join("export.json");

        let original = populated_store();
        original.export_json_file(&json_path).unwrap();
        assert!(json_path.exists());

        let restored = Store::open_in_memory().unwrap();
        restored.import_json_file(&json_path).unwrap();
        assert_eq!(restored.load_ledger().unwrap().balance(), 50);

        let _ = fs::remove_dir_all(&dir);
    }
}
