use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    // Checkpoint every ~400KB instead of the default ~4MB — keeps WAL files small
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Force-checkpoint any stale WAL data into the main DB on startup.
    // Errors are non-fatal — in-memory DBs and fresh files legitimately fail this.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::debug!("startup WAL checkpoint complete");
    }

    // Create tables — for fresh databases this includes affirmation_shuffles.
    // For existing v1 databases, CREATE TABLE IF NOT EXISTS is a no-op,
    // so we ALTER TABLE below to add the missing column.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_state (
            id                   INTEGER PRIMARY KEY CHECK (id = 1),
            last_reset_day       TEXT NOT NULL,
            revealed_today       INTEGER NOT NULL DEFAULT 0,
            revealed_item_id     TEXT,
            affirmation_shuffles INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS ledger_entries (
            id        TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            delta     INTEGER NOT NULL,
            reason    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS balance (
            id    INTEGER PRIMARY KEY CHECK (id = 1),
            total INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS feature_quotas (
            feature             TEXT PRIMARY KEY,
            free_uses_remaining INTEGER NOT NULL,
            cost_per_use        INTEGER NOT NULL
        );
        ",
    )?;

    // Add affirmation_shuffles to v1 databases that lack it
    if conn
        .prepare("SELECT affirmation_shuffles FROM daily_state LIMIT 0")
        .is_err()
    {
        conn.execute_batch(
            "ALTER TABLE daily_state ADD COLUMN affirmation_shuffles INTEGER NOT NULL DEFAULT 0;",
        )?;
        tracing::info!("migrated daily_state schema v1 → v2");
    }

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
