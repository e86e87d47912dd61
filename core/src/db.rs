use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::models::{ConsumptionRecord, NewRecord};
use crate::schedule::local_midnight;

/// Storage adapter: a string-keyed settings store plus an append/query/delete
/// log of consumption records, keyed and filtered by timestamp.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // timestamp is stored as unix seconds so day-range queries are
            // plain integer comparisons.
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    category TEXT NOT NULL,
                    calories INTEGER NOT NULL,
                    water_l REAL,
                    timestamp INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE UNIQUE INDEX IF NOT EXISTS idx_records_uuid ON records(uuid);
                CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp);

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // Expects columns:
    // 0: id, 1: uuid, 2: category, 3: calories, 4: water_l,
    // 5: timestamp, 6: created_at
    fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<ConsumptionRecord> {
        let ts_secs: i64 = row.get(5)?;
        let timestamp = DateTime::from_timestamp(ts_secs, 0)
            .unwrap_or_default()
            .with_timezone(&Local);
        Ok(ConsumptionRecord {
            id: row.get(0)?,
            uuid: row.get(1)?,
            category: row.get(2)?,
            calories: row.get(3)?,
            water_l: row.get(4)?,
            timestamp,
            created_at: row.get(6)?,
        })
    }

    // --- Records ---

    pub fn save_record(&self, record: &NewRecord) -> Result<ConsumptionRecord> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO records (uuid, category, calories, water_l, timestamp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                uuid,
                record.category,
                record.calories,
                record.water_l,
                record.timestamp.timestamp(),
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_record(id)?
            .context("Record not found after insert")
    }

    pub fn get_record(&self, id: i64) -> Result<Option<ConsumptionRecord>> {
        let mut stmt = self.conn.prepare("SELECT * FROM records WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::record_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All records, newest first.
    pub fn get_all_records(&self) -> Result<Vec<ConsumptionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM records ORDER BY timestamp DESC, id DESC")?;
        let records = stmt
            .query_map([], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Records whose timestamp falls within one local calendar day,
    /// newest first.
    pub fn get_records(&self, date: NaiveDate) -> Result<Vec<ConsumptionRecord>> {
        let (start, end) = day_bounds(date)?;
        let mut stmt = self.conn.prepare(
            "SELECT * FROM records
             WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp DESC, id DESC",
        )?;
        let records = stmt
            .query_map(params![start, end], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn delete_record(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Delete every record on the given local calendar day; returns how many
    /// were removed.
    pub fn clear_records(&self, date: NaiveDate) -> Result<usize> {
        let (start, end) = day_bounds(date)?;
        let rows = self.conn.execute(
            "DELETE FROM records WHERE timestamp >= ?1 AND timestamp < ?2",
            params![start, end],
        )?;
        Ok(rows)
    }

    /// Average of per-day calorie sums over the trailing `days` window ending
    /// today. Days without any record are excluded from the denominator.
    pub fn calorie_average(&self, days: i64) -> Result<f64> {
        let today = Local::now().date_naive();
        let start_date = today - chrono::Duration::days(days - 1);
        let start = local_midnight(start_date)?.timestamp();
        let now = Local::now().timestamp();

        let result: Option<f64> = self.conn.query_row(
            "SELECT AVG(day_total) FROM (
                SELECT SUM(calories) AS day_total
                FROM records
                WHERE timestamp >= ?1 AND timestamp <= ?2
                GROUP BY date(timestamp, 'unixepoch', 'localtime')
            )",
            params![start, now],
            |row| row.get(0),
        )?;

        Ok(result.unwrap_or(0.0))
    }

    // --- Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }
}

/// Unix-second bounds of one local calendar day: `[midnight, next midnight)`.
fn day_bounds(date: NaiveDate) -> Result<(i64, i64)> {
    let start = local_midnight(date)?;
    let next = date.succ_opt().context("date out of range")?;
    let end = local_midnight(next)?;
    Ok((start.timestamp(), end.timestamp()))
}
