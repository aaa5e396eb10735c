/*!
 * SQLite implementation of the sync-state store.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};

use super::SyncStateStore;
use super::connection::StoreConnection;
use super::models::{RunRecord, SyncRecord, SyncStatistics};
use crate::catalog::{ItemKey, MediaKind};

/// Repository over the `sync_records` and `sync_runs` tables
#[derive(Debug, Clone)]
pub struct SyncRepository {
    db: StoreConnection,
}

impl SyncRepository {
    pub fn new(db: StoreConnection) -> Self {
        Self { db }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(StoreConnection::open_default()?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(StoreConnection::open_in_memory()?))
    }

    pub fn connection(&self) -> &StoreConnection {
        &self.db
    }

    /// Fetch the record for a key, if any
    pub async fn get(&self, key: ItemKey, target_language: &str) -> Result<Option<SyncRecord>> {
        let target_language = target_language.to_string();
        self.db
            .run(move |conn| Self::get_sync(conn, key, &target_language))
            .await
    }

    fn get_sync(conn: &Connection, key: ItemKey, target_language: &str) -> Result<Option<SyncRecord>> {
        let record = conn
            .query_row(
                r#"
                SELECT output_path, source_path, source_language, backend, completed_at
                FROM sync_records
                WHERE item_kind = ?1 AND item_id = ?2 AND target_language = ?3
                "#,
                params![key.kind.to_string(), key.id, target_language],
                |row| {
                    Ok(SyncRecord {
                        key,
                        target_language: target_language.to_string(),
                        output_path: row.get(0)?,
                        source_path: row.get(1)?,
                        source_language: row.get(2)?,
                        backend: row.get(3)?,
                        completed_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Records for a language, newest first
    pub async fn list(&self, target_language: &str, limit: usize) -> Result<Vec<SyncRecord>> {
        let target_language = target_language.to_string();
        self.db
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT item_kind, item_id, output_path, source_path, source_language, backend, completed_at
                    FROM sync_records
                    WHERE target_language = ?1
                    ORDER BY completed_at DESC
                    LIMIT ?2
                    "#,
                )?;
                let rows = stmt.query_map(params![target_language, limit as i64], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                })?;

                let mut records = Vec::new();
                for row in rows {
                    let (kind, id, output_path, source_path, source_language, backend, completed_at) = row?;
                    records.push(SyncRecord {
                        key: ItemKey::new(kind.parse::<MediaKind>()?, id),
                        target_language: target_language.clone(),
                        output_path,
                        source_path,
                        source_language,
                        backend,
                        completed_at,
                    });
                }
                Ok(records)
            })
            .await
    }

    /// Forget a record so the item is processed again on the next run
    pub async fn delete(&self, key: ItemKey, target_language: &str) -> Result<bool> {
        let target_language = target_language.to_string();
        self.db
            .run(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM sync_records WHERE item_kind = ?1 AND item_id = ?2 AND target_language = ?3",
                    params![key.kind.to_string(), key.id, target_language],
                )?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Run history and record counts for the last `days` days
    pub async fn statistics(&self, days: i64) -> Result<SyncStatistics> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        self.db
            .run(move |conn| {
                let (runs, successful, failed, skipped, translated) = conn.query_row(
                    r#"
                    SELECT COUNT(*), COALESCE(SUM(successful), 0), COALESCE(SUM(failed), 0),
                           COALESCE(SUM(skipped), 0), COALESCE(SUM(translated), 0)
                    FROM sync_runs
                    WHERE started_at >= ?1
                    "#,
                    [&cutoff],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                )?;
                let records_in_window = conn.query_row(
                    "SELECT COUNT(*) FROM sync_records WHERE completed_at >= ?1",
                    [&cutoff],
                    |row| row.get(0),
                )?;
                let total_records =
                    conn.query_row("SELECT COUNT(*) FROM sync_records", [], |row| row.get(0))?;

                Ok(SyncStatistics {
                    days,
                    runs,
                    successful,
                    failed,
                    skipped,
                    translated,
                    records_in_window,
                    total_records,
                })
            })
            .await
    }

    /// Drop run history older than `days` days; returns the number of rows removed
    pub async fn prune_runs(&self, days: i64) -> Result<usize> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        self.db
            .run(move |conn| Ok(conn.execute("DELETE FROM sync_runs WHERE started_at < ?1", [&cutoff])?))
            .await
    }
}

#[async_trait]
impl SyncStateStore for SyncRepository {
    async fn exists(&self, key: ItemKey, target_language: &str) -> Result<bool> {
        let target_language = target_language.to_string();
        self.db
            .run(move |conn| {
                let found: Option<i64> = conn
                    .query_row(
                        "SELECT 1 FROM sync_records WHERE item_kind = ?1 AND item_id = ?2 AND target_language = ?3",
                        params![key.kind.to_string(), key.id, target_language],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(found.is_some())
            })
            .await
    }

    async fn record(&self, record: &SyncRecord) -> Result<()> {
        let record = record.clone();
        debug!("Recording {} -> {}", record.key, record.output_path);
        self.db
            .run(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO sync_records (
                        item_kind, item_id, target_language, output_path,
                        source_path, source_language, backend, completed_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT (item_kind, item_id, target_language) DO UPDATE SET
                        output_path = excluded.output_path,
                        source_path = excluded.source_path,
                        source_language = excluded.source_language,
                        backend = excluded.backend,
                        completed_at = excluded.completed_at
                    "#,
                    params![
                        record.key.kind.to_string(),
                        record.key.id,
                        record.target_language,
                        record.output_path,
                        record.source_path,
                        record.source_language,
                        record.backend,
                        record.completed_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let run = run.clone();
        self.db
            .run_in_transaction(move |tx| {
                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO sync_runs (
                        id, target_language, started_at, finished_at,
                        successful, failed, skipped, translated, cancelled
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        run.id,
                        run.target_language,
                        run.started_at,
                        run.finished_at,
                        run.successful,
                        run.failed,
                        run.skipped,
                        run.translated,
                        run.cancelled,
                    ],
                )?;
                Ok(())
            })
            .await
    }
}
