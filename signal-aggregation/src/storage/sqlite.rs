// SQLite-Backed Store
// Connection and schema are both lazy: nothing touches disk until the first
// operation, and close() resets the schema flag so a reopened store
// re-ensures its tables

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{CompositeRow, SignalStore};
use crate::error::Result;

pub struct SqliteStore {
    url: String,
    pool: Mutex<Option<SqlitePool>>,
    schema_ready: AtomicBool,
}

impl SqliteStore {
    /// Store backed by a database file, created on first touch.
    pub fn new(db_path: &str) -> Self {
        Self {
            url: format!("sqlite:{db_path}?mode=rwc"),
            pool: Mutex::new(None),
            schema_ready: AtomicBool::new(false),
        }
    }

    /// Private in-memory database. Contents vanish on `close()`.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            pool: Mutex::new(None),
            schema_ready: AtomicBool::new(false),
        }
    }

    async fn pool(&self) -> Result<SqlitePool> {
        let mut guard = self.pool.lock().await;
        let pool = match guard.as_ref() {
            Some(pool) => pool.clone(),
            None => {
                // One connection is enough for this write volume, and keeps
                // in-memory databases (which are per-connection) coherent.
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect(&self.url)
                    .await?;
                sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
                info!(url = %self.url, "opened signal store");
                *guard = Some(pool.clone());
                pool
            }
        };

        if !self.schema_ready.load(Ordering::Acquire) {
            ensure_schema(&pool).await?;
            self.schema_ready.store(true, Ordering::Release);
        }

        Ok(pool)
    }
}

async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS methodology_weights (
            methodology TEXT PRIMARY KEY,
            weight REAL NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS composite_results (
            id TEXT PRIMARY KEY,
            ticker TEXT NOT NULL,
            composite_json TEXT NOT NULL,
            signals_json TEXT NOT NULL,
            weights_json TEXT NOT NULL,
            inserted_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_composite_ticker \
         ON composite_results (ticker, inserted_at)",
    )
    .execute(pool)
    .await?;

    debug!("signal store schema ensured");
    Ok(())
}

/// RFC 3339 with fixed sub-second precision so lexicographic ordering in SQL
/// matches chronological ordering.
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl SignalStore for SqliteStore {
    async fn upsert_weight(&self, methodology: &str, weight: f64) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query(
            "INSERT INTO methodology_weights (methodology, weight, updated_at) \
             VALUES (?, ?, ?) \
             ON CONFLICT(methodology) DO UPDATE SET \
                 weight = excluded.weight, updated_at = excluded.updated_at",
        )
        .bind(methodology)
        .bind(weight)
        .bind(format_ts(Utc::now()))
        .execute(&pool)
        .await?;
        Ok(())
    }

    async fn load_weights(&self) -> Result<HashMap<String, f64>> {
        let pool = self.pool().await?;
        let rows = sqlx::query("SELECT methodology, weight FROM methodology_weights")
            .fetch_all(&pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.get("methodology"), row.get("weight")))
            .collect())
    }

    async fn clear_weights(&self) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM methodology_weights")
            .execute(&pool)
            .await?;
        Ok(())
    }

    async fn insert_composite(&self, row: &CompositeRow) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query(
            "INSERT INTO composite_results \
                 (id, ticker, composite_json, signals_json, weights_json, inserted_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.ticker)
        .bind(&row.composite_json)
        .bind(&row.signals_json)
        .bind(&row.weights_json)
        .bind(format_ts(row.inserted_at))
        .execute(&pool)
        .await?;
        Ok(())
    }

    async fn latest_composite(&self, ticker: &str) -> Result<Option<CompositeRow>> {
        let pool = self.pool().await?;
        let row = sqlx::query(
            "SELECT id, ticker, composite_json, signals_json, weights_json, inserted_at \
             FROM composite_results \
             WHERE ticker = ? \
             ORDER BY inserted_at DESC, rowid DESC \
             LIMIT 1",
        )
        .bind(ticker)
        .fetch_optional(&pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_ts: String = row.get("inserted_at");
        let inserted_at = match DateTime::parse_from_rfc3339(&raw_ts) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(err) => {
                warn!(ticker, %err, "cached row has an unreadable timestamp, treating as miss");
                return Ok(None);
            }
        };

        Ok(Some(CompositeRow {
            id: row.get("id"),
            ticker: row.get("ticker"),
            composite_json: row.get("composite_json"),
            signals_json: row.get("signals_json"),
            weights_json: row.get("weights_json"),
            inserted_at,
        }))
    }

    async fn close(&self) {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            info!("closed signal store");
        }
        self.schema_ready.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_row(ticker: &str, marker: &str) -> CompositeRow {
        CompositeRow {
            id: uuid::Uuid::new_v4().to_string(),
            ticker: ticker.to_string(),
            composite_json: marker.to_string(),
            signals_json: "[]".to_string(),
            weights_json: "{}".to_string(),
            inserted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_weights_roundtrip() {
        let store = SqliteStore::in_memory();

        store.upsert_weight("wyckoff", 0.4).await.unwrap();
        store.upsert_weight("wyckoff", 0.6).await.unwrap();
        store.upsert_weight("sentiment", 0.1).await.unwrap();

        let overlay = store.load_weights().await.unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay["wyckoff"], 0.6);
        assert_eq!(overlay["sentiment"], 0.1);

        store.clear_weights().await.unwrap();
        assert!(store.load_weights().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_composite_is_append_only() {
        let store = SqliteStore::in_memory();

        store.insert_composite(&test_row("AAPL", "old")).await.unwrap();
        store.insert_composite(&test_row("AAPL", "new")).await.unwrap();

        let latest = store.latest_composite("AAPL").await.unwrap().unwrap();
        assert_eq!(latest.composite_json, "new");
        assert!(store.latest_composite("MSFT").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = SqliteStore::in_memory();

        // Closing a store that was never opened is a no-op.
        store.close().await;
        store.close().await;

        store.upsert_weight("ict", 0.3).await.unwrap();
        store.close().await;
        store.close().await;

        // Reopening re-ensures the schema; the in-memory contents are gone.
        assert!(store.load_weights().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_survives_close() {
        let path = std::env::temp_dir().join(format!(
            "signal-aggregation-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let path_str = path.to_string_lossy().to_string();

        let store = SqliteStore::new(&path_str);
        store.upsert_weight("canslim", 0.9).await.unwrap();
        store.close().await;

        let weights = store.load_weights().await.unwrap();
        assert_eq!(weights["canslim"], 0.9);

        store.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
