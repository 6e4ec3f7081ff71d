// Persistence Substrate
// Minimal embedded store behind the weight overlay and the result cache.
// Weight writes are keyed upserts, cache writes are always fresh inserts,
// so concurrent writers are last-write-wins without any locking here

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::Result;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// One cached composite result, stored append-only.
#[derive(Debug, Clone)]
pub struct CompositeRow {
    pub id: String,
    /// Sanitized, uppercased ticker.
    pub ticker: String,
    pub composite_json: String,
    pub signals_json: String,
    pub weights_json: String,
    pub inserted_at: DateTime<Utc>,
}

/// Storage contract for the aggregation engine.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Upsert one methodology's weight into the sparse overlay.
    async fn upsert_weight(&self, methodology: &str, weight: f64) -> Result<()>;

    /// The full sparse overlay. May be empty.
    async fn load_weights(&self) -> Result<HashMap<String, f64>>;

    /// Drop the overlay so the next read sees built-in defaults.
    async fn clear_weights(&self) -> Result<()>;

    /// Append a cached composite row. Never overwrites prior rows.
    async fn insert_composite(&self, row: &CompositeRow) -> Result<()>;

    /// The most recently inserted row for a ticker, if any.
    async fn latest_composite(&self, ticker: &str) -> Result<Option<CompositeRow>>;

    /// Dispose of any open connection. Safe to call repeatedly, or without
    /// ever having opened the store.
    async fn close(&self);
}

/// In-memory store for testing and development.
pub struct MemoryStore {
    weights: RwLock<HashMap<String, f64>>,
    composites: RwLock<Vec<CompositeRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            weights: RwLock::new(HashMap::new()),
            composites: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn upsert_weight(&self, methodology: &str, weight: f64) -> Result<()> {
        self.weights
            .write()
            .await
            .insert(methodology.to_string(), weight);
        Ok(())
    }

    async fn load_weights(&self) -> Result<HashMap<String, f64>> {
        Ok(self.weights.read().await.clone())
    }

    async fn clear_weights(&self) -> Result<()> {
        self.weights.write().await.clear();
        Ok(())
    }

    async fn insert_composite(&self, row: &CompositeRow) -> Result<()> {
        self.composites.write().await.push(row.clone());
        Ok(())
    }

    async fn latest_composite(&self, ticker: &str) -> Result<Option<CompositeRow>> {
        // Insertion order breaks timestamp ties deterministically.
        Ok(self
            .composites
            .read()
            .await
            .iter()
            .rev()
            .find(|row| row.ticker == ticker)
            .cloned())
    }

    async fn close(&self) {}
}
