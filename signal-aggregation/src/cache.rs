// TTL-Scoped Composite Result Cache
// Append-only: every write is a fresh row, latest wins on read, and prior
// rows remain as an implicit history trail

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use common::sanitize::sanitize_ticker;
use common::signals::{CompositeSignal, MethodologySignal};

use crate::error::Result;
use crate::storage::{CompositeRow, SignalStore};

/// Default freshness window for cached composites.
pub const DEFAULT_MAX_AGE_MINUTES: i64 = 60;

pub struct ResultCache {
    store: Arc<dyn SignalStore>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }

    /// Append a composite result together with the inputs and weights that
    /// produced it.
    pub async fn cache_result(
        &self,
        composite: &CompositeSignal,
        signals: &[MethodologySignal],
        weights: &HashMap<String, f64>,
    ) -> Result<()> {
        let ticker = sanitize_ticker(&composite.ticker);
        let row = CompositeRow {
            id: Uuid::new_v4().to_string(),
            ticker: ticker.clone(),
            composite_json: serde_json::to_string(composite)?,
            signals_json: serde_json::to_string(signals)?,
            weights_json: serde_json::to_string(weights)?,
            inserted_at: Utc::now(),
        };
        self.store.insert_composite(&row).await?;
        debug!(ticker = %ticker, "cached composite result");
        Ok(())
    }

    /// The most recent composite for `ticker`, if one exists and is no older
    /// than `max_age_minutes`. Lookup is case-insensitive.
    pub async fn get_cached_result(
        &self,
        ticker: &str,
        max_age_minutes: i64,
    ) -> Result<Option<CompositeSignal>> {
        let ticker = sanitize_ticker(ticker);
        let Some(row) = self.store.latest_composite(&ticker).await? else {
            return Ok(None);
        };

        let age = Utc::now() - row.inserted_at;
        if age > Duration::minutes(max_age_minutes) {
            debug!(
                ticker = %ticker,
                age_minutes = age.num_minutes(),
                "cached composite expired"
            );
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&row.composite_json)?))
    }
}
