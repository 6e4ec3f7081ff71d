// Methodology Weight Configuration
// A sparse persisted overlay merged over built-in defaults; every read
// yields a fully populated, normalized 6-entry map

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use common::numeric::weight_from_json;
use common::signals::METHODOLOGIES;

use crate::error::{AggregationError, Result};
use crate::storage::SignalStore;

/// Sum below which a weight map is treated as all-zero.
const ZERO_SUM_EPSILON: f64 = 1e-9;

/// Built-in default weight for a canonical methodology id.
///
/// Price-structure methodologies carry slightly more weight than the rest;
/// the six defaults sum to 1.0.
pub fn default_weight(methodology: &str) -> f64 {
    match methodology {
        "wyckoff" | "ict" => 0.20,
        "elliott_wave" | "canslim" | "larry_williams" | "sentiment" => 0.15,
        _ => 0.0,
    }
}

/// The full default map over the canonical methodologies.
pub fn default_weights() -> HashMap<String, f64> {
    METHODOLOGIES
        .iter()
        .map(|m| (m.to_string(), default_weight(m)))
        .collect()
}

/// Normalize a weight map so it sums to 1.
///
/// Non-finite and negative values are treated as 0. A map whose cleaned sum
/// is ~0 becomes an equal split across its own keys. Ratios between valid
/// entries are preserved exactly. An empty map stays empty.
pub fn normalize(weights: &HashMap<String, f64>) -> HashMap<String, f64> {
    if weights.is_empty() {
        return HashMap::new();
    }

    let mut cleaned: Vec<(&str, f64)> = weights
        .iter()
        .map(|(key, value)| {
            let value = if value.is_finite() && *value >= 0.0 {
                *value
            } else {
                0.0
            };
            (key.as_str(), value)
        })
        .collect();
    // Sum in key order: identical inputs must produce bit-identical outputs
    // regardless of map iteration order.
    cleaned.sort_by(|a, b| a.0.cmp(b.0));

    let sum: f64 = cleaned.iter().map(|(_, v)| v).sum();
    if sum.abs() < ZERO_SUM_EPSILON {
        let equal = 1.0 / weights.len() as f64;
        return weights.keys().map(|key| (key.clone(), equal)).collect();
    }

    cleaned
        .into_iter()
        .map(|(key, value)| (key.to_string(), value / sum))
        .collect()
}

/// Persisted weight configuration over the six canonical methodologies.
///
/// Held by the aggregator as an injected dependency rather than as global
/// state; all mutation goes through `set_weights` / `reset_weights`.
pub struct WeightStore {
    store: Arc<dyn SignalStore>,
}

impl WeightStore {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }

    /// The normalized 6-entry map: persisted overlay merged over defaults.
    ///
    /// A substrate read failure degrades to the defaults; configuration
    /// reads never block the scoring path.
    pub async fn get_weights(&self) -> HashMap<String, f64> {
        let overlay = match self.store.load_weights().await {
            Ok(overlay) => overlay,
            Err(err) => {
                warn!(%err, "weight overlay unavailable, using defaults");
                HashMap::new()
            }
        };

        let mut merged = default_weights();
        for (methodology, weight) in overlay {
            if merged.contains_key(methodology.as_str()) {
                merged.insert(methodology, weight);
            }
        }
        normalize(&merged)
    }

    /// Persist the valid entries of a partial weight update.
    ///
    /// Unknown methodology ids are dropped, as are values that are not
    /// finite non-negative numbers (booleans included). An update with zero
    /// surviving entries fails and leaves the stored overlay untouched.
    pub async fn set_weights(&self, partial: &HashMap<String, Value>) -> Result<()> {
        let mut accepted: Vec<(&str, f64)> = Vec::new();
        for (key, value) in partial {
            if !METHODOLOGIES.contains(&key.as_str()) {
                warn!(methodology = %key, "ignoring unknown methodology in weight update");
                continue;
            }
            match weight_from_json(value) {
                Some(weight) => accepted.push((key.as_str(), weight)),
                None => warn!(methodology = %key, %value, "ignoring unusable weight value"),
            }
        }

        if accepted.is_empty() {
            return Err(AggregationError::InvalidWeights(
                "no valid weight entries in update".to_string(),
            ));
        }

        for (methodology, weight) in &accepted {
            self.store.upsert_weight(methodology, *weight).await?;
        }
        info!(updated = accepted.len(), "methodology weights updated");
        Ok(())
    }

    /// Clear the overlay, restoring the built-in defaults.
    pub async fn reset_weights(&self) -> Result<()> {
        self.store.clear_weights().await?;
        info!("methodology weights reset to defaults");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn map(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    fn store() -> WeightStore {
        WeightStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_defaults_sum_to_one() {
        let sum: f64 = default_weights().values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_sums_to_one_under_contamination() {
        let contaminated = map(&[
            ("wyckoff", f64::NAN),
            ("ict", f64::INFINITY),
            ("canslim", -3.0),
            ("sentiment", 2.0),
            ("elliott_wave", 6.0),
        ]);
        let normalized = normalize(&contaminated);

        let sum: f64 = normalized.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        // Ratios of the surviving entries are preserved: 2:6.
        assert!((normalized["sentiment"] - 0.25).abs() < 1e-9);
        assert!((normalized["elliott_wave"] - 0.75).abs() < 1e-9);
        assert_eq!(normalized["canslim"], 0.0);
    }

    #[test]
    fn test_normalize_zero_sum_splits_equally() {
        let zeros = map(&[("wyckoff", 0.0), ("ict", f64::NAN), ("canslim", -1.0)]);
        let normalized = normalize(&zeros);
        assert_eq!(normalized.len(), 3);
        for value in normalized.values() {
            assert!((value - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_empty_stays_empty() {
        assert!(normalize(&HashMap::new()).is_empty());
    }

    #[tokio::test]
    async fn test_get_weights_is_fully_populated() {
        let weights = store().get_weights().await;
        assert_eq!(weights.len(), METHODOLOGIES.len());
        let sum: f64 = weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unknown_methodology_only_is_rejected() {
        let store = store();
        let before = store.get_weights().await;

        let mut update = HashMap::new();
        update.insert("unknown_methodology".to_string(), json!(1.0));
        let err = store.set_weights(&update).await.unwrap_err();
        assert!(matches!(err, AggregationError::InvalidWeights(_)));

        assert_eq!(store.get_weights().await, before);
    }

    #[tokio::test]
    async fn test_negative_weight_is_dropped_not_zeroed() {
        let store = store();

        let mut update = HashMap::new();
        update.insert("wyckoff".to_string(), json!(-5.0));
        update.insert("canslim".to_string(), json!(1.0));
        store.set_weights(&update).await.unwrap();

        let weights = store.get_weights().await;
        assert!(weights["canslim"] > weights["wyckoff"]);
        // wyckoff keeps its renormalized default contribution.
        let expected_sum = 0.20 + 0.15 + 0.20 + 0.15 + 0.15 + 1.0;
        assert!((weights["wyckoff"] - 0.20 / expected_sum).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_boolean_weight_is_dropped() {
        let store = store();

        let mut update = HashMap::new();
        update.insert("sentiment".to_string(), json!(true));
        let err = store.set_weights(&update).await.unwrap_err();
        assert!(matches!(err, AggregationError::InvalidWeights(_)));
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let store = store();

        let mut update = HashMap::new();
        update.insert("ict".to_string(), json!(10.0));
        store.set_weights(&update).await.unwrap();
        assert!(store.get_weights().await["ict"] > 0.5);

        store.reset_weights().await.unwrap();
        assert_eq!(store.get_weights().await, normalize(&default_weights()));
    }
}
