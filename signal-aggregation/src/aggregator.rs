// Composite Aggregation Facade
// Orchestrates sanitization, scoring, timeframe grouping, and thesis
// synthesis into one CompositeSignal. Performs no writes of its own; callers
// decide separately whether to cache the result

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use common::sanitize::sanitize_ticker;
use common::signals::{
    CompositeDirection, CompositeSignal, MethodologySignal, TimeframeSummary, TIMEFRAMES,
};

use crate::scoring;
use crate::thesis::{self, ThesisFacts};
use crate::timeframes::timeframe_breakdown;
use crate::weights::{normalize, WeightStore};

/// Fewest signals accepted before falling back to the neutral answer.
pub const MIN_SIGNALS: usize = 2;

/// Tuning for the aggregation facade.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub min_signals: usize,
    /// Confidence reported on the neutral fallback.
    pub fallback_confidence: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            min_signals: MIN_SIGNALS,
            fallback_confidence: 0.1,
        }
    }
}

/// Fuses methodology signals into one composite directional view.
pub struct CompositeAggregator {
    weights: WeightStore,
    config: AggregatorConfig,
}

impl CompositeAggregator {
    pub fn new(weights: WeightStore) -> Self {
        Self {
            weights,
            config: AggregatorConfig::default(),
        }
    }

    pub fn with_config(weights: WeightStore, config: AggregatorConfig) -> Self {
        Self { weights, config }
    }

    /// Fuse `signals` into a composite view of `ticker`.
    ///
    /// Never fails: an empty or too-short signal list yields an explicitly
    /// low-confidence neutral answer instead of an error, and malformed
    /// upstream values are neutralized where they occur.
    pub async fn aggregate(
        &self,
        ticker: &str,
        signals: &[MethodologySignal],
        weights: Option<&HashMap<String, f64>>,
    ) -> CompositeSignal {
        let ticker = sanitize_ticker(ticker);

        if signals.len() < self.config.min_signals {
            debug!(
                ticker = %ticker,
                count = signals.len(),
                "too few signals, returning neutral fallback"
            );
            return self.insufficient(ticker, signals);
        }

        let resolved = match weights {
            Some(map) => normalize(map),
            None => self.weights.get_weights().await,
        };

        let score = scoring::weighted_score(signals, &resolved);
        let confluence = scoring::confluence_count(signals);
        let direction = scoring::classify_direction(score);
        let present = scoring::present_methodologies(signals);
        let confidence = scoring::confidence(
            score,
            confluence,
            present.len(),
            scoring::CANONICAL_METHODOLOGY_COUNT,
        );
        let breakdown = timeframe_breakdown(signals);

        let facts = ThesisFacts::gather(
            &ticker,
            direction,
            confidence,
            confluence,
            &breakdown,
            signals,
        );
        let trade_thesis = thesis::compose(&facts);

        debug!(
            ticker = %ticker,
            direction = %direction,
            score,
            confidence,
            confluence,
            "aggregated composite signal"
        );

        CompositeSignal {
            ticker,
            overall_direction: direction,
            overall_confidence: confidence,
            methodology_signals: signals.to_vec(),
            confluence_count: confluence,
            timeframe_breakdown: breakdown,
            trade_thesis,
            weights_used: resolved,
            timestamp: Utc::now(),
        }
    }

    fn insufficient(&self, ticker: String, signals: &[MethodologySignal]) -> CompositeSignal {
        let breakdown = TIMEFRAMES
            .iter()
            .map(|timeframe| (timeframe.to_string(), TimeframeSummary::empty()))
            .collect();

        CompositeSignal {
            ticker,
            overall_direction: CompositeDirection::Neutral,
            overall_confidence: self.config.fallback_confidence,
            methodology_signals: signals.to_vec(),
            confluence_count: 0,
            timeframe_breakdown: breakdown,
            trade_thesis: thesis::insufficient_signals_thesis(
                signals.len(),
                self.config.min_signals,
            ),
            weights_used: HashMap::new(),
            timestamp: Utc::now(),
        }
    }
}
