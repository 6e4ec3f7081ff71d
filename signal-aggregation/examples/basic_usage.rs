// End-to-end walkthrough: configure weights, aggregate, cache, read back

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use common::signals::{LevelValue, MethodologySignal};
use signal_aggregation::{CompositeAggregator, MemoryStore, ResultCache, WeightStore};

fn sample_signal(
    methodology: &str,
    direction: &str,
    confidence: f64,
    timeframe: &str,
) -> MethodologySignal {
    let mut key_levels = HashMap::new();
    key_levels.insert("support".to_string(), LevelValue::Number(182.50));
    key_levels.insert("resistance".to_string(), LevelValue::Number(195.00));

    MethodologySignal {
        ticker: "AAPL".to_string(),
        methodology: methodology.to_string(),
        direction: direction.to_string(),
        confidence,
        timeframe: timeframe.to_string(),
        reasoning: format!("{methodology} sees {direction} structure"),
        key_levels,
        timestamp: Utc::now(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let store = Arc::new(MemoryStore::new());
    let weights = WeightStore::new(store.clone());
    let cache = ResultCache::new(store.clone());

    // Tilt the configuration toward price-structure methodologies.
    let mut update = HashMap::new();
    update.insert("wyckoff".to_string(), json!(0.3));
    update.insert("ict".to_string(), json!(0.3));
    weights.set_weights(&update).await?;

    let aggregator = CompositeAggregator::new(weights);

    let signals = vec![
        sample_signal("wyckoff", "bullish", 0.82, "medium"),
        sample_signal("elliott_wave", "bullish", 0.74, "medium"),
        sample_signal("ict", "bullish", 0.69, "short"),
        sample_signal("canslim", "neutral", 0.55, "long"),
        sample_signal("sentiment", "bearish", 0.40, "short"),
    ];

    let composite = aggregator.aggregate("AAPL", &signals, None).await;
    println!(
        "{} -> {} ({:.0}% confidence, {}/6 confluence)",
        composite.ticker,
        composite.overall_direction,
        composite.overall_confidence * 100.0,
        composite.confluence_count,
    );
    println!("{}", composite.trade_thesis);

    cache
        .cache_result(&composite, &signals, &composite.weights_used)
        .await?;
    let cached = cache.get_cached_result("aapl", 60).await?;
    println!("cache hit: {}", cached.is_some());

    Ok(())
}
