// Weighted-Consensus Scoring
// Pure math over the signal list: no I/O, no shared state. Anomalies
// (unknown vocabulary, NaN/Inf) are neutralized locally, never raised

use std::collections::HashMap;

use common::numeric::{clamp_finite, finite_or_zero};
use common::signals::{
    CompositeDirection, MethodologySignal, DIRECTION_BEARISH, DIRECTION_BULLISH,
};

use crate::weights::normalize;

/// Number of canonical methodologies in a full signal set.
pub const CANONICAL_METHODOLOGY_COUNT: usize = 6;

/// A direction's vote: bullish +1, bearish -1, anything else 0.
pub fn direction_score(direction: &str) -> f64 {
    match direction {
        DIRECTION_BULLISH => 1.0,
        DIRECTION_BEARISH => -1.0,
        _ => 0.0,
    }
}

/// Restrict a weight map to the methodologies actually present among
/// `signals`, renormalized so the restriction sums to 1.
pub fn restrict_weights(
    signals: &[MethodologySignal],
    weights: &HashMap<String, f64>,
) -> HashMap<String, f64> {
    let mut restricted: HashMap<String, f64> = HashMap::new();
    for (methodology, weight) in weights {
        if signals.iter().any(|s| &s.methodology == methodology) {
            restricted.insert(methodology.clone(), *weight);
        }
    }
    normalize(&restricted)
}

/// Weighted consensus score in [-1, 1].
///
/// Each signal contributes weight x direction x confidence; methodologies
/// absent from the weight map contribute nothing.
pub fn weighted_score(signals: &[MethodologySignal], weights: &HashMap<String, f64>) -> f64 {
    let applied = restrict_weights(signals, weights);
    let score: f64 = signals
        .iter()
        .map(|signal| {
            let weight = applied.get(&signal.methodology).copied().unwrap_or(0.0);
            weight * direction_score(&signal.direction) * finite_or_zero(signal.confidence)
        })
        .sum();
    clamp_finite(score, -1.0, 1.0)
}

/// The first-seen direction with the highest vote count, and that count.
///
/// Counting is insertion-order-stable: on a tie the direction encountered
/// first wins, keeping tie outcomes reproducible across runs.
pub fn majority_direction<'a, I>(directions: I) -> Option<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for direction in directions {
        match counts.iter_mut().find(|(seen, _)| *seen == direction) {
            Some(entry) => entry.1 += 1,
            None => counts.push((direction, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (direction, count) in counts {
        let replace = match best {
            Some((_, best_count)) => count > best_count,
            None => true,
        };
        if replace {
            best = Some((direction, count));
        }
    }
    best.map(|(direction, count)| (direction.to_string(), count))
}

/// Size of the largest identical-direction group.
pub fn confluence_count(signals: &[MethodologySignal]) -> usize {
    majority_direction(signals.iter().map(|s| s.direction.as_str()))
        .map(|(_, count)| count)
        .unwrap_or(0)
}

/// Distinct methodology ids in input order.
pub fn present_methodologies(signals: &[MethodologySignal]) -> Vec<String> {
    let mut present: Vec<String> = Vec::new();
    for signal in signals {
        if !present.contains(&signal.methodology) {
            present.push(signal.methodology.clone());
        }
    }
    present
}

/// Five-level classification with strict thresholds.
/// Exact boundary scores fall into the next lower bucket.
pub fn classify_direction(score: f64) -> CompositeDirection {
    let score = finite_or_zero(score);
    if score > 0.5 {
        CompositeDirection::StrongBullish
    } else if score > 0.15 {
        CompositeDirection::Bullish
    } else if score > -0.15 {
        CompositeDirection::Neutral
    } else if score > -0.5 {
        CompositeDirection::Bearish
    } else {
        CompositeDirection::StrongBearish
    }
}

/// Composite confidence: |score| boosted for confluence, discounted per
/// missing methodology, clamped into [0, 1].
pub fn confidence(score: f64, confluence: usize, n_present: usize, n_canonical: usize) -> f64 {
    let bonus = if confluence >= 5 {
        1.4
    } else if confluence >= 4 {
        1.2
    } else {
        1.0
    };
    // Saturating: extra off-vocabulary methodologies never inflate confidence.
    let missing = n_canonical.saturating_sub(n_present) as i32;
    let penalty = 0.9_f64.powi(missing);
    clamp_finite(finite_or_zero(score).abs() * bonus * penalty, 0.0, 1.0)
}
