// Per-Timeframe Consensus Breakdown

use std::collections::HashMap;

use common::numeric::{finite_or_zero, round4};
use common::signals::{MethodologySignal, TimeframeSummary, DIRECTION_NEUTRAL, TIMEFRAMES};

use crate::scoring::majority_direction;

/// Majority direction and mean confidence for each of short/medium/long.
///
/// Every timeframe key is always present in the result; a timeframe with no
/// signals gets the neutral empty summary. Signals with off-vocabulary
/// timeframes fall outside every group.
pub fn timeframe_breakdown(signals: &[MethodologySignal]) -> HashMap<String, TimeframeSummary> {
    TIMEFRAMES
        .iter()
        .map(|timeframe| {
            let group: Vec<&MethodologySignal> = signals
                .iter()
                .filter(|signal| signal.timeframe == *timeframe)
                .collect();
            (timeframe.to_string(), summarize(&group))
        })
        .collect()
}

fn summarize(group: &[&MethodologySignal]) -> TimeframeSummary {
    if group.is_empty() {
        return TimeframeSummary::empty();
    }

    let (direction, _) = majority_direction(group.iter().map(|s| s.direction.as_str()))
        .unwrap_or_else(|| (DIRECTION_NEUTRAL.to_string(), 0));
    let mean = group
        .iter()
        .map(|signal| finite_or_zero(signal.confidence))
        .sum::<f64>()
        / group.len() as f64;

    TimeframeSummary {
        direction,
        confidence: round4(mean),
        methodologies: group.iter().map(|s| s.methodology.clone()).collect(),
    }
}
