// Trade-Thesis Synthesis
// Purely templated text over a precomputed facts struct. No scoring logic
// lives here, so the formatting is testable in isolation

use std::collections::HashMap;

use common::numeric::finite_or_zero;
use common::signals::{
    methodology_display_name, CompositeDirection, LevelValue, MethodologySignal,
    TimeframeSummary, METHODOLOGIES, TIMEFRAMES,
};

use crate::scoring::present_methodologies;

/// Everything the thesis template needs, precomputed.
#[derive(Debug, Clone)]
pub struct ThesisFacts {
    pub ticker: String,
    pub direction: CompositeDirection,
    pub confidence: f64,
    pub confluence_count: usize,
    /// Non-empty timeframe summaries, short/medium/long order.
    pub timeframes: Vec<(String, TimeframeSummary)>,
    /// Highest-confidence methodology ids, input order.
    pub strongest: Vec<String>,
    /// Lowest-confidence methodology ids, input order.
    pub weakest: Vec<String>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    /// Canonical ids absent from the input.
    pub missing: Vec<String>,
}

impl ThesisFacts {
    pub fn gather(
        ticker: &str,
        direction: CompositeDirection,
        confidence: f64,
        confluence_count: usize,
        breakdown: &HashMap<String, TimeframeSummary>,
        signals: &[MethodologySignal],
    ) -> Self {
        let timeframes = TIMEFRAMES
            .iter()
            .filter_map(|timeframe| {
                breakdown
                    .get(*timeframe)
                    .filter(|summary| !summary.methodologies.is_empty())
                    .map(|summary| (timeframe.to_string(), summary.clone()))
            })
            .collect();

        let (strongest, weakest) = extreme_confidence_methodologies(signals);
        let present = present_methodologies(signals);
        let missing = METHODOLOGIES
            .iter()
            .filter(|methodology| !present.iter().any(|p| p == *methodology))
            .map(|methodology| methodology.to_string())
            .collect();

        Self {
            ticker: ticker.to_string(),
            direction,
            confidence,
            confluence_count,
            timeframes,
            strongest,
            weakest,
            support: extract_level(signals, "support"),
            resistance: extract_level(signals, "resistance"),
            missing,
        }
    }
}

/// Render the thesis text. Deterministic for identical facts.
pub fn compose(facts: &ThesisFacts) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "{} composite view: {} with {:.0}% confidence ({}/6 methodologies in confluence).",
        facts.ticker,
        facts.direction,
        facts.confidence * 100.0,
        facts.confluence_count,
    ));

    for (timeframe, summary) in &facts.timeframes {
        lines.push(format!(
            "{}-term: {} ({:.0}% avg confidence) via {}.",
            capitalize(timeframe),
            summary.direction,
            summary.confidence * 100.0,
            summary.methodologies.join(", "),
        ));
    }

    if !facts.strongest.is_empty() {
        lines.push(format!("Strongest signals: {}.", display_names(&facts.strongest)));
    }
    if !facts.weakest.is_empty() {
        lines.push(format!("Weakest signals: {}.", display_names(&facts.weakest)));
    }

    lines.push(match facts.support {
        Some(level) => format!("Key support: ${level:.2}"),
        None => "Key support: N/A".to_string(),
    });
    lines.push(match facts.resistance {
        Some(level) => format!("Key resistance: ${level:.2}"),
        None => "Key resistance: N/A".to_string(),
    });

    if !facts.missing.is_empty() {
        lines.push(format!("Missing methodologies: {}.", facts.missing.join(", ")));
    }

    lines.join("\n")
}

/// Fixed sentence used when too few signals are available.
pub fn insufficient_signals_thesis(n: usize, min_required: usize) -> String {
    format!("Insufficient signals ({n}). Minimum {min_required} required for composite analysis.")
}

/// The most frequent finite numeric value stored under `key` across all
/// signals' key levels. Ties resolve to the first-seen value; booleans and
/// non-numeric payloads never qualify.
pub fn extract_level(signals: &[MethodologySignal], key: &str) -> Option<f64> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for signal in signals {
        let Some(value) = signal.key_levels.get(key).and_then(LevelValue::as_price) else {
            continue;
        };
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some(entry) => entry.1 += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (value, count) in counts {
        let replace = match best {
            Some((_, best_count)) => count > best_count,
            None => true,
        };
        if replace {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Highest- and lowest-confidence methodology ids, ties kept in input order.
fn extreme_confidence_methodologies(
    signals: &[MethodologySignal],
) -> (Vec<String>, Vec<String>) {
    if signals.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let confidences: Vec<f64> = signals
        .iter()
        .map(|signal| finite_or_zero(signal.confidence))
        .collect();
    let max = confidences.iter().copied().fold(f64::MIN, f64::max);
    let min = confidences.iter().copied().fold(f64::MAX, f64::min);

    let pick = |target: f64| -> Vec<String> {
        signals
            .iter()
            .zip(&confidences)
            .filter(|(_, confidence)| **confidence == target)
            .map(|(signal, _)| signal.methodology.clone())
            .collect()
    };

    (pick(max), pick(min))
}

fn display_names(ids: &[String]) -> String {
    ids.iter()
        .map(|id| methodology_display_name(id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
