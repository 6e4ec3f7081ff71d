use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical methodology identifiers, in presentation order.
pub const METHODOLOGIES: [&str; 6] = [
    "wyckoff",
    "elliott_wave",
    "ict",
    "canslim",
    "larry_williams",
    "sentiment",
];

/// Timeframe vocabulary, shortest first.
pub const TIMEFRAMES: [&str; 3] = ["short", "medium", "long"];

pub const DIRECTION_BULLISH: &str = "bullish";
pub const DIRECTION_BEARISH: &str = "bearish";
pub const DIRECTION_NEUTRAL: &str = "neutral";

/// Human-readable name for a canonical methodology id.
/// Unknown ids pass through unchanged.
pub fn methodology_display_name(id: &str) -> &str {
    match id {
        "wyckoff" => "Wyckoff",
        "elliott_wave" => "Elliott Wave",
        "ict" => "ICT Smart Money",
        "canslim" => "CANSLIM",
        "larry_williams" => "Larry Williams",
        "sentiment" => "Sentiment",
        other => other,
    }
}

/// One entry in a signal's `key_levels` map.
///
/// Upstream analyzers attach free-form metadata here. Only finite numeric
/// values participate in support/resistance extraction, so the variants stay
/// distinct instead of being funneled through `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Null,
}

impl LevelValue {
    /// The numeric payload, if this is a finite real number.
    /// Booleans are explicitly not numbers here.
    pub fn as_price(&self) -> Option<f64> {
        match self {
            LevelValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

/// A single methodology's verdict on one ticker.
///
/// Instances arrive from upstream analyzers and are echoed verbatim into the
/// composite output, so the string-typed fields preserve whatever the
/// producer sent; the engine scores unknown vocabulary as neutral instead of
/// rejecting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologySignal {
    pub ticker: String,
    /// One of `METHODOLOGIES`, normally.
    pub methodology: String,
    /// bullish / bearish / neutral.
    pub direction: String,
    pub confidence: f64, // 0.0 to 1.0
    /// short / medium / long.
    pub timeframe: String,
    pub reasoning: String,
    #[serde(default)]
    pub key_levels: HashMap<String, LevelValue>,
    pub timestamp: DateTime<Utc>,
}

/// Five-level composite direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeDirection {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl CompositeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeDirection::StrongBullish => "strong_bullish",
            CompositeDirection::Bullish => "bullish",
            CompositeDirection::Neutral => "neutral",
            CompositeDirection::Bearish => "bearish",
            CompositeDirection::StrongBearish => "strong_bearish",
        }
    }
}

impl fmt::Display for CompositeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Majority view of the signals sharing one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSummary {
    pub direction: String,
    /// Arithmetic mean of the group's confidences, 4 decimals.
    pub confidence: f64,
    /// Methodology ids in input order.
    pub methodologies: Vec<String>,
}

impl TimeframeSummary {
    /// The summary of a timeframe no signal covers.
    pub fn empty() -> Self {
        Self {
            direction: DIRECTION_NEUTRAL.to_string(),
            confidence: 0.0,
            methodologies: Vec::new(),
        }
    }
}

/// The fused directional recommendation for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    /// Sanitized ticker.
    pub ticker: String,
    pub overall_direction: CompositeDirection,
    pub overall_confidence: f64,
    /// Verbatim echo of the inputs.
    pub methodology_signals: Vec<MethodologySignal>,
    /// Size of the largest agreeing group, 0..6.
    pub confluence_count: usize,
    /// Keyed by `TIMEFRAMES`; every key always present.
    pub timeframe_breakdown: HashMap<String, TimeframeSummary>,
    pub trade_thesis: String,
    /// The weight map applied to this computation.
    pub weights_used: HashMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

impl CompositeSignal {
    /// Wire-shape object for downstream consumers.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Rebuild from the wire shape. Round-trips every field exactly.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_value_serde() {
        let number: LevelValue = serde_json::from_value(json!(182.5)).unwrap();
        assert_eq!(number, LevelValue::Number(182.5));
        assert_eq!(number.as_price(), Some(182.5));

        let flag: LevelValue = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(flag, LevelValue::Flag(true));
        assert_eq!(flag.as_price(), None);

        let text: LevelValue = serde_json::from_value(json!("near the highs")).unwrap();
        assert_eq!(text.as_price(), None);

        let null: LevelValue = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(null, LevelValue::Null);
        assert_eq!(null.as_price(), None);
    }

    #[test]
    fn test_non_finite_is_not_a_price() {
        assert_eq!(LevelValue::Number(f64::NAN).as_price(), None);
        assert_eq!(LevelValue::Number(f64::INFINITY).as_price(), None);
    }

    #[test]
    fn test_composite_direction_tokens() {
        assert_eq!(
            serde_json::to_value(CompositeDirection::StrongBullish).unwrap(),
            json!("strong_bullish")
        );
        assert_eq!(
            serde_json::to_value(CompositeDirection::Bearish).unwrap(),
            json!("bearish")
        );
        assert_eq!(CompositeDirection::Neutral.to_string(), "neutral");
    }

    #[test]
    fn test_methodologies_are_distinct() {
        for (i, a) in METHODOLOGIES.iter().enumerate() {
            for b in METHODOLOGIES.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
