// Numeric Guards
// Upstream signals are allowed to be malformed; every arithmetic path in the
// engine funnels through these helpers instead of raising

/// Replace NaN and infinities with 0.0.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Clamp to `[lo, hi]` after neutralizing NaN/Inf.
pub fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    finite_or_zero(value).clamp(lo, hi)
}

/// Round to four decimal places.
pub fn round4(value: f64) -> f64 {
    (finite_or_zero(value) * 10_000.0).round() / 10_000.0
}

/// Interpret a JSON value as a usable weight.
///
/// Booleans are rejected even though weakly typed callers would coerce them
/// to 0/1; so are non-finite and negative numbers.
pub fn weight_from_json(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Bool(_) => None,
        serde_json::Value::Number(n) => {
            let v = n.as_f64()?;
            (v.is_finite() && v >= 0.0).then_some(v)
        }
        _ => None,
    }
}
