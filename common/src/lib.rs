// Shared Types for the Composite Analysis Stack
// Signal models produced by the methodology analyzers and consumed by the
// aggregation engine, plus the pure helpers both sides rely on

pub mod numeric;
pub mod sanitize;
pub mod signals;

pub use sanitize::{sanitize_ticker, MAX_TICKER_LEN};
pub use signals::{
    methodology_display_name, CompositeDirection, CompositeSignal, LevelValue, MethodologySignal,
    TimeframeSummary, DIRECTION_BEARISH, DIRECTION_BULLISH, DIRECTION_NEUTRAL, METHODOLOGIES,
    TIMEFRAMES,
};
