// Engine Error Taxonomy
// Exactly one caller-facing raising condition: a weight update in which no
// entry survives validation. Storage and serde variants wrap substrate
// faults on the optional persistence paths

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregationError {
    /// No entries of a weight update survived filtering.
    #[error("invalid weight update: {0}")]
    InvalidWeights(String),

    /// Persistence substrate failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A persisted row failed to round-trip through serde.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregationError>;
