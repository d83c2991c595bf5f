//! Error types for statement stitching and validation.

use thiserror::Error;

/// Result type for stitching operations.
pub type Result<T> = std::result::Result<T, QuiltError>;

/// Errors that can occur while building or validating stitched statements.
///
/// Most of the engine degrades gracefully instead of failing: malformed
/// period identifiers are skipped, filings with no usable periods contribute
/// nothing, and missing totals downgrade a validation check to a warning.
/// These variants cover the remaining genuinely failing operations, such as
/// DataFrame conversion.
#[derive(Debug, Error)]
pub enum QuiltError {
    /// A period identifier could not be parsed into a period key.
    #[error("invalid period identifier: {0}")]
    InvalidPeriodId(String),

    /// Data parsing error
    #[error("data parsing error: {0}")]
    Parse(String),

    /// Polars error
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
