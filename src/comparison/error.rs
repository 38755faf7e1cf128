// Error taxonomy for the assumption-driven comparator
//
// Every variant is a data-quality problem: nothing here is transient, so
// callers never retry. A comparison either yields a complete TestResult or
// one of these errors.

use thiserror::Error;

/// Errors raised while checking assumptions or running a two-sample test
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("Insufficient data in group '{label}': need at least {required} observations, got {actual}")]
    InsufficientData {
        label: String,
        required: usize,
        actual: usize,
    },

    #[error("Invalid group count: expected exactly {expected} non-empty groups, got {actual}")]
    InvalidGroupCount { expected: usize, actual: usize },

    #[error("Degenerate sample in group '{label}': {reason}")]
    DegenerateSample { label: String, reason: String },

    #[error("Non-finite observation in group '{label}' at index {index}")]
    NonFiniteObservation { label: String, index: usize },

    #[error("Invalid significance level: {0} (must be in the open interval (0, 1))")]
    InvalidSignificanceLevel(f64),

    #[error("Numeric computation failed: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, ComparisonError>;
