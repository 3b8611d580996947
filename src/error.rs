//! Error types for the training pipeline.
//!
//! Every stage returns [`PipelineError`]; nothing is retried or recovered.
//! Non-convergence of the optimizer is not an error: it is
//! reported through [`crate::trainer::FitReport`] and a warning log line.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for every pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dataset could not be fetched or parsed as delimited text with a header.
    #[error("Source unavailable ({locator}): {reason}")]
    SourceUnavailable { locator: String, reason: String },

    /// Input to cleaning is not a well-formed numeric table.
    #[error("Invalid table input: {0}")]
    TypeInput(String),

    /// A required column is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A feature column has zero variance and the scaler was told to reject it.
    #[error("Degenerate column {column}: zero variance")]
    DegenerateColumn { column: usize },

    /// Shape mismatch between expected and actual dimensions.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A label outside {0, 1}.
    #[error("Non-binary label {value} at row {row}")]
    NonBinaryLabel { row: usize, value: f64 },

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid hyperparameter or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The metrics sink refused or failed a write.
    #[error("Metrics sink error: {0}")]
    MetricsSink(String),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn shape(expected: impl ToString, got: impl ToString) -> Self {
        PipelineError::ShapeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
