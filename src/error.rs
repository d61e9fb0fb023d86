//! Error types shared by every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by a pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input dataset does not exist
    #[error("dataset not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A required column is missing or the table has an unexpected shape
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A column fed to the estimators is not numeric
    #[error("non-numeric feature column: {0}")]
    NonNumericFeature(String),

    /// A feature or target holds an infinite value
    #[error("non-finite value in column: {0}")]
    NonFiniteValue(String),

    /// A figure could not be rendered
    #[error("display unavailable: {0}")]
    DisplayUnavailable(String),

    /// Not enough rows left to split or fit
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An estimator failed to fit
    #[error("training failed: {0}")]
    Training(String),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("model serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}
