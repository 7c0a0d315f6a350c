//! Error handling for ride-duration scoring.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for ride-duration operations
#[derive(Debug, Error)]
pub enum RideDurationError {
    /// Error opening, reading or writing a local file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
    /// Error from an Arrow compute kernel or batch construction
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// Error encoding or decoding a model artifact
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Error converting typed rows to or from a record batch
    #[error("Row conversion error: {0}")]
    RowConversion(#[from] serde_arrow::Error),
    /// Remote storage was unreachable or refused the request
    #[error("Storage error for {location}: {message}")]
    Storage { location: String, message: String },
    /// A required column is absent from the input table
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    /// A column exists but has a type the operation cannot handle
    #[error("Column '{column}' has unsupported type {data_type}")]
    ColumnType { column: String, data_type: String },
    /// A categorical value could not be coerced to an integer
    #[error("Column '{column}' row {row}: cannot convert {value:?} to an integer")]
    Categorical {
        column: String,
        row: usize,
        value: String,
    },
    /// Invalid configuration or arguments
    #[error("Configuration error: {0}")]
    Config(String),
    /// Model fitting or application failed
    #[error("Model error: {0}")]
    Model(String),
}

impl RideDurationError {
    /// Create a storage error for the given location
    pub fn storage(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }
}

/// Result type for ride-duration operations
pub type Result<T> = std::result::Result<T, RideDurationError>;
