//! Data-layer error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the vehicle table.
///
/// Malformed cells are not errors: the loader drops such rows and counts
/// them in its [`LoadReport`](super::loader::LoadReport).
#[derive(Debug, Error)]
pub enum DataError {
    /// The source file does not exist. Callers show a message and continue
    /// with an empty table.
    #[error("data file not found: {}", path.display())]
    DataUnavailable { path: PathBuf },

    /// A required column header is absent.
    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("unsupported file extension: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Whether this is the recoverable "file is missing" case.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DataError::DataUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
