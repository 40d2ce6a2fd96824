//! Error types for the data-loader crate.

use thiserror::Error;

/// Errors that can occur while loading and preparing the datasets.
///
/// Malformed embedded list fields are deliberately NOT represented here:
/// those degrade to empty values during normalization (see
/// [`crate::normalize`]) and are only counted, never raised. This enum
/// covers the fatal cases: a missing file, an unreadable file, or a file
/// that does not carry the columns the join depends on.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level error (bad quoting, wrong field count, type mismatch)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column (e.g. the join key) is absent from the header
    #[error("Column '{column}' missing from {file}")]
    MissingColumn { file: String, column: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
