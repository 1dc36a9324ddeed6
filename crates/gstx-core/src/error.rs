//! Error types for the gstx-core library.

use thiserror::Error;

/// Main error type for the gstx library.
#[derive(Error, Debug)]
pub enum GstxError {
    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to invoice field extraction.
///
/// A field that cannot be found is not an error; these cover input and
/// rule-table problems only.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The input contained no text to match against.
    #[error("no invoice text to extract from")]
    NoData,

    /// A custom extraction rule failed to compile.
    #[error("invalid pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for the gstx library.
pub type Result<T> = std::result::Result<T, GstxError>;
