//! Error types for the extractor contract

use thiserror::Error;

/// Errors from the extraction/recommendation backend
///
/// Every variant is single-attempt: the caller surfaces the failure and
/// never retries automatically (retry is a fresh user action).
#[derive(Debug, Clone, Error)]
pub enum ExtractorError {
    /// Search or lookup yielded nothing
    #[error("No results found")]
    NotFound,

    /// The upstream extraction failed
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The extraction service could not be reached
    #[error("Extraction service unreachable: {0}")]
    Unreachable(String),
}

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, ExtractorError>;
