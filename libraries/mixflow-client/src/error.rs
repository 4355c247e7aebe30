//! Error types for client construction

use thiserror::Error;

/// Errors that can occur while building an extraction service client
///
/// Request-time failures are reported through
/// [`mixflow_core::ExtractorError`] instead, since that is what the
/// `Extractor` contract speaks.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid service URL
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}
