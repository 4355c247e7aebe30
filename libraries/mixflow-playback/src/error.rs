//! Error types for the playback session

use mixflow_core::ExtractorError;
use thiserror::Error;

/// User-facing playback errors
///
/// Delivered as a single dismissible current-error value on the session.
/// None of these trigger internal retry loops; retry is a fresh user
/// action. Stale asynchronous results are not errors and never surface.
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// Search yielded nothing
    #[error("No results found")]
    NotFound,

    /// An upstream fetch failed (single attempt, no automatic retry)
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// No further queue candidates; a new search is required
    #[error("Queue exhausted")]
    QueueExhausted,

    /// The stream reference could not be renewed before expiry (terminal)
    #[error("Stream expired: {0}")]
    RefreshFailed(String),

    /// The playback engine reported a failure
    #[error("Player error: {0}")]
    Adapter(String),
}

impl From<ExtractorError> for PlaybackError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::NotFound => PlaybackError::NotFound,
            ExtractorError::Extraction(msg) | ExtractorError::Unreachable(msg) => {
                PlaybackError::Extraction(msg)
            }
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
