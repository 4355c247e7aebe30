//! Mixflow Extraction Service Client
//!
//! HTTP implementation of the [`mixflow_core::Extractor`] contract against
//! the companion extraction service.
//!
//! The service wraps the actual media extraction; this client only maps
//! endpoints and error codes:
//!
//! - `GET /search/lucky?q=` - first playable result for a query
//! - `GET /search/track?video_id=` - resolve a known id
//! - `GET /search/mix?video_id=` - recommendation candidates for a track
//!
//! Calls fail fast. Retry, if desired at all, is the caller's decision and
//! happens at most once per user-visible operation.
//!
//! # Example
//!
//! ```ignore
//! use mixflow_client::{ClientConfig, ExtractorClient};
//! use mixflow_core::Extractor;
//!
//! let client = ExtractorClient::new(ClientConfig::new(
//!     "https://extract.example.com",
//!     "secret-key",
//! ))?;
//!
//! let track = client.search_by_query("daft punk around the world").await?;
//! println!("Playing {} ({})", track.title, track.id);
//! ```

mod client;
mod error;
mod types;

// Re-export main types
pub use client::ExtractorClient;
pub use error::ClientError;
pub use types::{ClientConfig, MixResponse, TrackResponse};
