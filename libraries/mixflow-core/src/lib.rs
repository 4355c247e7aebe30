//! Mixflow - Core Types
//!
//! Shared value types and collaborator contracts for the Mixflow playback
//! client.
//!
//! This crate provides:
//! - `Track` and `SkipSegment` value types
//! - The `Extractor` trait (search/fetch/candidates/refresh contract)
//! - Shared extractor error taxonomy
//!
//! # Architecture
//!
//! `mixflow-core` has no I/O of its own:
//! - No dependency on reqwest (HTTP lives in `mixflow-client`)
//! - No dependency on tokio (the session driver lives in `mixflow-playback`)
//!
//! Everything that talks to the network or to an audio engine is reached
//! through traits defined here.

mod error;
mod extractor;
pub mod types;

// Public exports
pub use error::{ExtractorError, Result};
pub use extractor::Extractor;
pub use types::{normalize_segments, SkipSegment, Track, TrackId};
