//! Extraction/recommendation backend contract
//!
//! Abstracts the service that resolves queries and ids into playable
//! tracks and produces recommendation candidates for the queue.

use crate::error::Result;
use crate::types::{Track, TrackId};
use async_trait::async_trait;

/// Extraction/recommendation backend
///
/// Implementors resolve user queries and track ids into playable [`Track`]
/// values and list recommendation candidates. All calls fail fast: no
/// retry or backoff happens below this trait.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Search by free-form query and return the first playable result
    ///
    /// # Returns
    /// * `Ok(track)` - first result, ready to play
    /// * `Err(NotFound)` - search yielded nothing
    /// * `Err(Extraction(_))` - upstream extraction failed
    async fn search_by_query(&self, query: &str) -> Result<Track>;

    /// Resolve a known track id into a playable track
    async fn fetch_by_id(&self, id: &TrackId) -> Result<Track>;

    /// List recommendation candidates derived from `id`
    ///
    /// The returned list is ordered but unfiltered: it may contain `id`
    /// itself, duplicates, and already-played ids. Callers filter.
    async fn fetch_candidates(&self, id: &TrackId) -> Result<Vec<TrackId>>;

    /// Re-derive a track from its originating query to renew the stream URL
    ///
    /// The returned track's expiry is strictly after the time of the call.
    async fn refresh_by_query(&self, query: &str) -> Result<Track>;
}
