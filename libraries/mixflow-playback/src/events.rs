//! Session events
//!
//! Emitted at key transition points and drained by the driver for
//! observers. The event queue is the publish half of the session's
//! single-owner design: observers get values, never references.

use crate::types::PlaybackState;
use mixflow_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Session state changed
    StateChanged { state: PlaybackState },

    /// A different track became current
    TrackChanged {
        track_id: TrackId,
        previous_track_id: Option<TrackId>,
    },

    /// Queue content changed (populate or refill)
    QueueUpdated { remaining: usize },

    /// A skip segment fired
    SegmentSkipped {
        category: String,
        from_ms: u64,
        to_ms: u64,
    },

    /// The current track's stream reference was renewed in place
    StreamRefreshed { track_id: TrackId },

    /// No further candidates; a new search is required
    QueueExhausted,

    /// A user-facing error was set
    Error { message: String },
}
