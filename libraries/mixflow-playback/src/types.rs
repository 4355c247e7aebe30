//! Core types for the playback session

use mixflow_core::TrackId;
use serde::{Deserialize, Serialize};

/// Playback session state
///
/// `Buffering` is a transient sub-state entered from `Loading`/`Playing`
/// while the engine rebuffers. Errors are not a state; they live in the
/// session's dismissible current-error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No session active
    Idle,

    /// Resolving a track (initial search or loading the next track)
    Loading,

    /// Playback running
    Playing,

    /// Paused mid-track
    Paused,

    /// Engine rebuffering
    Buffering,
}

/// Configuration for the playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum history size (default: 50)
    pub history_size: usize,

    /// Refill the queue when unconsumed entries drop to this (default: 3)
    pub refill_threshold: usize,

    /// Refresh the stream URL this close to expiry (default: 30 minutes)
    pub expiry_buffer_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            refill_threshold: 3,
            expiry_buffer_secs: 30 * 60,
        }
    }
}

/// Track metadata exposed to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTrack {
    pub id: TrackId,
    pub title: String,
    pub artist: Option<String>,
    pub thumbnail: String,
    pub duration_ms: u64,
}

/// Read-only view of the session for observers (UI)
///
/// Published on change; observers never hold references into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub track: Option<SnapshotTrack>,
    pub position_ms: u64,
    pub queue_remaining: usize,
    pub has_previous: bool,
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            track: None,
            position_ms: 0,
            queue_remaining: 0,
            has_previous: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.history_size, 50);
        assert_eq!(config.refill_threshold, 3);
        assert_eq!(config.expiry_buffer_secs, 1800);
    }

    #[test]
    fn default_snapshot_is_idle() {
        let snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert!(snapshot.track.is_none());
        assert!(snapshot.error.is_none());
    }
}
