//! Played-track history
//!
//! Bounded stack of full `Track` values backing the "previous" button.
//! Holding complete tracks (not ids) keeps skip-previous free of network
//! calls: the stored stream reference is replayed as-is.

use mixflow_core::Track;
use std::collections::VecDeque;

/// Bounded history stack (most recent at the back)
///
/// Consecutive pushes of the same track id are suppressed so that repeat
/// transitions through one track do not pile up duplicate entries.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    tracks: VecDeque<Track>,
    max_size: usize,
}

impl HistoryStack {
    /// Create a new history with the given maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Push a track, discarding the oldest entry when full
    ///
    /// A push whose id equals the current top replaces it (the newer value
    /// may carry a fresher stream reference).
    pub fn push(&mut self, track: Track) {
        if let Some(top) = self.tracks.back_mut() {
            if top.id == track.id {
                *top = track;
                return;
            }
        }

        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    /// Pop the most recent track
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_back()
    }

    /// Whether a "previous" track exists
    pub fn has_previous(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Number of tracks held
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use mixflow_core::TrackId;

    fn track(id: &str) -> Track {
        Track {
            id: TrackId::from(id),
            stream_url: format!("https://cdn.example.com/{id}"),
            expires_at: Utc::now() + Duration::hours(4),
            title: format!("Track {id}"),
            artist: None,
            thumbnail: String::new(),
            duration_ms: 200_000,
            skip_segments: vec![],
            user_agent: "ua".to_string(),
            source_query: id.to_string(),
        }
    }

    #[test]
    fn push_and_pop_lifo() {
        let mut history = HistoryStack::new(10);
        history.push(track("a"));
        history.push(track("b"));

        assert_eq!(history.pop().unwrap().id, TrackId::from("b"));
        assert_eq!(history.pop().unwrap().id, TrackId::from("a"));
        assert!(history.pop().is_none());
        assert!(!history.has_previous());
    }

    #[test]
    fn consecutive_duplicates_suppressed() {
        let mut history = HistoryStack::new(10);
        history.push(track("a"));
        history.push(track("a"));
        history.push(track("b"));
        history.push(track("a"));

        assert_eq!(history.len(), 3);
    }

    #[test]
    fn duplicate_push_keeps_newest_value() {
        let mut history = HistoryStack::new(10);
        let mut first = track("a");
        first.stream_url = "https://cdn.example.com/old".to_string();
        history.push(first);

        let mut refreshed = track("a");
        refreshed.stream_url = "https://cdn.example.com/new".to_string();
        history.push(refreshed);

        assert_eq!(history.len(), 1);
        assert_eq!(history.pop().unwrap().stream_url, "https://cdn.example.com/new");
    }

    #[test]
    fn bounded_discards_oldest() {
        let mut history = HistoryStack::new(3);
        for id in ["a", "b", "c", "d"] {
            history.push(track(id));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.pop().unwrap().id, TrackId::from("d"));
        assert_eq!(history.pop().unwrap().id, TrackId::from("c"));
        assert_eq!(history.pop().unwrap().id, TrackId::from("b"));
        assert!(history.pop().is_none());
    }
}
