//! Core value types for playback

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stable, opaque track identifier
///
/// Identifies a track across extraction calls. The inner string comes from
/// the extraction backend and is never interpreted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A time range within a track to be bypassed automatically during playback
///
/// Segment lists come from the extraction backend unsorted and possibly
/// overlapping; consumers must run them through [`normalize_segments`]
/// before relying on ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipSegment {
    /// Segment start (milliseconds from track start)
    pub start_ms: u64,

    /// Segment end (milliseconds from track start, exclusive)
    pub end_ms: u64,

    /// Free-form category label ("sponsor", "intro", "outro", ...)
    pub category: String,
}

/// A playable track with its time-limited stream reference
///
/// Created by an extractor fetch and dropped when superseded by the next
/// playing track, except when pushed onto the history stack. The stream
/// URL expires; `source_query` is kept so the track can be re-derived on
/// refresh without a new user search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier from the extraction backend
    pub id: TrackId,

    /// Direct audio stream URL (opaque, time-limited)
    pub stream_url: String,

    /// When the stream URL stops working
    pub expires_at: DateTime<Utc>,

    /// Track title
    pub title: String,

    /// Artist name (optional - not every upload carries one)
    pub artist: Option<String>,

    /// Thumbnail image URL
    pub thumbnail: String,

    /// Track duration in milliseconds
    pub duration_ms: u64,

    /// Ranges to skip automatically, normalized on construction
    pub skip_segments: Vec<SkipSegment>,

    /// User-agent string the playback engine must attach to stream requests
    pub user_agent: String,

    /// The query or source tag this track was derived from (used for refresh)
    pub source_query: String,
}

impl Track {
    /// Check whether the stream URL is within `buffer` of expiring
    ///
    /// Also true when the URL has already expired.
    pub fn is_near_expiry(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at - now <= buffer
    }
}

/// Sort segments by start and merge overlapping or touching ranges
///
/// The extraction backend does not guarantee ordering or non-overlap, while
/// the skip monitor's earliest-window search assumes both. Empty ranges
/// (end <= start) are dropped. When two ranges merge, the earlier one's
/// category is kept.
pub fn normalize_segments(mut segments: Vec<SkipSegment>) -> Vec<SkipSegment> {
    segments.retain(|s| s.end_ms > s.start_ms);
    segments.sort_by_key(|s| (s.start_ms, s.end_ms));

    let mut merged: Vec<SkipSegment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match merged.last_mut() {
            Some(last) if seg.start_ms <= last.end_ms => {
                last.end_ms = last.end_ms.max(seg.end_ms);
            }
            _ => merged.push(seg),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start_ms: u64, end_ms: u64, category: &str) -> SkipSegment {
        SkipSegment {
            start_ms,
            end_ms,
            category: category.to_string(),
        }
    }

    fn test_track(expires_at: DateTime<Utc>) -> Track {
        Track {
            id: TrackId::new("abc123"),
            stream_url: "https://cdn.example.com/stream?sig=xyz".to_string(),
            expires_at,
            title: "Test Song".to_string(),
            artist: Some("Test Artist".to_string()),
            thumbnail: "https://img.example.com/abc123.jpg".to_string(),
            duration_ms: 180_000,
            skip_segments: vec![],
            user_agent: "Mozilla/5.0".to_string(),
            source_query: "test artist test song".to_string(),
        }
    }

    #[test]
    fn near_expiry_within_buffer() {
        let now = Utc::now();
        let track = test_track(now + Duration::minutes(20));

        assert!(track.is_near_expiry(now, Duration::minutes(30)));
        assert!(!track.is_near_expiry(now, Duration::minutes(10)));
    }

    #[test]
    fn already_expired_counts_as_near_expiry() {
        let now = Utc::now();
        let track = test_track(now - Duration::minutes(5));

        assert!(track.is_near_expiry(now, Duration::minutes(30)));
        assert!(track.is_near_expiry(now, Duration::zero()));
    }

    #[test]
    fn normalize_sorts_by_start() {
        let segments = vec![seg(590_000, 610_000, "sponsor"), seg(0, 15_000, "intro")];

        let normalized = normalize_segments(segments);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].start_ms, 0);
        assert_eq!(normalized[1].start_ms, 590_000);
    }

    #[test]
    fn normalize_merges_overlapping() {
        let segments = vec![
            seg(1_000, 5_000, "sponsor"),
            seg(4_000, 8_000, "selfpromo"),
            seg(20_000, 25_000, "outro"),
        ];

        let normalized = normalize_segments(segments);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].start_ms, 1_000);
        assert_eq!(normalized[0].end_ms, 8_000);
        assert_eq!(normalized[0].category, "sponsor");
        assert_eq!(normalized[1].start_ms, 20_000);
    }

    #[test]
    fn normalize_merges_contained_and_touching() {
        let segments = vec![
            seg(1_000, 10_000, "sponsor"),
            seg(2_000, 3_000, "intro"),
            seg(10_000, 12_000, "outro"),
        ];

        let normalized = normalize_segments(segments);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].start_ms, 1_000);
        assert_eq!(normalized[0].end_ms, 12_000);
    }

    #[test]
    fn normalize_drops_empty_ranges() {
        let segments = vec![seg(5_000, 5_000, "sponsor"), seg(9_000, 4_000, "broken")];

        assert!(normalize_segments(segments).is_empty());
    }
}
