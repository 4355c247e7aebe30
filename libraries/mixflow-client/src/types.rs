//! Types for extraction service requests and responses.

use chrono::{DateTime, Duration, Utc};
use mixflow_core::{normalize_segments, SkipSegment, Track, TrackId};
use serde::{Deserialize, Serialize};

/// Configuration for connecting to the extraction service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service (e.g., "https://extract.example.com")
    pub url: String,
    /// API key sent as the `x-api-key` header
    pub api_key: String,
}

impl ClientConfig {
    /// Create a new client config.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

/// A playable track as returned by the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackResponse {
    pub video_id: String,
    pub stream_url: String,
    /// Unix timestamp when the stream URL expires
    pub expires_at: i64,
    pub title: String,
    pub artist: Option<String>,
    pub thumbnail: String,
    pub duration_ms: u64,
    pub skip_segments: Vec<SkipSegmentResponse>,
    /// The client MUST use this user-agent when fetching the stream
    pub user_agent: String,
}

/// A skip range as returned by the service.
///
/// Order and overlap are not guaranteed; normalization happens on
/// conversion into the core type.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkipSegmentResponse {
    pub start_ms: u64,
    pub end_ms: u64,
    pub category: String,
}

impl TrackResponse {
    /// Convert into the core track type, tagging it with the query or
    /// source it was derived from.
    pub fn into_track(self, source_query: impl Into<String>) -> Track {
        // A bogus timestamp falls back to the service's conservative
        // four-hour window rather than an immediately-expired track.
        let expires_at = DateTime::from_timestamp(self.expires_at, 0)
            .filter(|t| *t > Utc::now())
            .unwrap_or_else(|| Utc::now() + Duration::hours(4));

        let segments = self
            .skip_segments
            .into_iter()
            .map(|s| SkipSegment {
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                category: s.category,
            })
            .collect();

        Track {
            id: TrackId::new(self.video_id),
            stream_url: self.stream_url,
            expires_at,
            title: self.title,
            artist: self.artist,
            thumbnail: self.thumbnail,
            duration_ms: self.duration_ms,
            skip_segments: normalize_segments(segments),
            user_agent: self.user_agent,
            source_query: source_query.into(),
        }
    }
}

/// Recommendation candidates for a track (mix playlist).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MixResponse {
    pub video_ids: Vec<String>,
    pub mix_id: String,
}

/// Error body returned by the service on failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default)]
    pub retry_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> TrackResponse {
        TrackResponse {
            video_id: "dQw4w9WgXcQ".to_string(),
            stream_url: "https://cdn.example.com/a.webm?expire=1".to_string(),
            expires_at: (Utc::now() + Duration::hours(4)).timestamp(),
            title: "Never Gonna Give You Up".to_string(),
            artist: Some("Rick Astley".to_string()),
            thumbnail: "https://img.example.com/t.jpg".to_string(),
            duration_ms: 212_000,
            skip_segments: vec![
                SkipSegmentResponse {
                    start_ms: 90_000,
                    end_ms: 95_000,
                    category: "sponsor".to_string(),
                },
                SkipSegmentResponse {
                    start_ms: 0,
                    end_ms: 5_000,
                    category: "intro".to_string(),
                },
            ],
            user_agent: "Mozilla/5.0".to_string(),
        }
    }

    #[test]
    fn into_track_normalizes_segments_and_keeps_query() {
        let track = response().into_track("rick astley");

        assert_eq!(track.id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(track.source_query, "rick astley");
        // Segments come back sorted
        assert_eq!(track.skip_segments[0].start_ms, 0);
        assert_eq!(track.skip_segments[1].start_ms, 90_000);
    }

    #[test]
    fn into_track_rejects_past_expiry() {
        let mut resp = response();
        resp.expires_at = 1_000; // 1970
        let track = resp.into_track("q");

        assert!(track.expires_at > Utc::now());
    }

    #[test]
    fn error_body_parses_without_retry_after() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"No results found","code":"NOT_FOUND"}"#).unwrap();
        assert_eq!(body.code, "NOT_FOUND");
        assert!(body.retry_after.is_none());
    }
}
