//! Speculative next-track prefetch
//!
//! At most one pending or resolved speculative track, tagged with the id
//! of the currently playing track it was computed for. The tag check on
//! consumption is the single synchronization point that keeps a result
//! computed for one context from being applied after the session has
//! moved on.

use mixflow_core::{Track, TrackId};

#[derive(Debug, Clone, Default)]
enum SlotState {
    #[default]
    Empty,

    /// A fetch is outstanding for this context
    Pending(TrackId),

    /// A track is ready for this context
    Ready(TrackId, Box<Track>),
}

/// Holder for the speculative next track
///
/// Valid for consumption only while the session's current-track id still
/// equals the context key it was created under; otherwise the slot is
/// stale and is silently discarded.
#[derive(Debug, Clone, Default)]
pub struct PrefetchSlot {
    state: SlotState,
}

impl PrefetchSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the slot is pending or resolved for `context`
    ///
    /// Used to enforce at most one outstanding prefetch per context.
    pub fn is_for(&self, context: &TrackId) -> bool {
        match &self.state {
            SlotState::Empty => false,
            SlotState::Pending(ctx) | SlotState::Ready(ctx, _) => ctx == context,
        }
    }

    /// Mark a prefetch as outstanding for `context`
    ///
    /// Anything held for an older context is dropped; it could never be
    /// consumed anyway.
    pub fn begin(&mut self, context: TrackId) {
        self.state = SlotState::Pending(context);
    }

    /// Store a resolved track if the slot is still pending for `context`
    ///
    /// A result for any other context is stale and dropped on the floor.
    pub fn fulfill(&mut self, context: &TrackId, track: Track) {
        if matches!(&self.state, SlotState::Pending(ctx) if ctx == context) {
            self.state = SlotState::Ready(context.clone(), Box::new(track));
        }
    }

    /// Clear a failed prefetch for `context`
    ///
    /// Failures are silent; the consumer falls back to a synchronous fetch
    /// when the slot turns out empty.
    pub fn fail(&mut self, context: &TrackId) {
        if matches!(&self.state, SlotState::Pending(ctx) if ctx == context) {
            self.state = SlotState::Empty;
        }
    }

    /// Take the track if it was computed for `context`
    ///
    /// Consuming always empties the slot: a tag mismatch (or a fetch still
    /// in flight) clears it as stale and yields nothing.
    pub fn consume(&mut self, context: &TrackId) -> Option<Track> {
        match std::mem::take(&mut self.state) {
            SlotState::Ready(ctx, track) if &ctx == context => Some(*track),
            _ => None,
        }
    }

    /// Drop whatever the slot holds
    pub fn clear(&mut self) {
        self.state = SlotState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

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
    fn consume_matching_context_yields_track() {
        let ctx = TrackId::from("A");
        let mut slot = PrefetchSlot::new();

        slot.begin(ctx.clone());
        slot.fulfill(&ctx, track("B"));

        let got = slot.consume(&ctx).expect("track for matching context");
        assert_eq!(got.id, TrackId::from("B"));

        // Consumed at most once
        assert!(slot.consume(&ctx).is_none());
    }

    #[test]
    fn consume_wrong_context_discards() {
        let ctx = TrackId::from("A");
        let mut slot = PrefetchSlot::new();

        slot.begin(ctx.clone());
        slot.fulfill(&ctx, track("B"));

        // Session moved to a different track before consumption
        assert!(slot.consume(&TrackId::from("C")).is_none());
        // Slot was cleared, not kept around
        assert!(slot.consume(&ctx).is_none());
    }

    #[test]
    fn stale_fulfill_is_dropped() {
        let ctx = TrackId::from("A");
        let new_ctx = TrackId::from("D");
        let mut slot = PrefetchSlot::new();

        slot.begin(ctx.clone());
        slot.begin(new_ctx.clone()); // context moved on

        // The late result for the old context leaves the slot pending
        // for the new one
        slot.fulfill(&ctx, track("B"));
        assert!(slot.is_for(&new_ctx));

        slot.fulfill(&new_ctx, track("E"));
        let got = slot.consume(&new_ctx).expect("track for live context");
        assert_eq!(got.id, TrackId::from("E"));
    }

    #[test]
    fn pending_consume_clears_slot() {
        let ctx = TrackId::from("A");
        let mut slot = PrefetchSlot::new();

        slot.begin(ctx.clone());
        // Track ended before the prefetch resolved
        assert!(slot.consume(&ctx).is_none());

        // The late result finds an empty slot and is discarded
        slot.fulfill(&ctx, track("B"));
        assert!(slot.consume(&ctx).is_none());
    }

    #[test]
    fn fail_only_clears_matching_pending() {
        let ctx = TrackId::from("A");
        let mut slot = PrefetchSlot::new();

        slot.begin(ctx.clone());
        slot.fail(&TrackId::from("other"));
        assert!(slot.is_for(&ctx));

        slot.fail(&ctx);
        assert!(!slot.is_for(&ctx));
    }
}
