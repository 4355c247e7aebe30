//! Playback session state machine
//!
//! Single owner of all playback state. Every mutation happens on one
//! sequential context: callers invoke command methods, which return
//! [`FetchRequest`] directives describing the asynchronous work to run.
//! The driver executes those against an extractor and feeds results back
//! through the `apply_*` methods, tagged with the context they were
//! requested under. A tag that no longer matches means the session moved
//! on while the work was in flight; the result is discarded without side
//! effects. In-flight work is never cancelled, only invalidated.

use crate::adapter::{PlayerAdapter, PlayerEvent};
use crate::error::PlaybackError;
use crate::events::SessionEvent;
use crate::history::HistoryStack;
use crate::monitor::{MonitorAction, SegmentMonitor};
use crate::prefetch::PrefetchSlot;
use crate::queue::PlayQueue;
use crate::types::{PlaybackState, SessionConfig, SessionSnapshot, SnapshotTrack};
use chrono::{DateTime, Duration as TimeDelta, Utc};
use mixflow_core::{Track, TrackId};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Slow check cadence while nothing is playing
const PAUSED_POLL: Duration = Duration::from_millis(2000);

/// Asynchronous work the driver must run on the session's behalf
///
/// Each request carries the tag the eventual result must be validated
/// against: the search sequence number for searches, the current-track
/// id for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Resolve a user query into a playable track
    Search { seq: u64, query: String },

    /// Fetch recommendation candidates seeded by the current track
    Candidates { context: TrackId },

    /// Speculatively resolve the likely next track
    Prefetch { context: TrackId, id: TrackId },

    /// Resolve the next track to play right now (prefetch missed)
    NextTrack { context: TrackId, id: TrackId },

    /// Renew the current track's stream reference before expiry
    Refresh { context: TrackId, query: String },
}

/// The continuous playback session
///
/// Owns the queue, history, prefetch slot, segment monitor, and the
/// playback engine handle. Not `Sync`; exactly one task drives it.
pub struct PlaybackSession {
    state: PlaybackState,
    current: Option<Track>,
    queue: PlayQueue,
    played: HashSet<TrackId>,
    history: HistoryStack,
    prefetch: PrefetchSlot,
    monitor: SegmentMonitor,
    adapter: Box<dyn PlayerAdapter>,
    config: SessionConfig,

    /// Dismissible user-facing error, independent of `state`
    current_error: Option<PlaybackError>,

    /// Id the outstanding next-track fetch was issued for
    pending_next: Option<TrackId>,

    /// At most one candidates fetch in flight
    candidates_in_flight: bool,

    /// At most one refresh in flight
    refresh_in_flight: bool,

    /// Monotonic search counter; stale search results carry an older value
    search_seq: u64,

    events: Vec<SessionEvent>,
}

impl PlaybackSession {
    pub fn new(adapter: Box<dyn PlayerAdapter>, config: SessionConfig) -> Self {
        let history = HistoryStack::new(config.history_size);
        Self {
            state: PlaybackState::Idle,
            current: None,
            queue: PlayQueue::new(),
            played: HashSet::new(),
            history,
            prefetch: PrefetchSlot::new(),
            monitor: SegmentMonitor::new(),
            adapter,
            config,
            current_error: None,
            pending_next: None,
            candidates_in_flight: false,
            refresh_in_flight: false,
            search_seq: 0,
            events: Vec::new(),
        }
    }

    // ---- user commands ----

    /// Start a new listening session from a user query
    ///
    /// Resets the queue and prefetch slot; history and the played set
    /// survive, so tracks already heard this session stay filtered out
    /// of the new queue. Whatever is currently playing keeps playing
    /// until the new track resolves and replaces it.
    pub fn begin_search(&mut self, query: impl Into<String>) -> FetchRequest {
        let query = query.into();
        info!(query = %query, "starting new search");

        self.search_seq += 1;
        self.queue.reset();
        self.prefetch.clear();
        self.pending_next = None;
        self.candidates_in_flight = false;
        self.current_error = None;
        self.set_state(PlaybackState::Loading);

        FetchRequest::Search {
            seq: self.search_seq,
            query,
        }
    }

    /// Resume from pause
    pub fn play(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        match self.adapter.play() {
            Ok(()) => self.set_state(PlaybackState::Playing),
            Err(e) => self.set_error(e),
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Buffering) {
            return;
        }
        match self.adapter.pause() {
            Ok(()) => self.set_state(PlaybackState::Paused),
            Err(e) => self.set_error(e),
        }
    }

    /// Seek within the current track
    pub fn seek_to(&mut self, position_ms: u64) {
        if self.current.is_none() {
            return;
        }
        if let Err(e) = self.adapter.seek_to(position_ms) {
            self.set_error(e);
        }
    }

    /// Advance to the next track immediately
    ///
    /// Identical to the natural end-of-track transition.
    pub fn skip_next(&mut self) -> Vec<FetchRequest> {
        self.handle_ended()
    }

    /// Replay the most recent history entry
    ///
    /// Pure local operation: the stored stream reference is loaded as-is,
    /// with no network round trip. Queue, played set, and history beyond
    /// the popped entry are untouched.
    pub fn skip_previous(&mut self) {
        let Some(track) = self.history.pop() else {
            return;
        };
        debug!(track_id = %track.id, "replaying from history");

        let previous_id = self.current.as_ref().map(|t| t.id.clone());
        let track_id = track.id.clone();
        self.monitor.arm(&track.skip_segments);
        let outcome = self
            .adapter
            .load(&track.stream_url, &track.user_agent, true)
            .and_then(|()| self.adapter.play());
        self.current = Some(track);

        match outcome {
            Ok(()) => {
                self.set_state(PlaybackState::Playing);
                self.push_event(SessionEvent::TrackChanged {
                    track_id,
                    previous_track_id: previous_id,
                });
            }
            Err(e) => self.set_error(e),
        }
    }

    /// Clear the current user-facing error
    pub fn dismiss_error(&mut self) {
        self.current_error = None;
    }

    // ---- result delivery ----

    /// Deliver a search result
    ///
    /// A sequence number older than the latest search means the user
    /// searched again while this was in flight; the result is dropped.
    pub fn apply_search(
        &mut self,
        seq: u64,
        result: mixflow_core::Result<Track>,
    ) -> Vec<FetchRequest> {
        if seq != self.search_seq {
            debug!(seq, latest = self.search_seq, "discarding stale search result");
            return Vec::new();
        }
        match result {
            Ok(track) => self.start_track(track, false),
            Err(e) => {
                warn!(error = %e, "search failed");
                self.stop_with_error(e.into());
                Vec::new()
            }
        }
    }

    /// Deliver a candidates result
    ///
    /// Valid only while the track it was seeded by is still current.
    /// Installs a fresh queue when the queue is empty, appends otherwise.
    pub fn apply_candidates(
        &mut self,
        context: &TrackId,
        result: mixflow_core::Result<Vec<TrackId>>,
    ) -> Vec<FetchRequest> {
        // The guard clears on arrival either way; the fetch is no longer
        // outstanding even when its result turns out stale.
        self.candidates_in_flight = false;

        let current_id = match self.current.as_ref() {
            Some(t) if &t.id == context => t.id.clone(),
            _ => {
                debug!(context = %context, "discarding stale candidates result");
                return Vec::new();
            }
        };

        match result {
            Ok(candidates) => {
                if self.queue.is_empty() {
                    self.queue.populate(&current_id, candidates, &self.played);
                } else {
                    self.queue.refill(&current_id, candidates, &self.played);
                }
                debug!(remaining = self.queue.remaining(), "queue updated");
                self.push_event(SessionEvent::QueueUpdated {
                    remaining: self.queue.remaining(),
                });

                self.maybe_prefetch().into_iter().collect()
            }
            Err(e) => {
                // Candidate fetches fail silently; playback continues and
                // the next track-start retriggers the fetch.
                warn!(error = %e, "candidates fetch failed");
                Vec::new()
            }
        }
    }

    /// Deliver a prefetch result
    ///
    /// Failures are silent; a missed prefetch just means a synchronous
    /// fetch at the next transition.
    pub fn apply_prefetch(&mut self, context: &TrackId, result: mixflow_core::Result<Track>) {
        match result {
            Ok(track) => {
                debug!(context = %context, track_id = %track.id, "prefetch resolved");
                self.prefetch.fulfill(context, track);
            }
            Err(e) => {
                warn!(context = %context, error = %e, "prefetch failed");
                self.prefetch.fail(context);
            }
        }
    }

    /// Deliver a synchronously awaited next-track result
    pub fn apply_next_track(
        &mut self,
        id: &TrackId,
        result: mixflow_core::Result<Track>,
    ) -> Vec<FetchRequest> {
        if self.pending_next.as_ref() != Some(id) {
            debug!(track_id = %id, "discarding stale next-track result");
            return Vec::new();
        }
        self.pending_next = None;

        match result {
            Ok(track) => {
                self.queue.advance_past(id);
                self.start_track(track, false)
            }
            Err(e) => {
                warn!(track_id = %id, error = %e, "next-track fetch failed");
                self.stop_with_error(e.into());
                Vec::new()
            }
        }
    }

    /// Deliver a stream refresh result
    ///
    /// On success the fresh stream reference is swapped in place: same
    /// track, same position, pause state preserved. On failure playback
    /// stops; the expiring URL cannot be trusted past its deadline.
    pub fn apply_refresh(&mut self, context: &TrackId, result: mixflow_core::Result<Track>) {
        self.refresh_in_flight = false;

        let position = self.adapter.position_ms();
        let was_paused = self.state == PlaybackState::Paused;

        let Some(current) = self.current.as_mut() else {
            return;
        };
        if &current.id != context {
            debug!(context = %context, "discarding stale refresh result");
            return;
        }

        match result {
            Ok(fresh) => {
                current.stream_url = fresh.stream_url;
                current.user_agent = fresh.user_agent;
                current.expires_at = fresh.expires_at;
                let url = current.stream_url.clone();
                let user_agent = current.user_agent.clone();
                let track_id = current.id.clone();

                let outcome = self
                    .adapter
                    .load(&url, &user_agent, false)
                    .and_then(|()| self.adapter.seek_to(position))
                    .and_then(|()| {
                        if was_paused {
                            Ok(())
                        } else {
                            self.adapter.play()
                        }
                    });

                match outcome {
                    Ok(()) => {
                        info!(track_id = %track_id, "stream reference renewed");
                        self.push_event(SessionEvent::StreamRefreshed { track_id });
                    }
                    Err(e) => self.stop_with_error(e),
                }
            }
            Err(e) => {
                warn!(context = %context, error = %e, "stream refresh failed");
                self.stop_with_error(PlaybackError::RefreshFailed(e.to_string()));
            }
        }
    }

    // ---- engine callbacks ----

    /// Deliver a playback engine state change
    pub fn on_player_event(&mut self, event: PlayerEvent) -> Vec<FetchRequest> {
        match event {
            PlayerEvent::Buffering => {
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
                    self.set_state(PlaybackState::Buffering);
                }
                Vec::new()
            }
            PlayerEvent::Playing => {
                if self.current.is_some() {
                    self.set_state(PlaybackState::Playing);
                }
                Vec::new()
            }
            PlayerEvent::Paused => {
                if self.current.is_some() {
                    self.set_state(PlaybackState::Paused);
                }
                Vec::new()
            }
            PlayerEvent::Ended => self.handle_ended(),
            PlayerEvent::Error(message) => {
                self.stop_with_error(PlaybackError::Adapter(message));
                Vec::new()
            }
        }
    }

    // ---- periodic checks ----

    /// Run one skip-segment check
    ///
    /// Returns the delay until the next check. Fired segments seek the
    /// engine past the segment end.
    pub fn skip_check(&mut self) -> Duration {
        if self.state != PlaybackState::Playing || self.monitor.is_disabled() {
            return PAUSED_POLL;
        }

        let position = self.adapter.position_ms();
        match self.monitor.check(position) {
            MonitorAction::Seek { to_ms, category } => {
                debug!(category = %category, from_ms = position, to_ms, "skipping segment");
                if let Err(e) = self.adapter.seek_to(to_ms) {
                    self.set_error(e);
                }
                self.push_event(SessionEvent::SegmentSkipped {
                    category,
                    from_ms: position,
                    to_ms,
                });
                self.monitor.next_delay(to_ms)
            }
            MonitorAction::Poll(delay) => delay,
        }
    }

    /// Check whether the current stream reference needs renewing
    ///
    /// Run periodically while a session is active. Returns a refresh
    /// directive when the track is within the expiry buffer and no
    /// refresh is already outstanding.
    pub fn expiry_tick(&mut self, now: DateTime<Utc>) -> Option<FetchRequest> {
        if self.refresh_in_flight {
            return None;
        }
        if !matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Buffering
        ) {
            return None;
        }

        let track = self.current.as_ref()?;
        let buffer = TimeDelta::seconds(self.config.expiry_buffer_secs);
        if !track.is_near_expiry(now, buffer) {
            return None;
        }

        info!(track_id = %track.id, expires_at = %track.expires_at, "stream near expiry");
        self.refresh_in_flight = true;
        Some(FetchRequest::Refresh {
            context: track.id.clone(),
            query: track.source_query.clone(),
        })
    }

    // ---- observation ----

    /// Read-only view for observers
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            track: self.current.as_ref().map(|t| SnapshotTrack {
                id: t.id.clone(),
                title: t.title.clone(),
                artist: t.artist.clone(),
                thumbnail: t.thumbnail.clone(),
                duration_ms: t.duration_ms,
            }),
            position_ms: if self.current.is_some() {
                self.adapter.position_ms()
            } else {
                0
            },
            queue_remaining: self.queue.remaining(),
            has_previous: self.history.has_previous(),
            error: self.current_error.as_ref().map(ToString::to_string),
        }
    }

    /// Drain accumulated events
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn current_error(&self) -> Option<&PlaybackError> {
        self.current_error.as_ref()
    }

    // ---- internals ----

    /// Make `track` current and start it from the beginning
    ///
    /// The current-track id is the tag every context-keyed result is
    /// validated against, so it is updated before any follow-up work is
    /// computed. Follow-up directives: a candidates fetch when the queue
    /// is running low, a prefetch for the likely next track.
    fn start_track(&mut self, track: Track, push_current_to_history: bool) -> Vec<FetchRequest> {
        let previous_id = self.current.as_ref().map(|t| t.id.clone());
        let track_id = track.id.clone();
        info!(track_id = %track_id, title = %track.title, "starting track");

        if push_current_to_history {
            if let Some(outgoing) = self.current.take() {
                self.history.push(outgoing);
            }
        }

        self.played.insert(track_id.clone());
        self.monitor.arm(&track.skip_segments);

        let outcome = self
            .adapter
            .load(&track.stream_url, &track.user_agent, true)
            .and_then(|()| self.adapter.play());

        self.current = Some(track);

        if let Err(e) = outcome {
            self.set_error(e);
            return Vec::new();
        }

        self.set_state(PlaybackState::Playing);
        self.push_event(SessionEvent::TrackChanged {
            track_id,
            previous_track_id: previous_id,
        });

        let mut requests = Vec::new();
        if let Some(req) = self.maybe_fetch_candidates() {
            requests.push(req);
        }
        if let Some(req) = self.maybe_prefetch() {
            requests.push(req);
        }
        requests
    }

    /// Transition away from the track that just finished
    ///
    /// Prefers the prefetched track (seamless); falls back to a blocking
    /// fetch of the next candidate (brief Loading); with no candidate
    /// left the session stops with a queue-exhausted error.
    fn handle_ended(&mut self) -> Vec<FetchRequest> {
        let Some(ending_id) = self.current.as_ref().map(|t| t.id.clone()) else {
            return Vec::new();
        };
        self.played.insert(ending_id.clone());

        if let Some(next) = self.prefetch.consume(&ending_id) {
            self.queue.advance_past(&next.id);
            return self.start_track(next, true);
        }

        if let Some(outgoing) = self.current.take() {
            self.history.push(outgoing);
        }

        if let Some(id) = self.queue.next_candidate(&self.played).cloned() {
            debug!(track_id = %id, "prefetch missed, fetching next track");
            self.pending_next = Some(id.clone());
            self.set_state(PlaybackState::Loading);
            return vec![FetchRequest::NextTrack {
                context: ending_id,
                id,
            }];
        }

        info!("queue exhausted");
        self.set_state(PlaybackState::Idle);
        self.push_event(SessionEvent::QueueExhausted);
        self.set_error(PlaybackError::QueueExhausted);
        Vec::new()
    }

    fn maybe_fetch_candidates(&mut self) -> Option<FetchRequest> {
        if self.candidates_in_flight {
            return None;
        }
        if self.queue.remaining() > self.config.refill_threshold {
            return None;
        }
        let context = self.current.as_ref()?.id.clone();
        self.candidates_in_flight = true;
        Some(FetchRequest::Candidates { context })
    }

    fn maybe_prefetch(&mut self) -> Option<FetchRequest> {
        let context = self.current.as_ref()?.id.clone();
        if self.prefetch.is_for(&context) {
            return None;
        }
        let id = self.queue.next_candidate(&self.played)?.clone();
        self.prefetch.begin(context.clone());
        Some(FetchRequest::Prefetch { context, id })
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "state change");
        self.state = state;
        self.push_event(SessionEvent::StateChanged { state });
    }

    fn set_error(&mut self, error: PlaybackError) {
        let message = error.to_string();
        self.current_error = Some(error);
        self.push_event(SessionEvent::Error { message });
    }

    /// Stop playback and surface a terminal error
    fn stop_with_error(&mut self, error: PlaybackError) {
        let _ = self.adapter.pause();
        self.set_state(PlaybackState::Idle);
        self.set_error(error);
    }

    fn push_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &self.state)
            .field("current", &self.current.as_ref().map(|t| &t.id))
            .field("queue_remaining", &self.queue.remaining())
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}
