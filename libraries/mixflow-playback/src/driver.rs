//! Asynchronous session driver
//!
//! Owns a [`PlaybackSession`] on a single task and runs the event loop
//! around it: commands in, extractor calls out, results back in. The
//! session itself never awaits; the driver turns its [`FetchRequest`]
//! directives into spawned tasks and feeds the tagged results back.
//! Observers read a [`watch`] snapshot channel published on change and
//! may subscribe to the session's event stream.

use crate::adapter::{PlayerAdapter, PlayerEvent};
use crate::events::SessionEvent;
use crate::session::{FetchRequest, PlaybackSession};
use crate::types::{SessionConfig, SessionSnapshot};
use chrono::Utc;
use mixflow_core::{Extractor, Track, TrackId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, sleep, Instant};
use tracing::debug;

/// Command channel depth
const COMMAND_BUFFER: usize = 32;

/// Event stream depth; slow subscribers lose oldest events
const EVENT_BUFFER: usize = 64;

/// Re-check the skip monitor shortly after any state-changing input
const SKIP_REARM: Duration = Duration::from_millis(100);

/// Stream expiry check cadence
const EXPIRY_INTERVAL: Duration = Duration::from_secs(60);

/// Snapshot publish cadence while the position clock advances
const POSITION_TICK: Duration = Duration::from_millis(250);

/// Commands accepted by the driver
#[derive(Debug, Clone)]
pub enum Command {
    /// Start a new session from a search query
    Search(String),

    /// Resume playback
    Play,

    /// Pause playback
    Pause,

    /// Advance to the next track
    SkipNext,

    /// Replay the previous track from history
    SkipPrevious,

    /// Seek within the current track
    SeekTo(u64),

    /// A state change reported by the playback engine
    Player(PlayerEvent),

    /// Clear the current user-facing error
    DismissError,

    /// Stop the driver loop
    Shutdown,
}

/// Results of spawned extractor calls, tagged for staleness validation
#[derive(Debug)]
enum TaskResult {
    Search {
        seq: u64,
        result: mixflow_core::Result<Track>,
    },
    Candidates {
        context: TrackId,
        result: mixflow_core::Result<Vec<TrackId>>,
    },
    Prefetch {
        context: TrackId,
        result: mixflow_core::Result<Track>,
    },
    NextTrack {
        id: TrackId,
        result: mixflow_core::Result<Track>,
    },
    Refresh {
        context: TrackId,
        result: mixflow_core::Result<Track>,
    },
}

/// Cloneable handle to a running driver
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Send a command; `false` means the driver has shut down
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch channel for snapshot changes
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to the session event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Event loop around a [`PlaybackSession`]
pub struct SessionDriver {
    session: PlaybackSession,
    extractor: Arc<dyn Extractor>,
    commands: mpsc::Receiver<Command>,
    results_tx: mpsc::Sender<TaskResult>,
    results_rx: mpsc::Receiver<TaskResult>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionDriver {
    /// Build a driver and its handle
    ///
    /// Nothing runs until [`run`](Self::run) is awaited, typically on a
    /// spawned task.
    pub fn new(
        adapter: Box<dyn PlayerAdapter>,
        extractor: Arc<dyn Extractor>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let session = PlaybackSession::new(adapter, config);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (results_tx, results_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        let handle = SessionHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
            events: events_tx.clone(),
        };
        let driver = Self {
            session,
            extractor,
            commands: commands_rx,
            results_tx,
            results_rx,
            snapshot_tx,
            events_tx,
        };
        (driver, handle)
    }

    /// Run the event loop until shutdown or all handles drop
    pub async fn run(mut self) {
        // The skip timer is pinned and re-armed with the delay the monitor
        // asks for. A plain sleep arm would be cancelled and restarted by
        // every other branch and could starve behind the position tick.
        let skip_timer = sleep(POSITION_TICK);
        tokio::pin!(skip_timer);
        let mut expiry = interval(EXPIRY_INTERVAL);
        let mut position_tick = interval(POSITION_TICK);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if matches!(command, Command::Shutdown) {
                        debug!("driver shutting down");
                        break;
                    }
                    self.handle_command(command);
                    skip_timer.as_mut().reset(Instant::now() + SKIP_REARM);
                }
                Some(result) = self.results_rx.recv() => {
                    self.handle_result(result);
                    skip_timer.as_mut().reset(Instant::now() + SKIP_REARM);
                }
                () = skip_timer.as_mut() => {
                    let delay = self.session.skip_check();
                    skip_timer.as_mut().reset(Instant::now() + delay);
                }
                _ = expiry.tick() => {
                    if let Some(request) = self.session.expiry_tick(Utc::now()) {
                        self.dispatch(vec![request]);
                    }
                }
                _ = position_tick.tick() => {}
            }
            self.publish();
        }
    }

    fn handle_command(&mut self, command: Command) {
        let requests = match command {
            Command::Search(query) => vec![self.session.begin_search(query)],
            Command::Play => {
                self.session.play();
                Vec::new()
            }
            Command::Pause => {
                self.session.pause();
                Vec::new()
            }
            Command::SkipNext => self.session.skip_next(),
            Command::SkipPrevious => {
                self.session.skip_previous();
                Vec::new()
            }
            Command::SeekTo(position_ms) => {
                self.session.seek_to(position_ms);
                Vec::new()
            }
            Command::Player(event) => self.session.on_player_event(event),
            Command::DismissError => {
                self.session.dismiss_error();
                Vec::new()
            }
            Command::Shutdown => Vec::new(),
        };
        self.dispatch(requests);
    }

    fn handle_result(&mut self, result: TaskResult) {
        let requests = match result {
            TaskResult::Search { seq, result } => self.session.apply_search(seq, result),
            TaskResult::Candidates { context, result } => {
                self.session.apply_candidates(&context, result)
            }
            TaskResult::Prefetch { context, result } => {
                self.session.apply_prefetch(&context, result);
                Vec::new()
            }
            TaskResult::NextTrack { id, result } => self.session.apply_next_track(&id, result),
            TaskResult::Refresh { context, result } => {
                self.session.apply_refresh(&context, result);
                Vec::new()
            }
        };
        self.dispatch(requests);
    }

    /// Spawn one task per request; results come back over the result channel
    fn dispatch(&self, requests: Vec<FetchRequest>) {
        for request in requests {
            let extractor = Arc::clone(&self.extractor);
            let results = self.results_tx.clone();
            tokio::spawn(async move {
                let outcome = match request {
                    FetchRequest::Search { seq, query } => {
                        let result = extractor.search_by_query(&query).await;
                        TaskResult::Search { seq, result }
                    }
                    FetchRequest::Candidates { context } => {
                        let result = extractor.fetch_candidates(&context).await;
                        TaskResult::Candidates { context, result }
                    }
                    FetchRequest::Prefetch { context, id } => {
                        let result = extractor.fetch_by_id(&id).await;
                        TaskResult::Prefetch { context, result }
                    }
                    FetchRequest::NextTrack { id, .. } => {
                        let result = extractor.fetch_by_id(&id).await;
                        TaskResult::NextTrack { id, result }
                    }
                    FetchRequest::Refresh { context, query } => {
                        let result = extractor.refresh_by_query(&query).await;
                        TaskResult::Refresh { context, result }
                    }
                };
                let _ = results.send(outcome).await;
            });
        }
    }

    /// Drain events and publish the snapshot if it changed
    fn publish(&mut self) {
        for event in self.session.take_events() {
            let _ = self.events_tx.send(event);
        }
        let snapshot = self.session.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
