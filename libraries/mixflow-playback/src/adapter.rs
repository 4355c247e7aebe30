//! Playback engine boundary
//!
//! Abstracts the actual audio engine (decoding, output, buffering) behind
//! control calls and state-change events. The session never touches audio
//! data; it only steers the engine and reads its position clock.

use crate::error::Result;

/// Platform playback engine
///
/// Implementors wrap whatever actually plays audio (a media framework, a
/// remote renderer, a test fake). All calls are non-blocking controls.
pub trait PlayerAdapter: Send {
    /// Swap the active source
    ///
    /// Idempotent: loading while playing replaces the stream. The engine
    /// keeps its position clock across the swap unless `reset_position`
    /// is set (a new track starts from zero, a refreshed stream of the
    /// same track must not).
    ///
    /// # Arguments
    /// * `stream_url` - direct audio URL
    /// * `user_agent` - transport hint the engine must attach to stream requests
    /// * `reset_position` - restart the position clock at zero
    fn load(&mut self, stream_url: &str, user_agent: &str, reset_position: bool) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self) -> Result<()>;

    /// Seek to a position in the current source
    fn seek_to(&mut self, position_ms: u64) -> Result<()>;

    /// Current playback position
    fn position_ms(&self) -> u64;
}

/// State-change notifications emitted by the playback engine
///
/// Delivered onto the session's sequential context by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The engine is rebuffering
    Buffering,

    /// Playback is running
    Playing,

    /// Playback is paused
    Paused,

    /// The current source played to its end
    Ended,

    /// The engine failed
    Error(String),
}

/// Scripted in-memory player for tests
///
/// Records every control call and exposes a settable position clock.
/// Clones share state, so tests keep one clone as a probe while the
/// session owns the other.
#[cfg(test)]
pub(crate) mod fake {
    use super::{PlayerAdapter, Result};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub struct PlayerState {
        pub loads: Vec<(String, String, bool)>,
        pub seeks: Vec<u64>,
        pub position_ms: u64,
        pub playing: bool,
    }

    #[derive(Debug, Clone, Default)]
    pub struct FakePlayer {
        state: Arc<Mutex<PlayerState>>,
    }

    impl FakePlayer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_position(&self, position_ms: u64) {
            self.state.lock().unwrap().position_ms = position_ms;
        }

        pub fn with_state<T>(&self, f: impl FnOnce(&PlayerState) -> T) -> T {
            f(&self.state.lock().unwrap())
        }

        pub fn current_url(&self) -> Option<String> {
            self.state
                .lock()
                .unwrap()
                .loads
                .last()
                .map(|(url, _, _)| url.clone())
        }
    }

    impl PlayerAdapter for FakePlayer {
        fn load(&mut self, stream_url: &str, user_agent: &str, reset_position: bool) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state
                .loads
                .push((stream_url.to_string(), user_agent.to_string(), reset_position));
            if reset_position {
                state.position_ms = 0;
            }
            Ok(())
        }

        fn play(&mut self) -> Result<()> {
            self.state.lock().unwrap().playing = true;
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            self.state.lock().unwrap().playing = false;
            Ok(())
        }

        fn seek_to(&mut self, position_ms: u64) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.seeks.push(position_ms);
            state.position_ms = position_ms;
            Ok(())
        }

        fn position_ms(&self) -> u64 {
            self.state.lock().unwrap().position_ms
        }
    }
}
