//! Mixflow - Continuous Playback
//!
//! Continuous playback queue engine for the Mixflow streaming client.
//!
//! This crate provides:
//! - Recommendation-driven play queue (populate, refill, dedupe)
//! - Speculative next-track prefetch with staleness tagging
//! - Transparent stream-URL refresh before expiry
//! - Automatic skip-segment seeking (sponsor blocks, intros)
//! - Bounded replay history ("previous" without a network call)
//! - An async driver that runs the session on a single task
//!
//! # Architecture
//!
//! All playback state lives in [`PlaybackSession`], a synchronous state
//! machine with a single owner. Commands return [`FetchRequest`] values
//! describing asynchronous work; [`SessionDriver`] executes them against
//! an [`Extractor`](mixflow_core::Extractor) and feeds tagged results
//! back. Results whose tag no longer matches the session's current
//! context are discarded, never applied.
//!
//! The audio engine itself is a collaborator behind [`PlayerAdapter`];
//! this crate never touches audio data.
//!
//! # Example: Session as a plain state machine
//!
//! ```rust
//! use mixflow_playback::{PlaybackSession, PlayerAdapter, Result, SessionConfig};
//!
//! // Implement PlayerAdapter for your platform's audio engine
//! struct MyEngine {
//!     position_ms: u64,
//! }
//!
//! impl PlayerAdapter for MyEngine {
//!     fn load(&mut self, _stream_url: &str, _user_agent: &str, reset_position: bool) -> Result<()> {
//!         if reset_position {
//!             self.position_ms = 0;
//!         }
//!         Ok(())
//!     }
//!
//!     fn play(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn pause(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn seek_to(&mut self, position_ms: u64) -> Result<()> {
//!         self.position_ms = position_ms;
//!         Ok(())
//!     }
//!
//!     fn position_ms(&self) -> u64 {
//!         self.position_ms
//!     }
//! }
//!
//! let engine = MyEngine { position_ms: 0 };
//! let mut session = PlaybackSession::new(Box::new(engine), SessionConfig::default());
//!
//! // Commands return the asynchronous work to run on the session's behalf
//! let request = session.begin_search("lofi beats");
//! // ... resolve `request` against an Extractor, then feed the result
//! // back through `session.apply_search(...)`.
//!
//! let snapshot = session.snapshot();
//! assert!(snapshot.track.is_none());
//! ```
//!
//! # Example: Driving a session asynchronously
//!
//! ```rust,no_run
//! # async fn demo(
//! #     adapter: Box<dyn mixflow_playback::PlayerAdapter>,
//! #     extractor: std::sync::Arc<dyn mixflow_core::Extractor>,
//! # ) {
//! use mixflow_playback::{Command, SessionConfig, SessionDriver};
//!
//! let (driver, handle) = SessionDriver::new(adapter, extractor, SessionConfig::default());
//! tokio::spawn(driver.run());
//!
//! handle.send(Command::Search("lofi beats".to_string())).await;
//!
//! // Observe state through the snapshot watch channel
//! let mut watch = handle.watch();
//! watch.changed().await.ok();
//! println!("now: {:?}", watch.borrow().track);
//! # }
//! ```

mod adapter;
mod driver;
mod error;
pub mod events;
mod history;
mod monitor;
mod prefetch;
mod queue;
mod session;
pub mod types;

// Public exports
pub use adapter::{PlayerAdapter, PlayerEvent};
pub use driver::{Command, SessionDriver, SessionHandle};
pub use error::{PlaybackError, Result};
pub use events::SessionEvent;
pub use session::{FetchRequest, PlaybackSession};
pub use types::{PlaybackState, SessionConfig, SessionSnapshot, SnapshotTrack};
