//! File-change watcher for sketch-sentry.
//!
//! # Architecture
//!
//! ```text
//! WatchSession (Arc)        ← path + poll interval + the stored digest
//!        │
//!        ▼
//! watch_loop()              ← tokio task, 1 s interval ticks
//!        │  on digest change: read file, bump seq
//!        ▼
//! classify_task()           ← spawned per change, off the tick path
//!        │  AiGateway::classify
//!        ▼
//! WatcherEvent (mpsc) ────▶ drained by the UI each frame
//! ```
//!
//! Stopping a session cancels the loop via its `CancellationToken`; verdicts
//! already in flight are discarded downstream by session-id and sequence
//! checks, not cancelled.

pub mod loop_worker;
pub mod state;

pub use loop_worker::watch_loop;
pub use state::{PollOutcome, WatchSession, WatchState};
