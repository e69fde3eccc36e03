//! Watch-session state machine and the session handle.
//!
//! [`WatchState`] drives the session lifecycle.  [`WatchSession`] is the
//! explicit handle for one watched file: its path, its poll interval, and the
//! single stored digest that change detection compares against.
//!
//! The state machine transitions are:
//!
//! ```text
//! Idle ──operator selects file──▶ Watching
//! Watching ──tick, digest unchanged──▶ Watching
//! Watching ──tick, digest changed──▶ Watching   (classification dispatched)
//! Watching ──operator stops / switches──▶ Stopped   (terminal)
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::digest::{digest_bytes, digest_file, ContentDigest};

// ---------------------------------------------------------------------------
// WatchState
// ---------------------------------------------------------------------------

/// Lifecycle states of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No file selected; no poller scheduled.
    Idle,

    /// A file is selected and the poll loop is running.
    Watching,

    /// Terminal: the poller has been cancelled and the session discarded.
    Stopped,
}

impl WatchState {
    /// Returns `true` while a poller is (or should be) running.
    ///
    /// ```
    /// use sketch_sentry::watcher::WatchState;
    ///
    /// assert!(!WatchState::Idle.is_active());
    /// assert!(WatchState::Watching.is_active());
    /// assert!(!WatchState::Stopped.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        matches!(self, WatchState::Watching)
    }

    /// A short human-readable label for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            WatchState::Idle => "Idle",
            WatchState::Watching => "Watching",
            WatchState::Stopped => "Stopped",
        }
    }
}

impl Default for WatchState {
    fn default() -> Self {
        WatchState::Idle
    }
}

// ---------------------------------------------------------------------------
// PollOutcome
// ---------------------------------------------------------------------------

/// What one poll observation found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The file does not exist right now; skip this tick and keep polling.
    Missing,
    /// Content digest matches the stored one; nothing to do.
    Unchanged,
    /// Content changed since the last observation; the stored digest has
    /// already been updated to the new value.
    Changed,
}

// ---------------------------------------------------------------------------
// WatchSession
// ---------------------------------------------------------------------------

/// Handle for one watched file.
///
/// Owned behind an `Arc`: the poll loop, the fix coordinator, and the session
/// controller all hold clones.  The stored digest is the session's only
/// shared mutable state.  [`check`](Self::check) (the poll loop) and
/// [`write_fixed`](Self::write_fixed) (the fix coordinator) both run under
/// the digest lock, so a tick can never interleave between the fix's digest
/// pre-set and its file write — the suppression rule holds by mutual
/// exclusion, not by timing.
#[derive(Debug)]
pub struct WatchSession {
    id: u64,
    path: PathBuf,
    digest: Mutex<Option<ContentDigest>>,
    poll_interval: Duration,
}

impl WatchSession {
    /// Open a session on `path`, computing the initial digest immediately.
    ///
    /// The digest is `None` when the file is momentarily missing — the first
    /// tick that finds it present then counts as a change.
    pub fn open(id: u64, path: PathBuf, poll_interval: Duration) -> io::Result<Self> {
        let initial = digest_file(&path)?;
        Ok(Self {
            id,
            path,
            digest: Mutex::new(initial),
            poll_interval,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The last digest this session has seen (or pre-set).
    pub fn current_digest(&self) -> Option<ContentDigest> {
        *self.digest.lock().unwrap()
    }

    /// One poll observation: digest the file and compare against the stored
    /// value, updating it on change.
    ///
    /// The store happens before the caller reads the file or dispatches
    /// classification: edits that land during a slow classification queue for
    /// the next tick instead of being lost.
    pub fn check(&self) -> io::Result<PollOutcome> {
        let mut stored = self.digest.lock().unwrap();

        let new = match digest_file(&self.path)? {
            Some(digest) => digest,
            None => return Ok(PollOutcome::Missing),
        };

        if stored.as_ref() == Some(&new) {
            Ok(PollOutcome::Unchanged)
        } else {
            *stored = Some(new);
            Ok(PollOutcome::Changed)
        }
    }

    /// Write corrected text to the watched file, pre-setting the stored
    /// digest so the write is never misread as an external edit.
    ///
    /// Runs under the digest lock; a concurrent [`check`](Self::check) sees
    /// either the pre-fix file with the pre-fix digest or the corrected file
    /// with the corrected digest, never a mix.  If the write itself fails the
    /// stored digest no longer matches the disk content and the next tick
    /// re-detects — the poll loop is the implicit retry.
    pub fn write_fixed(&self, text: &str) -> io::Result<()> {
        let mut stored = self.digest.lock().unwrap();
        *stored = Some(digest_bytes(text.as_bytes()));
        std::fs::write(&self.path, text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
