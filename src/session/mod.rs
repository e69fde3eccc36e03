//! Session controller — owns the one active watch session.
//!
//! # Architecture
//!
//! ```text
//! SessionCommand (mpsc)
//!        │
//!        ▼
//! SessionController::run()   ← async tokio task
//!        │
//!        ├─ StartWatching → validate extension, open WatchSession,
//!        │                  spawn watch_loop                    [Watching]
//!        ├─ StopWatching  → cancel the loop's token             [Stopped]
//!        ├─ SwitchFile    → full stop, then start on the new path
//!        ├─ ApplyFix      → spawn FixCoordinator::apply
//!        └─ SetVoice      → SpeechNotifier::set_voice
//!
//! WatcherEvent (mpsc) ────▶ drained by the UI each frame
//! ```
//!
//! Exactly one session may be active; a second start is rejected without
//! touching the running one.  Switching cancels the active poller fully
//! before the new one is spawned, so two pollers never overlap.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ai::AiGateway;
use crate::app::{SessionCommand, WatcherEvent};
use crate::config::AppConfig;
use crate::fix::FixCoordinator;
use crate::speech::SpeechNotifier;
use crate::watcher::{watch_loop, WatchSession, WatchState};

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Why a watch session could not be started.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already active; stop it first.
    #[error("already watching a file — stop the current session first")]
    AlreadyWatching,

    /// The selected path does not carry the required extension.
    #[error("wrong file type — please select a .{expected} file")]
    WrongFileType { expected: String },

    /// The initial digest could not be computed.
    #[error("could not open file: {0}")]
    Open(#[source] std::io::Error),
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

struct ActiveWatch {
    session: Arc<WatchSession>,
    cancel: CancellationToken,
}

/// Owns the active watch session and reacts to operator commands.
///
/// Create with [`SessionController::new`], then call [`run`](Self::run)
/// inside a tokio task.
pub struct SessionController {
    gateway: Arc<dyn AiGateway>,
    speech: Arc<SpeechNotifier>,
    fixer: FixCoordinator,
    config: AppConfig,
    events: mpsc::Sender<WatcherEvent>,
    active: Option<ActiveWatch>,
    next_session_id: u64,
}

impl SessionController {
    pub fn new(
        gateway: Arc<dyn AiGateway>,
        speech: Arc<SpeechNotifier>,
        config: AppConfig,
        events: mpsc::Sender<WatcherEvent>,
    ) -> Self {
        let fixer = FixCoordinator::new(Arc::clone(&gateway));
        Self {
            gateway,
            speech,
            fixer,
            config,
            events,
            active: None,
            next_session_id: 1,
        }
    }

    /// Current lifecycle state, for display and tests.
    pub fn state(&self) -> WatchState {
        if self.active.is_some() {
            WatchState::Watching
        } else {
            WatchState::Idle
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the controller until `commands` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`.  It never returns while the channel is open.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        self.speech.say("Sketch sentry is ready.");

        while let Some(cmd) = commands.recv().await {
            match cmd {
                SessionCommand::StartWatching { path } => {
                    self.handle_start(&path).await;
                }
                SessionCommand::StopWatching => {
                    self.handle_stop().await;
                }
                SessionCommand::SwitchFile { path } => {
                    self.handle_stop().await;
                    self.handle_start(&path).await;
                }
                SessionCommand::ApplyFix { session_id, source } => {
                    self.handle_fix(session_id, source);
                }
                SessionCommand::SetVoice { voice } => {
                    self.speech.set_voice(voice);
                    self.speech.say(&format!("Voice set to {}.", voice.label()));
                    let _ = self.events.send(WatcherEvent::VoiceChanged { voice }).await;
                }
            }
        }

        // Command channel closed — the UI is gone; tear the poller down.
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
        log::info!("session: command channel closed, controller shutting down");
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Open a session on `path` and spawn its poll loop.
    ///
    /// Rejected with no state change to a running session.
    pub fn start_session(&mut self, path: &Path) -> Result<Arc<WatchSession>, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyWatching);
        }

        let expected = &self.config.watcher.extension;
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(expected));
        if !matches {
            return Err(SessionError::WrongFileType {
                expected: expected.clone(),
            });
        }

        let id = self.next_session_id;
        self.next_session_id += 1;

        let session = Arc::new(
            WatchSession::open(
                id,
                path.to_path_buf(),
                Duration::from_millis(self.config.watcher.poll_interval_ms),
            )
            .map_err(SessionError::Open)?,
        );

        let cancel = CancellationToken::new();
        tokio::spawn(watch_loop(
            Arc::clone(&session),
            Arc::clone(&self.gateway),
            self.events.clone(),
            cancel.clone(),
        ));

        self.active = Some(ActiveWatch {
            session: Arc::clone(&session),
            cancel,
        });
        log::info!("session {}: watching {}", id, path.display());
        Ok(session)
    }

    /// Cancel the active poller, if any.  Returns `true` when a session was
    /// actually stopped.
    pub fn stop_session(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.cancel.cancel();
                log::info!("session {}: stopped", active.session.id());
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    async fn handle_start(&mut self, path: &Path) {
        match self.start_session(path) {
            Ok(session) => {
                let name = session
                    .path()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| session.path().display().to_string());
                self.speech.say(&format!("Now watching {name}."));
                let _ = self
                    .events
                    .send(WatcherEvent::SessionStarted {
                        session_id: session.id(),
                        path: session.path().to_path_buf(),
                    })
                    .await;
            }
            Err(e) => {
                log::warn!("session: start refused: {e}");
                self.speech.say(&e.to_string());
                let _ = self
                    .events
                    .send(WatcherEvent::SessionRejected {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn handle_stop(&mut self) {
        if self.stop_session() {
            self.speech.say("Stopped monitoring.");
            let _ = self.events.send(WatcherEvent::SessionStopped).await;
        }
    }

    /// Spawn the fix task for the current session.
    ///
    /// The fix runs off the command loop so a slow corrector never blocks
    /// stop/switch commands.
    fn handle_fix(&mut self, session_id: u64, source: String) {
        let Some(active) = self.active.as_ref() else {
            log::warn!("session: fix requested with no active session — ignored");
            return;
        };
        if active.session.id() != session_id {
            log::warn!("session: fix requested for a stale session {session_id} — ignored");
            return;
        }

        self.speech.say("Fixing the code using AI, please wait.");

        let fixer = self.fixer.clone();
        let session = Arc::clone(&active.session);
        let events = self.events.clone();
        let speech = Arc::clone(&self.speech);

        tokio::spawn(async move {
            match fixer.apply(&session, &source).await {
                Ok(_) => {
                    speech.say("The code has been fixed successfully.");
                    let _ = events.send(WatcherEvent::FixApplied { session_id }).await;
                }
                Err(e) => {
                    log::warn!("session: fix write failed: {e}");
                    let _ = events
                        .send(WatcherEvent::FixFailed {
                            session_id,
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
