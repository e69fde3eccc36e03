//! Sketch sentry control window — egui/eframe application.
//!
//! # Architecture
//!
//! [`SketchSentryApp`] is the top-level [`eframe::App`] that owns the UI
//! state and two channel endpoints:
//!
//! * `command_tx` — sends [`SessionCommand`] to the session controller task.
//! * `event_rx`  — receives [`WatcherEvent`] from the controller and the
//!   watch loop.
//!
//! The window shows the sketch path entry, the voice selector, the
//! start/stop/switch controls, and a one-line status feed.  When an error
//! verdict arrives, a modal prompt offers to apply the AI fix.
//!
//! # Stale-result policy
//!
//! Verdict events carry the id of the session that dispatched them and a
//! per-session sequence number.  The app discards any verdict from a session
//! other than the current one (results of a stopped watcher) and any verdict
//! whose sequence number is below the highest already handled (a slow
//! classification overtaken by a newer one).

use std::path::PathBuf;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::speech::Voice;

// ---------------------------------------------------------------------------
// Session message types (owned by the ui module; the session controller and
// the watch loop import them from here).
// ---------------------------------------------------------------------------

/// Commands sent from the UI thread to the session controller.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Begin watching the file at `path`.
    StartWatching { path: PathBuf },
    /// Stop the active watch session.
    StopWatching,
    /// Stop the active session (if any) and watch `path` instead.
    SwitchFile { path: PathBuf },
    /// Operator accepted the fix prompt for `source`.
    ApplyFix { session_id: u64, source: String },
    /// Change the narration voice.
    SetVoice { voice: Voice },
}

/// Events delivered from the controller / watch loop to the UI.
#[derive(Debug, Clone)]
pub enum WatcherEvent {
    /// A watch session is now active.
    SessionStarted { session_id: u64, path: PathBuf },
    /// A start/switch request was refused; `message` says why.
    SessionRejected { message: String },
    /// The active session has been stopped.
    SessionStopped,
    /// A tick observed a content change; classification is in flight.
    ChangeDetected { session_id: u64, seq: u64 },
    /// Classification came back clean.
    CheckedClean { session_id: u64, seq: u64 },
    /// Classification reported an error; `source` is the text that was
    /// checked (the fix, if accepted, applies to exactly this text).
    IssueDetected {
        session_id: u64,
        seq: u64,
        source: String,
    },
    /// The fix coordinator wrote the corrected file.
    FixApplied { session_id: u64 },
    /// The fix could not be written; monitoring continues.
    FixFailed { session_id: u64, message: String },
    /// The narration voice changed.
    VoiceChanged { voice: Voice },
}

// ---------------------------------------------------------------------------
// SessionView — UI-side session state
// ---------------------------------------------------------------------------

/// What the UI believes about the session, derived from events.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    /// No session; the path entry and Start control are shown.
    Idle,
    /// A session is active; Stop and Switch controls are shown.
    Watching { session_id: u64, path: PathBuf },
}

/// An error verdict awaiting the operator's accept/dismiss decision.
#[derive(Debug, Clone)]
struct PendingFix {
    session_id: u64,
    source: String,
}

// ---------------------------------------------------------------------------
// SketchSentryApp
// ---------------------------------------------------------------------------

/// eframe application — the sketch-sentry control window.
pub struct SketchSentryApp {
    // ── Session state ────────────────────────────────────────────────────
    /// Current UI-side view of the session.
    pub view: SessionView,
    /// Error verdict awaiting a decision; renders the modal prompt.
    pending_fix: Option<PendingFix>,
    /// Highest verdict sequence number handled for the current session.
    last_verdict_seq: u64,
    /// One-line status feed.
    status: String,

    // ── Inputs ───────────────────────────────────────────────────────────
    /// Contents of the sketch path entry.
    path_input: String,
    /// Voice picked in the selector (applied on "Set Voice").
    selected_voice: Voice,

    // ── Channels ─────────────────────────────────────────────────────────
    /// Send commands to the session controller task.
    pub command_tx: mpsc::Sender<SessionCommand>,
    /// Receive events from the controller and the watch loop.
    pub event_rx: mpsc::Receiver<WatcherEvent>,

    // ── Configuration ────────────────────────────────────────────────────
    /// Application configuration (read-only after startup).
    pub config: AppConfig,
}

impl SketchSentryApp {
    /// Create a new [`SketchSentryApp`].
    pub fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<WatcherEvent>,
        config: AppConfig,
    ) -> Self {
        let selected_voice = config.speech.voice;
        Self {
            view: SessionView::Idle,
            pending_fix: None,
            last_verdict_seq: 0,
            status: "Select a sketch file to watch.".into(),
            path_input: String::new(),
            selected_voice,
            command_tx,
            event_rx,
            config,
        }
    }

    // ── Event polling ────────────────────────────────────────────────────

    /// Current session id, or `None` when idle.
    fn current_session_id(&self) -> Option<u64> {
        match &self.view {
            SessionView::Idle => None,
            SessionView::Watching { session_id, .. } => Some(*session_id),
        }
    }

    /// `true` when a verdict event belongs to the current session and has
    /// not been superseded by a newer one.
    fn verdict_is_current(&self, session_id: u64, seq: u64) -> bool {
        self.current_session_id() == Some(session_id) && seq >= self.last_verdict_seq
    }

    /// Drain all pending events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                WatcherEvent::SessionStarted { session_id, path } => {
                    self.status = format!("Watching {}", path.display());
                    self.view = SessionView::Watching { session_id, path };
                    self.pending_fix = None;
                    self.last_verdict_seq = 0;
                }
                WatcherEvent::SessionRejected { message } => {
                    self.status = message;
                }
                WatcherEvent::SessionStopped => {
                    self.view = SessionView::Idle;
                    self.pending_fix = None;
                    self.status = "Monitoring stopped.".into();
                }
                WatcherEvent::ChangeDetected { session_id, .. } => {
                    if self.current_session_id() == Some(session_id) {
                        self.status = "Change detected — checking...".into();
                    }
                }
                WatcherEvent::CheckedClean { session_id, seq } => {
                    if self.verdict_is_current(session_id, seq) {
                        self.last_verdict_seq = seq;
                        self.status = "No issues found.".into();
                    }
                }
                WatcherEvent::IssueDetected {
                    session_id,
                    seq,
                    source,
                } => {
                    if self.verdict_is_current(session_id, seq) {
                        self.last_verdict_seq = seq;
                        self.status = "Possible issue detected.".into();
                        self.pending_fix = Some(PendingFix { session_id, source });
                    }
                }
                WatcherEvent::FixApplied { session_id } => {
                    if self.current_session_id() == Some(session_id) {
                        self.status = "AI has corrected the file.".into();
                    }
                }
                WatcherEvent::FixFailed { session_id, message } => {
                    if self.current_session_id() == Some(session_id) {
                        self.status = format!("Fix not applied: {message}");
                    }
                }
                WatcherEvent::VoiceChanged { voice } => {
                    self.selected_voice = voice;
                    self.status = format!("Voice set to {}.", voice.label());
                }
            }
        }
    }

    // ── Panel renderers ──────────────────────────────────────────────────

    /// Render the path entry plus Start / Stop / Switch controls.
    fn draw_session_controls(&mut self, ui: &mut egui::Ui) {
        match self.view.clone() {
            SessionView::Idle => {
                ui.horizontal(|ui| {
                    ui.label("Sketch file:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.path_input)
                            .hint_text(format!("path/to/sketch.{}", self.config.watcher.extension))
                            .desired_width(260.0),
                    );
                });
                if ui.button("Start Watching").clicked() {
                    let path = PathBuf::from(self.path_input.trim());
                    let _ = self
                        .command_tx
                        .try_send(SessionCommand::StartWatching { path });
                }
            }
            SessionView::Watching { path, .. } => {
                ui.label(
                    egui::RichText::new(format!("Watching: {}", path.display())).monospace(),
                );
                ui.horizontal(|ui| {
                    if ui.button("Stop Watching").clicked() {
                        let _ = self.command_tx.try_send(SessionCommand::StopWatching);
                    }
                    if ui.button("Watch Another File").clicked() {
                        let path = PathBuf::from(self.path_input.trim());
                        let _ = self
                            .command_tx
                            .try_send(SessionCommand::SwitchFile { path });
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Next file:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.path_input)
                            .hint_text(format!("path/to/sketch.{}", self.config.watcher.extension))
                            .desired_width(260.0),
                    );
                });
            }
        }
    }

    /// Render the voice selector row.
    fn draw_voice_selector(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Voice:");
            egui::ComboBox::from_id_salt("voice-selector")
                .selected_text(self.selected_voice.label())
                .show_ui(ui, |ui| {
                    for voice in Voice::ALL {
                        ui.selectable_value(&mut self.selected_voice, voice, voice.label());
                    }
                });
            if ui.button("Set Voice").clicked() {
                let _ = self.command_tx.try_send(SessionCommand::SetVoice {
                    voice: self.selected_voice,
                });
            }
        });
    }

    /// Render the modal fix prompt when a verdict is pending.
    fn draw_fix_prompt(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending_fix.clone() else {
            return;
        };

        egui::Window::new("Possible issue detected")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("The model thinks this sketch contains an error.");
                ui.label("Have it rewritten automatically?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui
                        .add(egui::Button::new(
                            egui::RichText::new("Fix Code")
                                .color(egui::Color32::from_rgb(80, 200, 120)),
                        ))
                        .clicked()
                    {
                        let _ = self.command_tx.try_send(SessionCommand::ApplyFix {
                            session_id: pending.session_id,
                            source: pending.source.clone(),
                        });
                        self.status = "Requesting fix...".into();
                        self.pending_fix = None;
                    }
                    if ui.button("Dismiss").clicked() {
                        self.pending_fix = None;
                    }
                });
            });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for SketchSentryApp {
    /// Called every frame by eframe.  Polls the event channel, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Events arrive without input activity; keep draining them even when
        // the operator is not interacting with the window.
        ctx.request_repaint_after(std::time::Duration::from_millis(250));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Sketch Sentry");
            ui.label(
                egui::RichText::new("AI error watch for Arduino sketches")
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .size(11.0),
            );
            ui.separator();

            self.draw_session_controls(ui);
            ui.add_space(6.0);
            self.draw_voice_selector(ui);

            ui.separator();
            ui.label(self.status.as_str());
        });

        self.draw_fix_prompt(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("sketch-sentry window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
