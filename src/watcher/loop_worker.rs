//! The poll loop — digest the file on a fixed interval, dispatch
//! classification on change.
//!
//! # Tick contract
//!
//! Ticks are strictly periodic: the remote classification runs in a spawned
//! task so a slow model call never delays the next tick.  The stored digest
//! is updated *before* classification is dispatched, which gives two
//! guarantees at once:
//! * an edit arriving while classification is in flight queues for the next
//!   tick instead of being lost;
//! * the fix coordinator's own write (whose digest is pre-set) never
//!   re-triggers detection.
//!
//! # Edge cases
//!
//! * file missing → tick logged and skipped, polling continues;
//! * digest or read failure → tick abandoned, polling continues;
//! * stop → the cancellation token ends the loop before the next tick;
//!   classifications already in flight are not cancelled, their results are
//!   discarded downstream by session/sequence checks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ai::AiGateway;
use crate::app::WatcherEvent;

use super::state::{PollOutcome, WatchSession};

// ---------------------------------------------------------------------------
// watch_loop
// ---------------------------------------------------------------------------

/// Run the poll loop for `session` until `cancel` fires.
///
/// Spawn this as a tokio task; it holds no locks across await points and
/// never returns an error — every failure mode degrades to "try again next
/// tick".
pub async fn watch_loop(
    session: Arc<WatchSession>,
    gateway: Arc<dyn AiGateway>,
    events: mpsc::Sender<WatcherEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(session.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Per-session dispatch counter; lets downstream consumers discard
    // verdicts that a newer dispatch has already superseded.
    let mut next_seq: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                poll_tick(&session, &gateway, &events, &mut next_seq).await;
            }
            _ = cancel.cancelled() => {
                log::debug!("watcher: session {} cancelled", session.id());
                break;
            }
        }
    }
}

/// One tick: re-digest, and on change read the file and dispatch
/// classification.
async fn poll_tick(
    session: &Arc<WatchSession>,
    gateway: &Arc<dyn AiGateway>,
    events: &mpsc::Sender<WatcherEvent>,
    next_seq: &mut u64,
) {
    match session.check() {
        Ok(PollOutcome::Changed) => {}
        Ok(PollOutcome::Unchanged) => return,
        Ok(PollOutcome::Missing) => {
            log::debug!(
                "watcher: {} not found, skipping tick",
                session.path().display()
            );
            return;
        }
        Err(e) => {
            log::warn!(
                "watcher: could not digest {} ({e}), tick abandoned",
                session.path().display()
            );
            return;
        }
    }

    let source = match tokio::fs::read_to_string(session.path()).await {
        Ok(text) => text,
        Err(e) => {
            log::warn!(
                "watcher: could not read {} ({e}), tick abandoned",
                session.path().display()
            );
            return;
        }
    };

    *next_seq += 1;
    let seq = *next_seq;
    log::info!(
        "watcher: change detected in {} (seq {seq})",
        session.path().display()
    );

    tokio::spawn(classify_task(
        Arc::clone(gateway),
        source,
        session.id(),
        seq,
        events.clone(),
    ));
}

/// Classification worker: one remote call, one verdict event.
async fn classify_task(
    gateway: Arc<dyn AiGateway>,
    source: String,
    session_id: u64,
    seq: u64,
    events: mpsc::Sender<WatcherEvent>,
) {
    let _ = events
        .send(WatcherEvent::ChangeDetected { session_id, seq })
        .await;

    let has_error = match gateway.classify(&source).await {
        Ok(verdict) => verdict,
        Err(e) => {
            log::warn!("watcher: classification failed ({e}) — assuming clean");
            false
        }
    };

    let event = if has_error {
        WatcherEvent::IssueDetected {
            session_id,
            seq,
            source,
        }
    } else {
        WatcherEvent::CheckedClean { session_id, seq }
    };
    let _ = events.send(event).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::timeout;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Counts classify calls and returns a fixed verdict.
    struct CountingGateway {
        verdict: Result<bool, ()>,
        calls: AtomicUsize,
    }

    impl CountingGateway {
        fn verdict(v: bool) -> Arc<Self> {
            Arc::new(Self {
                verdict: Ok(v),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                verdict: Err(()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AiGateway for CountingGateway {
        async fn classify(&self, _source: &str) -> Result<bool, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
                .map_err(|_| AiError::Request("connection refused".into()))
        }

        async fn correct(&self, source: &str) -> Result<String, AiError> {
            Ok(source.to_string())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    const TICK: Duration = Duration::from_millis(20);

    fn sketch_in(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("blink.ino")
    }

    struct Harness {
        _dir: tempfile::TempDir,
        path: PathBuf,
        session: Arc<WatchSession>,
        events: mpsc::Receiver<WatcherEvent>,
        cancel: CancellationToken,
        task: tokio::task::JoinHandle<()>,
    }

    fn start_loop(initial: Option<&[u8]>, gateway: Arc<dyn AiGateway>) -> Harness {
        let dir = tempdir().expect("temp dir");
        let path = sketch_in(&dir);
        if let Some(bytes) = initial {
            std::fs::write(&path, bytes).expect("write");
        }

        let session = Arc::new(WatchSession::open(7, path.clone(), TICK).expect("open"));
        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(watch_loop(
            Arc::clone(&session),
            gateway,
            tx,
            cancel.clone(),
        ));

        Harness {
            _dir: dir,
            path,
            session,
            events: rx,
            cancel,
            task,
        }
    }

    async fn recv(h: &mut Harness) -> WatcherEvent {
        timeout(Duration::from_secs(2), h.events.recv())
            .await
            .expect("event within 2s")
            .expect("channel open")
    }

    async fn settle() {
        // A few tick periods, enough for the loop to observe quiescence.
        tokio::time::sleep(TICK * 5).await;
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    /// An external edit must produce ChangeDetected followed by a verdict.
    #[tokio::test]
    async fn edit_triggers_detection_and_verdict() {
        let gateway = CountingGateway::verdict(true);
        let mut h = start_loop(Some(b"void loop(){}"), Arc::clone(&gateway) as Arc<dyn AiGateway>);

        settle().await;
        std::fs::write(&h.path, b"void loop(){").expect("edit");

        match recv(&mut h).await {
            WatcherEvent::ChangeDetected { session_id, seq } => {
                assert_eq!(session_id, 7);
                assert_eq!(seq, 1);
            }
            other => panic!("expected ChangeDetected, got {other:?}"),
        }

        match recv(&mut h).await {
            WatcherEvent::IssueDetected { seq, source, .. } => {
                assert_eq!(seq, 1);
                assert_eq!(source, "void loop(){");
            }
            other => panic!("expected IssueDetected, got {other:?}"),
        }

        h.cancel.cancel();
        h.task.await.expect("loop exits");
    }

    /// Identical content must never reach the classifier.
    #[tokio::test]
    async fn unchanged_file_dispatches_nothing() {
        let gateway = CountingGateway::verdict(true);
        let mut h = start_loop(Some(b"void loop(){}"), Arc::clone(&gateway) as Arc<dyn AiGateway>);

        settle().await;
        // Rewrite the same bytes — digest is equal, so not a change.
        std::fs::write(&h.path, b"void loop(){}").expect("rewrite");
        settle().await;

        h.cancel.cancel();
        h.task.await.expect("loop exits");

        assert_eq!(gateway.call_count(), 0);
        assert!(h.events.try_recv().is_err());
    }

    /// A clean verdict produces CheckedClean, not IssueDetected.
    #[tokio::test]
    async fn clean_verdict_produces_checked_clean() {
        let gateway = CountingGateway::verdict(false);
        let mut h = start_loop(Some(b"int a;"), Arc::clone(&gateway) as Arc<dyn AiGateway>);

        settle().await;
        std::fs::write(&h.path, b"int b;").expect("edit");

        assert!(matches!(
            recv(&mut h).await,
            WatcherEvent::ChangeDetected { .. }
        ));
        assert!(matches!(
            recv(&mut h).await,
            WatcherEvent::CheckedClean { seq: 1, .. }
        ));

        h.cancel.cancel();
        h.task.await.expect("loop exits");
    }

    /// A classifier failure is treated as clean at the loop level too.
    #[tokio::test]
    async fn classifier_failure_is_treated_as_clean() {
        let gateway = CountingGateway::failing();
        let mut h = start_loop(Some(b"int a;"), Arc::clone(&gateway) as Arc<dyn AiGateway>);

        settle().await;
        std::fs::write(&h.path, b"int b;").expect("edit");

        assert!(matches!(
            recv(&mut h).await,
            WatcherEvent::ChangeDetected { .. }
        ));
        assert!(matches!(
            recv(&mut h).await,
            WatcherEvent::CheckedClean { .. }
        ));

        h.cancel.cancel();
        h.task.await.expect("loop exits");
        assert_eq!(gateway.call_count(), 1);
    }

    /// A missing file is skipped, and its later appearance counts as a change.
    #[tokio::test]
    async fn missing_file_is_skipped_until_it_appears() {
        let gateway = CountingGateway::verdict(false);
        let mut h = start_loop(None, Arc::clone(&gateway) as Arc<dyn AiGateway>);

        settle().await; // several ticks on a missing file: no events, no exit
        assert!(h.events.try_recv().is_err());

        std::fs::write(&h.path, b"void setup(){}").expect("create");

        assert!(matches!(
            recv(&mut h).await,
            WatcherEvent::ChangeDetected { .. }
        ));

        h.cancel.cancel();
        h.task.await.expect("loop exits");
    }

    /// A fix-apply write (digest pre-set under the session lock) must not be
    /// re-detected — the fix coordinator relies on this exact behaviour.
    #[tokio::test]
    async fn fix_write_is_not_re_detected() {
        let gateway = CountingGateway::verdict(true);
        let mut h = start_loop(Some(b"void loop(){"), Arc::clone(&gateway) as Arc<dyn AiGateway>);

        settle().await;

        h.session.write_fixed("void loop(){}\n").expect("apply fix");

        settle().await;
        h.cancel.cancel();
        h.task.await.expect("loop exits");

        assert_eq!(gateway.call_count(), 0);
        assert!(h.events.try_recv().is_err());
    }

    /// Cancellation must end the loop promptly.
    #[tokio::test]
    async fn cancel_stops_the_loop() {
        let gateway = CountingGateway::verdict(false);
        let h = start_loop(Some(b"int a;"), gateway as Arc<dyn AiGateway>);

        h.cancel.cancel();
        timeout(Duration::from_secs(1), h.task)
            .await
            .expect("loop exits after cancel")
            .expect("no panic");
    }
}
