//! Fix coordinator — obtains corrected text and applies it to the watched
//! file.
//!
//! The one correctness-critical rule of the whole application is enforced
//! here via [`WatchSession::write_fixed`]: the session's stored digest is set
//! to the digest of the corrected text before the write lands, under the
//! same lock the poll loop compares under.  Without that, the watcher would
//! see the coordinator's own write as an external edit and the system would
//! loop detect → fix → detect forever.
//!
//! Failure policy: a corrector failure degrades to a no-op fix (the original
//! text is written back unchanged); only a failed write aborts, and then the
//! next poll tick is the implicit retry for detection.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::ai::AiGateway;
use crate::watcher::WatchSession;

// ---------------------------------------------------------------------------
// FixError
// ---------------------------------------------------------------------------

/// Errors that can surface while applying a fix.
#[derive(Debug, Error)]
pub enum FixError {
    /// The corrected file could not be written back.
    #[error("could not write corrected file: {0}")]
    Write(#[source] io::Error),

    /// Internal / unexpected error (e.g. tokio join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// FixCoordinator
// ---------------------------------------------------------------------------

/// Applies AI fixes to a watched file.  Cheap to clone.
#[derive(Clone)]
pub struct FixCoordinator {
    gateway: Arc<dyn AiGateway>,
}

impl FixCoordinator {
    pub fn new(gateway: Arc<dyn AiGateway>) -> Self {
        Self { gateway }
    }

    /// Obtain corrected text for `source` and write it to the session's file.
    ///
    /// Returns the text actually written.  When the corrector fails, that is
    /// `source` unchanged — the operator keeps their file either way.
    pub async fn apply(
        &self,
        session: &Arc<WatchSession>,
        source: &str,
    ) -> Result<String, FixError> {
        let corrected = match self.gateway.correct(source).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("fix: correction failed ({e}) — keeping original text");
                source.to_string()
            }
        };

        // write_fixed holds the session's digest lock across the digest
        // pre-set and the file write (blocking → thread pool).
        let session_clone = Arc::clone(session);
        let text = corrected.clone();
        let write_result =
            tokio::task::spawn_blocking(move || session_clone.write_fixed(&text)).await;

        match write_result {
            Ok(Ok(())) => {
                log::info!(
                    "fix: wrote {} bytes to {}",
                    corrected.len(),
                    session.path().display()
                );
                Ok(corrected)
            }
            Ok(Err(e)) => Err(FixError::Write(e)),
            Err(e) => Err(FixError::Internal(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
