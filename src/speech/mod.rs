//! Spoken status narration.
//!
//! # Architecture
//!
//! ```text
//! SpeechNotifier::say(text)          ← fire-and-forget, any task
//!        │  tokio::spawn
//!        ▼
//! Synthesizer::synthesize(text, voice)   ← remote call (reqwest)
//!        │  encoded audio bytes
//!        ▼
//! PlaybackHandle::play(bytes)        ← std mpsc to the audio thread
//!        │
//!        ▼
//! rodio Sink (dedicated OS thread)
//! ```
//!
//! Nothing on this path can fail the caller: synthesis and playback errors
//! are logged and the utterance is dropped.

pub mod playback;
pub mod synth;
pub mod voice;

pub use playback::PlaybackHandle;
pub use synth::{ApiSynthesizer, SpeechError, Synthesizer};
pub use voice::Voice;

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// SpeechNotifier
// ---------------------------------------------------------------------------

/// Fire-and-forget narrator.  Cheap to share via `Arc`.
///
/// [`say`](Self::say) must be called from within the tokio runtime (it spawns
/// the synthesis task); in this app that is always the case since only the
/// session controller narrates.
pub struct SpeechNotifier {
    synth: Arc<dyn Synthesizer>,
    playback: PlaybackHandle,
    voice: Mutex<Voice>,
    enabled: bool,
}

impl SpeechNotifier {
    pub fn new(
        synth: Arc<dyn Synthesizer>,
        playback: PlaybackHandle,
        voice: Voice,
        enabled: bool,
    ) -> Self {
        Self {
            synth,
            playback,
            voice: Mutex::new(voice),
            enabled,
        }
    }

    /// Change the narration voice for all subsequent utterances.
    pub fn set_voice(&self, voice: Voice) {
        *self.voice.lock().unwrap() = voice;
    }

    /// Current narration voice.
    pub fn voice(&self) -> Voice {
        *self.voice.lock().unwrap()
    }

    /// Speak `text` asynchronously.  Returns immediately; the caller never
    /// learns whether the utterance was played.
    pub fn say(&self, text: &str) {
        if !self.enabled {
            return;
        }

        let synth = Arc::clone(&self.synth);
        let playback = self.playback.clone();
        let voice = self.voice();
        let text = text.to_string();

        tokio::spawn(async move {
            match synth.synthesize(&text, voice).await {
                Ok(audio) => playback.play(audio),
                Err(e) => log::warn!("speech synthesis failed for {text:?}: {e}"),
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
