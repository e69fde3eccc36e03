//! Audio playback on a dedicated OS thread.
//!
//! rodio's `OutputStream` is not `Send`, so it lives on its own thread; the
//! rest of the app talks to it through a cloneable [`PlaybackHandle`].
//! Utterances queue on the sink in arrival order.  Any playback failure is
//! logged and dropped — narration is best-effort by contract.

use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rodio::{Decoder, OutputStream, Sink};

enum PlaybackCommand {
    Play(Vec<u8>),
}

/// Cloneable handle to the playback thread.
#[derive(Clone)]
pub struct PlaybackHandle {
    tx: Sender<PlaybackCommand>,
}

impl PlaybackHandle {
    /// Spawn the playback thread and return a handle to it.
    ///
    /// The output device is opened lazily on the first utterance, so the app
    /// still starts on machines without audio hardware.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<PlaybackCommand>();

        thread::Builder::new()
            .name("speech-playback".into())
            .spawn(move || playback_thread(rx))
            .expect("failed to spawn speech-playback thread");

        Self { tx }
    }

    /// Queue encoded audio for playback.  Never blocks, never fails.
    pub fn play(&self, audio: Vec<u8>) {
        let _ = self.tx.send(PlaybackCommand::Play(audio));
    }
}

fn playback_thread(rx: Receiver<PlaybackCommand>) {
    // _stream must outlive the sink or the device closes mid-utterance.
    let mut _stream: Option<OutputStream> = None;
    let mut sink: Option<Sink> = None;

    fn ensure_sink(stream: &mut Option<OutputStream>, sink: &mut Option<Sink>) -> Result<(), String> {
        if sink.is_none() {
            let (s, handle) = OutputStream::try_default()
                .map_err(|e| format!("failed to open audio output: {e}"))?;
            let new_sink =
                Sink::try_new(&handle).map_err(|e| format!("failed to create audio sink: {e}"))?;
            *stream = Some(s);
            *sink = Some(new_sink);
        }
        Ok(())
    }

    while let Ok(cmd) = rx.recv() {
        match cmd {
            PlaybackCommand::Play(audio) => {
                if let Err(e) = ensure_sink(&mut _stream, &mut sink) {
                    log::warn!("speech playback unavailable: {e}");
                    continue;
                }
                match Decoder::new(Cursor::new(audio)) {
                    Ok(source) => {
                        if let Some(ref s) = sink {
                            s.append(source);
                        }
                    }
                    Err(e) => log::warn!("could not decode synthesized audio: {e}"),
                }
            }
        }
    }

    log::debug!("speech-playback thread shutting down");
}
