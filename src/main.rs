//! Application entry point — sketch-sentry.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the AI gateway ([`FailoverGateway`] over [`ApiGateway`], or a
//!    disabled stub when the gateway is switched off in config).
//! 5. Build the speech notifier (synthesizer + playback thread).
//! 6. Create the command/event channels.
//! 7. Spawn the session controller on the tokio runtime.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;

use sketch_sentry::{
    ai::{AiError, AiGateway, ApiGateway, FailoverGateway},
    app::{SessionCommand, SketchSentryApp, WatcherEvent},
    config::AppConfig,
    session::SessionController,
    speech::{ApiSynthesizer, PlaybackHandle, SpeechNotifier},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([460.0, 300.0])
        .with_min_inner_size([380.0, 240.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("sketch-sentry starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads — poll loop + remote calls)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. AI gateway (degrades to a stub when disabled so the app still runs)
    let gateway: Arc<dyn AiGateway> = if config.ai.enabled {
        Arc::new(FailoverGateway::new(ApiGateway::from_config(&config.ai)))
    } else {
        log::warn!("AI gateway disabled in config — every check will report no error");
        Arc::new(DisabledGateway)
    };

    // 5. Speech notifier
    let speech = Arc::new(SpeechNotifier::new(
        Arc::new(ApiSynthesizer::from_config(&config.speech)),
        PlaybackHandle::spawn(),
        config.speech.voice,
        config.speech.enabled,
    ));

    // 6. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<WatcherEvent>(32);

    // 7. Spawn the session controller onto the tokio runtime
    {
        let controller =
            SessionController::new(gateway, Arc::clone(&speech), config.clone(), event_tx);
        rt.spawn(controller.run(command_rx));
    }

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = SketchSentryApp::new(command_tx, event_rx, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Sketch Sentry",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}

// ---------------------------------------------------------------------------
// DisabledGateway — stand-in when the AI gateway is switched off in config
// ---------------------------------------------------------------------------

struct DisabledGateway;

#[async_trait::async_trait]
impl AiGateway for DisabledGateway {
    async fn classify(&self, _source: &str) -> Result<bool, AiError> {
        Ok(false)
    }

    async fn correct(&self, source: &str) -> Result<String, AiError> {
        Ok(source.to_string())
    }
}
