//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::speech::Voice;

use super::AppPaths;

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

/// Settings for the remote model gateway (detection + fixing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Whether remote detection/fixing is active at all.  When `false` the
    /// app still watches files but every check reports "no error".
    pub enabled: bool,
    /// Base URL of the OpenAI-compatible endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key — `None` for local providers that need no authentication.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"qwen2.5:3b"`, `"gpt-4o-mini"`).
    pub model: String,
    /// Dialect label inserted into the prompts (e.g. `"Arduino"`).
    pub dialect: String,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a model response before timing out.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            dialect: "Arduino".into(),
            temperature: 0.2,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for spoken status narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Whether narration is active; `false` makes the app silent.
    pub enabled: bool,
    /// Base URL of the OpenAI-compatible synthesis endpoint.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Synthesis model identifier (e.g. `"tts-1"`).
    pub model: String,
    /// Narration voice from the fixed set.
    pub voice: Voice,
    /// Maximum seconds to wait for synthesis before timing out.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8880".into(),
            api_key: None,
            model: "tts-1".into(),
            voice: Voice::default(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// WatcherConfig
// ---------------------------------------------------------------------------

/// Settings for the file-change poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// File extension a watch target must carry (without the dot).
    pub extension: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            extension: "ino".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use sketch_sentry::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Remote model settings.
    pub ai: AiConfig,
    /// Narration settings.
    pub speech: SpeechConfig,
    /// Poll loop settings.
    pub watcher: WatcherConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` when no `settings.toml` file exists yet.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        // AiConfig
        assert_eq!(original.ai.enabled, loaded.ai.enabled);
        assert_eq!(original.ai.base_url, loaded.ai.base_url);
        assert_eq!(original.ai.api_key, loaded.ai.api_key);
        assert_eq!(original.ai.model, loaded.ai.model);
        assert_eq!(original.ai.dialect, loaded.ai.dialect);
        assert_eq!(original.ai.timeout_secs, loaded.ai.timeout_secs);

        // SpeechConfig
        assert_eq!(original.speech.enabled, loaded.speech.enabled);
        assert_eq!(original.speech.base_url, loaded.speech.base_url);
        assert_eq!(original.speech.voice, loaded.speech.voice);

        // WatcherConfig
        assert_eq!(
            original.watcher.poll_interval_ms,
            loaded.watcher.poll_interval_ms
        );
        assert_eq!(original.watcher.extension, loaded.watcher.extension);

        // UiConfig
        assert_eq!(original.ui.always_on_top, loaded.ui.always_on_top);
        assert_eq!(original.ui.window_position, loaded.ui.window_position);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.ai.model, default.ai.model);
        assert_eq!(config.speech.voice, default.speech.voice);
        assert_eq!(
            config.watcher.poll_interval_ms,
            default.watcher.poll_interval_ms
        );
        assert_eq!(config.watcher.extension, default.watcher.extension);
    }

    /// Verify default values.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert!(cfg.ai.enabled);
        assert_eq!(cfg.ai.base_url, "http://localhost:11434");
        assert!(cfg.ai.api_key.is_none());
        assert_eq!(cfg.ai.dialect, "Arduino");
        assert_eq!(cfg.watcher.poll_interval_ms, 1_000);
        assert_eq!(cfg.watcher.extension, "ino");
        assert_eq!(cfg.speech.voice, Voice::Nova);
        assert!(cfg.ui.always_on_top);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.ai.base_url = "https://api.openai.com".into();
        cfg.ai.api_key = Some("sk-test".into());
        cfg.ai.model = "gpt-4o-mini".into();
        cfg.ai.dialect = "C++".into();
        cfg.speech.enabled = false;
        cfg.speech.voice = Voice::Onyx;
        cfg.watcher.poll_interval_ms = 250;
        cfg.watcher.extension = "cpp".into();
        cfg.ui.window_position = Some((100.0, 200.0));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.ai.base_url, "https://api.openai.com");
        assert_eq!(loaded.ai.api_key, Some("sk-test".into()));
        assert_eq!(loaded.ai.model, "gpt-4o-mini");
        assert_eq!(loaded.ai.dialect, "C++");
        assert!(!loaded.speech.enabled);
        assert_eq!(loaded.speech.voice, Voice::Onyx);
        assert_eq!(loaded.watcher.poll_interval_ms, 250);
        assert_eq!(loaded.watcher.extension, "cpp");
        assert_eq!(loaded.ui.window_position, Some((100.0, 200.0)));
    }
}
