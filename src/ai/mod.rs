//! Remote model gateway for sketch-sentry.
//!
//! This module provides:
//! * [`AiGateway`] — async trait with the two remote operations, `classify`
//!   (does this code contain errors?) and `correct` (rewrite it).
//! * [`ApiGateway`] — OpenAI-compatible REST API backend.
//! * [`FailoverGateway`] — wraps any gateway; classify fails open (`false`),
//!   correct fails safe (input returned unchanged).
//! * [`PromptBuilder`] — builds detection and fix prompts.
//! * [`AiError`] — error variants for gateway operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use sketch_sentry::ai::{AiGateway, ApiGateway, FailoverGateway};
//! use sketch_sentry::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!
//!     // Build a gateway that never fails (degrades instead).
//!     let gateway = FailoverGateway::new(ApiGateway::from_config(&config.ai));
//!
//!     let source = "void loop(){";
//!     if gateway.classify(source).await.unwrap() {
//!         let fixed = gateway.correct(source).await.unwrap();
//!         println!("{fixed}");
//!     }
//! }
//! ```

pub mod failover;
pub mod gateway;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use failover::FailoverGateway;
pub use gateway::{AiError, AiGateway, ApiGateway};
pub use prompt::{contains_affirmative, PromptBuilder};
