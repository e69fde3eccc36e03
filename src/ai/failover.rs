//! Failover gateway — wraps any [`AiGateway`] and degrades instead of failing.
//!
//! When the underlying call fails for any reason (`Request`, `Timeout`,
//! `Parse`, `EmptyResponse`) [`FailoverGateway`] does not propagate the
//! error:
//! * `classify` fails **open** — the verdict becomes "no error found", so a
//!   dead endpoint produces silence rather than false alarms;
//! * `correct` fails **safe** — the original source is returned unchanged,
//!   so a fix attempt can never lose the operator's file.

use async_trait::async_trait;

use crate::ai::gateway::{AiError, AiGateway};

// ---------------------------------------------------------------------------
// FailoverGateway
// ---------------------------------------------------------------------------

/// A transparent wrapper around any [`AiGateway`] that never returns an
/// error.
///
/// # Example
/// ```rust
/// use sketch_sentry::ai::{ApiGateway, FailoverGateway};
/// use sketch_sentry::config::AiConfig;
///
/// let inner = ApiGateway::from_config(&AiConfig::default());
/// let gateway = FailoverGateway::new(inner);
/// // `gateway` implements AiGateway and is safe to use even when the
/// // endpoint is unreachable.
/// ```
pub struct FailoverGateway<G: AiGateway> {
    inner: G,
}

impl<G: AiGateway> FailoverGateway<G> {
    /// Wrap `inner` with degradation behaviour.
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    /// Return a reference to the wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: AiGateway + Send + Sync> AiGateway for FailoverGateway<G> {
    /// Attempt classification; report "no error" if the call fails.
    ///
    /// This implementation **never** returns `Err(_)`.
    async fn classify(&self, source: &str) -> Result<bool, AiError> {
        match self.inner.classify(source).await {
            Ok(verdict) => Ok(verdict),
            Err(err) => {
                log::warn!("classification failed — assuming no error: {err}");
                Ok(false)
            }
        }
    }

    /// Attempt correction; return `source` unchanged if the call fails.
    ///
    /// This implementation **never** returns `Err(_)`.
    async fn correct(&self, source: &str) -> Result<String, AiError> {
        match self.inner.correct(source).await {
            Ok(corrected) => Ok(corrected),
            Err(err) => {
                log::warn!(
                    "correction failed — keeping original text (len={}): {err}",
                    source.len()
                );
                Ok(source.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Always succeeds: classify → `true`, correct → fixed string.
    struct AlwaysOk(String);

    #[async_trait]
    impl AiGateway for AlwaysOk {
        async fn classify(&self, _source: &str) -> Result<bool, AiError> {
            Ok(true)
        }

        async fn correct(&self, _source: &str) -> Result<String, AiError> {
            Ok(self.0.clone())
        }
    }

    /// Always returns the given error from both operations.
    struct AlwaysFails(AiErrorKind);

    enum AiErrorKind {
        Request,
        Timeout,
        Parse,
        Empty,
    }

    impl AlwaysFails {
        fn make_error(&self) -> AiError {
            match self.0 {
                AiErrorKind::Request => AiError::Request("connection refused".into()),
                AiErrorKind::Timeout => AiError::Timeout,
                AiErrorKind::Parse => AiError::Parse("bad json".into()),
                AiErrorKind::Empty => AiError::EmptyResponse,
            }
        }
    }

    #[async_trait]
    impl AiGateway for AlwaysFails {
        async fn classify(&self, _source: &str) -> Result<bool, AiError> {
            Err(self.make_error())
        }

        async fn correct(&self, _source: &str) -> Result<String, AiError> {
            Err(self.make_error())
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn passes_through_classify_success() {
        let gateway = FailoverGateway::new(AlwaysOk("fixed".into()));
        assert!(gateway.classify("void loop(){").await.unwrap());
    }

    #[tokio::test]
    async fn passes_through_correct_success() {
        let gateway = FailoverGateway::new(AlwaysOk("void loop(){}\n".into()));
        let result = gateway.correct("void loop(){").await.unwrap();
        assert_eq!(result, "void loop(){}\n");
    }

    #[tokio::test]
    async fn classify_is_false_on_request_error() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Request));
        assert!(!gateway.classify("void loop(){").await.unwrap());
    }

    #[tokio::test]
    async fn classify_is_false_on_timeout() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Timeout));
        assert!(!gateway.classify("void loop(){").await.unwrap());
    }

    #[tokio::test]
    async fn classify_is_false_on_parse_error() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Parse));
        assert!(!gateway.classify("void loop(){").await.unwrap());
    }

    #[tokio::test]
    async fn correct_returns_source_on_request_error() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Request));
        let result = gateway.correct("original text").await.unwrap();
        assert_eq!(result, "original text");
    }

    #[tokio::test]
    async fn correct_returns_source_on_timeout() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Timeout));
        let result = gateway.correct("original text").await.unwrap();
        assert_eq!(result, "original text");
    }

    #[tokio::test]
    async fn correct_returns_source_on_empty_response() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Empty));
        let result = gateway.correct("original text").await.unwrap();
        assert_eq!(result, "original text");
    }

    #[tokio::test]
    async fn never_returns_err() {
        let gateway = FailoverGateway::new(AlwaysFails(AiErrorKind::Timeout));
        assert!(gateway.classify("x").await.is_ok());
        assert!(gateway.correct("x").await.is_ok());
    }

    /// FailoverGateway<G> must itself be a valid AiGateway (object-safe).
    #[test]
    fn failover_is_object_safe() {
        let inner = AlwaysOk("ok".into());
        let _: Box<dyn AiGateway> = Box::new(FailoverGateway::new(inner));
    }
}
