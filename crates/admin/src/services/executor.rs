//! AI request executor with sequential credential fallback.
//!
//! Credentials are tried one at a time in pool order. The first non-empty
//! completion wins and later credentials are never touched. Every attempt
//! writes one entry when it starts and one when it ends; the terminal error
//! is left for the caller to report.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::instrument;

use crate::credentials::{Credential, CredentialPool};
use crate::gemini::GeminiError;

use super::audit::AuditLog;

/// What to send to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    /// Structured-output constraint, e.g. `application/json`.
    pub response_mime_type: Option<String>,
}

/// A text-completion backend called with one credential at a time.
pub trait CompletionBackend: Send + Sync {
    /// Run one completion. An empty string counts as a failure upstream.
    fn complete<'a>(
        &'a self,
        credential: &'a Credential,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, GeminiError>>;
}

/// Which credentials an execution may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Every non-blank credential, in order.
    #[default]
    Sequential,
    /// Only the last non-blank credential.
    LastOnly,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "all" => Ok(Self::Sequential),
            "last" | "last_only" => Ok(Self::LastOnly),
            other => Err(format!(
                "unknown fallback policy '{other}' (expected 'sequential' or 'last')"
            )),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequential => "sequential",
            Self::LastOnly => "last",
        })
    }
}

/// Errors from executing a request.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Every slot is blank; no call was made.
    #[error("No API keys configured.")]
    NoCredentialsConfigured,

    /// One credential failed. Recovered by moving to the next.
    #[error("Key #{slot} Failed: {reason}")]
    CredentialAttemptFailed { slot: usize, reason: String },

    /// Every eligible credential failed.
    #[error("All API keys failed. Last error: {last_error}")]
    AllCredentialsExhausted { attempts: usize, last_error: String },
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Slot of the credential that produced it.
    pub slot: usize,
}

/// Runs completion requests against a [`CredentialPool`].
#[derive(Clone)]
pub struct RequestExecutor {
    backend: Arc<dyn CompletionBackend>,
    policy: FallbackPolicy,
    timeout: Duration,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(backend: Arc<dyn CompletionBackend>, policy: FallbackPolicy, timeout: Duration) -> Self {
        Self {
            backend,
            policy,
            timeout,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Obtain one completion, falling back across credentials.
    ///
    /// # Errors
    ///
    /// Returns `NoCredentialsConfigured` when the pool has no usable key and
    /// `AllCredentialsExhausted` when every attempt failed.
    #[instrument(skip_all, fields(model = %request.model, policy = %self.policy))]
    pub async fn execute(
        &self,
        pool: &CredentialPool,
        request: &CompletionRequest,
        log: &AuditLog,
    ) -> Result<Completion, ExecutorError> {
        let mut candidates = pool.active();
        if self.policy == FallbackPolicy::LastOnly {
            candidates = candidates.pop().into_iter().collect();
        }

        if candidates.is_empty() {
            return Err(ExecutorError::NoCredentialsConfigured);
        }

        let mut last_error = String::new();
        for credential in &candidates {
            log.info(format!(
                "Attempting connection with Key #{}...",
                credential.slot()
            ));

            match self.attempt(credential, request).await {
                Ok(text) => {
                    log.success(format!("Success with Key #{}", credential.slot()));
                    return Ok(Completion {
                        text,
                        slot: credential.slot(),
                    });
                }
                Err(err) => {
                    log.error(err.to_string());
                    if let ExecutorError::CredentialAttemptFailed { reason, .. } = err {
                        last_error = reason;
                    }
                }
            }
        }

        Err(ExecutorError::AllCredentialsExhausted {
            attempts: candidates.len(),
            last_error,
        })
    }

    async fn attempt(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<String, ExecutorError> {
        let failed = |reason: String| ExecutorError::CredentialAttemptFailed {
            slot: credential.slot(),
            reason,
        };

        match tokio::time::timeout(self.timeout, self.backend.complete(credential, request)).await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(failed(GeminiError::EmptyResponse.to_string())),
            Ok(Err(e)) => Err(failed(e.to_string())),
            Err(_) => Err(failed(
                GeminiError::Timeout(self.timeout.as_secs()).to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use prodigital_core::LogLevel;

    use super::*;

    /// Answers per key: `Ok(text)` or an API error carrying the string.
    #[derive(Default)]
    struct KeyedBackend {
        answers: HashMap<String, Result<String, String>>,
        delay: Option<Duration>,
        calls: Mutex<Vec<usize>>,
    }

    impl KeyedBackend {
        fn answer(mut self, key: &str, answer: Result<&str, &str>) -> Self {
            self.answers.insert(
                key.to_string(),
                answer.map(ToString::to_string).map_err(ToString::to_string),
            );
            self
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CompletionBackend for KeyedBackend {
        fn complete<'a>(
            &'a self,
            credential: &'a Credential,
            _request: &'a CompletionRequest,
        ) -> BoxFuture<'a, Result<String, GeminiError>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(credential.slot());
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                match self.answers.get(credential.expose()) {
                    Some(Ok(text)) => Ok(text.clone()),
                    Some(Err(message)) => Err(GeminiError::Api {
                        status: "INVALID_ARGUMENT".to_string(),
                        message: message.clone(),
                    }),
                    None => Err(GeminiError::Unauthorized("API key rejected".to_string())),
                }
            })
        }
    }

    fn pool(keys: &[&str]) -> CredentialPool {
        let raw: Vec<String> = keys.iter().map(ToString::to_string).collect();
        CredentialPool::from_raw(&raw)
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gemini-3-flash-preview".to_string(),
            prompt: "hello".to_string(),
            response_mime_type: Some("application/json".to_string()),
        }
    }

    fn executor(backend: Arc<KeyedBackend>, policy: FallbackPolicy) -> RequestExecutor {
        RequestExecutor::new(backend, policy, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let backend = Arc::new(
            KeyedBackend::default()
                .answer("k1", Err("bad key"))
                .answer("k2", Ok("{}"))
                .answer("k3", Ok("never")),
        );
        let log = AuditLog::new();

        let completion = executor(backend.clone(), FallbackPolicy::Sequential)
            .execute(&pool(&["k1", "", "k2", "k3"]), &request(), &log)
            .await
            .unwrap();

        assert_eq!(completion.text, "{}");
        assert_eq!(completion.slot, 3);
        assert_eq!(backend.calls(), vec![1, 3]);

        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec![
                "Attempting connection with Key #1...",
                "Key #1 Failed: API error (INVALID_ARGUMENT): bad key",
                "Attempting connection with Key #3...",
                "Success with Key #3",
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_pool_makes_no_call() {
        let backend = Arc::new(KeyedBackend::default());
        let log = AuditLog::new();

        let err = executor(backend.clone(), FallbackPolicy::Sequential)
            .execute(&pool(&["", "   "]), &request(), &log)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::NoCredentialsConfigured));
        assert_eq!(err.to_string(), "No API keys configured.");
        assert!(backend.calls().is_empty());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_carries_last_error() {
        let backend = Arc::new(
            KeyedBackend::default()
                .answer("k1", Err("first"))
                .answer("k2", Err("second")),
        );
        let log = AuditLog::new();

        let err = executor(backend, FallbackPolicy::Sequential)
            .execute(&pool(&["k1", "k2"]), &request(), &log)
            .await
            .unwrap_err();

        match err {
            ExecutorError::AllCredentialsExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.ends_with("second"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let levels: Vec<LogLevel> = log.entries().iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            [LogLevel::Info, LogLevel::Error, LogLevel::Info, LogLevel::Error]
        );
    }

    #[tokio::test]
    async fn test_empty_text_falls_through() {
        let backend = Arc::new(
            KeyedBackend::default()
                .answer("k1", Ok("   "))
                .answer("k2", Ok("done")),
        );
        let log = AuditLog::new();

        let completion = executor(backend, FallbackPolicy::Sequential)
            .execute(&pool(&["k1", "k2"]), &request(), &log)
            .await
            .unwrap();

        assert_eq!(completion.slot, 2);
        assert!(
            log.entries()
                .iter()
                .any(|e| e.message == "Key #1 Failed: model returned no text")
        );
    }

    #[tokio::test]
    async fn test_last_only_policy() {
        let backend = Arc::new(
            KeyedBackend::default()
                .answer("k1", Ok("first"))
                .answer("k2", Ok("last")),
        );
        let log = AuditLog::new();

        let completion = executor(backend.clone(), FallbackPolicy::LastOnly)
            .execute(&pool(&["k1", "k2", ""]), &request(), &log)
            .await
            .unwrap();

        assert_eq!(completion.text, "last");
        assert_eq!(backend.calls(), vec![2]);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_credential() {
        let slow = Arc::new(KeyedBackend {
            delay: Some(Duration::from_millis(200)),
            ..KeyedBackend::default()
        });
        let log = AuditLog::new();

        let err = RequestExecutor::new(slow.clone(), FallbackPolicy::Sequential, Duration::from_millis(20))
            .execute(&pool(&["k1", "k2"]), &request(), &log)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutorError::AllCredentialsExhausted { attempts: 2, .. }
        ));
        assert_eq!(slow.calls(), vec![1, 2]);
        assert!(
            log.entries()
                .iter()
                .any(|e| e.message.starts_with("Key #1 Failed: timed out"))
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("sequential".parse(), Ok(FallbackPolicy::Sequential));
        assert_eq!("LAST".parse(), Ok(FallbackPolicy::LastOnly));
        assert!("random".parse::<FallbackPolicy>().is_err());
    }
}
