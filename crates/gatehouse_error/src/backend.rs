//! Backend adapter errors.

/// Classification tag carried by every adapter failure.
///
/// The router matches on this tag to decide between propagating the failure
/// to the retry loop and falling back to the generic backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BackendFailure {
    /// Worth retrying (network errors, 429, 5xx).
    #[display("transient")]
    Transient,
    /// Retrying the same request cannot succeed (auth, 4xx, malformed request).
    #[display("terminal")]
    Terminal,
    /// Backend cannot be reached at all.
    #[display("unavailable")]
    Unavailable,
}

/// Backend error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend Error ({}): [{}] {} at line {} in {}", provider, failure, message, line, file)]
pub struct BackendError {
    /// Provider that produced the error
    pub provider: String,
    /// Retry classification
    pub failure: BackendFailure,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BackendError {
    /// Create a new backend error at the current location.
    #[track_caller]
    pub fn new(
        provider: impl Into<String>,
        failure: BackendFailure,
        message: impl Into<String>,
    ) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider: provider.into(),
            failure,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Transient failure (retried).
    #[track_caller]
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, BackendFailure::Transient, message)
    }

    /// Terminal failure (never retried).
    #[track_caller]
    pub fn terminal(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, BackendFailure::Terminal, message)
    }

    /// Backend unreachable.
    #[track_caller]
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider, BackendFailure::Unavailable, message)
    }

    /// Classify an HTTP status returned by a provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatehouse_error::{BackendError, BackendFailure};
    ///
    /// let err = BackendError::from_status("anthropic", 529, "overloaded");
    /// assert_eq!(err.failure, BackendFailure::Transient);
    ///
    /// let err = BackendError::from_status("anthropic", 401, "bad key");
    /// assert_eq!(err.failure, BackendFailure::Terminal);
    /// ```
    #[track_caller]
    pub fn from_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let failure = match status {
            408 | 429 | 500..=599 => BackendFailure::Transient,
            400..=499 => BackendFailure::Terminal,
            _ => BackendFailure::Transient,
        };
        Self::new(provider, failure, format!("HTTP {}: {}", status, body.into()))
    }

    /// Whether the retry loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.failure,
            BackendFailure::Transient | BackendFailure::Unavailable
        )
    }
}
