//! Dispatch pipeline errors and their retry classification.

use crate::{BackendError, BackendFailure, CallErrorKind};

/// Failure conditions raised while dispatching one call.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GatewayErrorKind {
    /// Request failed shape or bounds validation
    #[display("Validation failed: {}", _0)]
    Validation(String),

    /// Budget or per-request ceiling would be exceeded
    #[display("Budget exceeded: {}", _0)]
    BudgetExceeded(String),

    /// Quality gate judged the content severe
    #[display("Quality gate rejected response: {}", _0)]
    QualityGateRejected(String),

    /// A single attempt overran its deadline
    #[display("Attempt timed out after {} ms", _0)]
    Timeout(u64),

    /// Transient backend failure
    #[display("Backend error: {}", _0)]
    Backend(String),

    /// Backend failure explicitly marked terminal
    #[display("Backend rejected request: {}", _0)]
    BackendRejected(String),

    /// Bounded admission backlog was full
    #[display("Admission rejected: {}", _0)]
    AdmissionRejected(String),

    /// Transient failures persisted through every retry
    #[display("Max retries exceeded after {} attempts: {}", attempts, last)]
    MaxRetriesExceeded {
        /// Number of attempts made
        attempts: u32,
        /// The final transient failure
        last: Box<GatewayErrorKind>,
    },
}

impl GatewayErrorKind {
    /// Terminal failures are returned immediately and never retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use gatehouse_error::GatewayErrorKind;
    ///
    /// assert!(GatewayErrorKind::Validation("empty messages".into()).is_terminal());
    /// assert!(!GatewayErrorKind::Timeout(30_000).is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GatewayErrorKind::Validation(_)
                | GatewayErrorKind::BudgetExceeded(_)
                | GatewayErrorKind::QualityGateRejected(_)
                | GatewayErrorKind::BackendRejected(_)
                | GatewayErrorKind::AdmissionRejected(_)
        )
    }

    /// Caller-visible label for this failure.
    pub fn call_error_kind(&self) -> CallErrorKind {
        match self {
            GatewayErrorKind::Validation(_) => CallErrorKind::Validation,
            GatewayErrorKind::BudgetExceeded(_) => CallErrorKind::BudgetExceeded,
            GatewayErrorKind::QualityGateRejected(_) => CallErrorKind::QualityGateRejected,
            GatewayErrorKind::Timeout(_) => CallErrorKind::Timeout,
            GatewayErrorKind::Backend(_) => CallErrorKind::BackendError,
            GatewayErrorKind::BackendRejected(_) => CallErrorKind::BackendRejected,
            GatewayErrorKind::AdmissionRejected(_) => CallErrorKind::AdmissionRejected,
            GatewayErrorKind::MaxRetriesExceeded { .. } => CallErrorKind::MaxRetriesExceeded,
        }
    }
}

/// Gateway error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    kind: GatewayErrorKind,
    line: u32,
    file: &'static str,
}

impl GatewayError {
    /// Create a new gateway error with caller location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GatewayErrorKind {
        &self.kind
    }

    /// Consume the error, returning its kind.
    pub fn into_kind(self) -> GatewayErrorKind {
        self.kind
    }

    /// Shortcut for [`GatewayErrorKind::is_terminal`].
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    /// Shortcut for [`GatewayErrorKind::call_error_kind`].
    pub fn call_error_kind(&self) -> CallErrorKind {
        self.kind.call_error_kind()
    }
}

impl From<BackendError> for GatewayError {
    #[track_caller]
    fn from(err: BackendError) -> Self {
        let message = format!("{}: {}", err.provider, err.message);
        let kind = match err.failure {
            BackendFailure::Terminal => GatewayErrorKind::BackendRejected(message),
            BackendFailure::Transient | BackendFailure::Unavailable => {
                GatewayErrorKind::Backend(message)
            }
        };
        Self::new(kind)
    }
}

impl From<GatewayErrorKind> for GatewayError {
    #[track_caller]
    fn from(kind: GatewayErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for dispatch operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
