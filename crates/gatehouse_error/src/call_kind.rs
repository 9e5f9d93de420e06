//! Caller-visible error labels.

use serde::{Deserialize, Serialize};

/// Error classification attached to every failed `CallResponse`.
///
/// This is the only error surface callers inspect; internal error structs
/// are mapped onto it before a response leaves the gateway.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallErrorKind {
    /// Request failed shape or bounds validation.
    Validation,
    /// Estimated cost exceeds the remaining budget or the request's ceiling.
    BudgetExceeded,
    /// Quality gate judged the response severe.
    QualityGateRejected,
    /// An attempt overran its deadline.
    Timeout,
    /// Backend failed transiently.
    BackendError,
    /// Backend refused the request and fallback did not recover it.
    BackendRejected,
    /// Admission backlog was full.
    AdmissionRejected,
    /// Transient failures persisted through every retry.
    MaxRetriesExceeded,
}

impl CallErrorKind {
    /// Whether this classification is terminal (never retried).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallErrorKind::Validation
                | CallErrorKind::BudgetExceeded
                | CallErrorKind::QualityGateRejected
                | CallErrorKind::BackendRejected
                | CallErrorKind::AdmissionRejected
        )
    }
}
