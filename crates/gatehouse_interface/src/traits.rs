//! Trait definitions for inference backends and external collaborators.

use crate::{BackendReply, Capability, ExchangeSummary, MemoryItem, QualityVerdict};
use async_trait::async_trait;
use futures_util::stream::Stream;
use gatehouse_core::AuditRecord;
use gatehouse_error::{BackendError, CollaboratorError};
use std::pin::Pin;

/// Core trait that every inference backend implements.
///
/// Implementations must be cancel-safe: the gateway enforces per-attempt
/// deadlines by dropping the `invoke` future, which must abort the
/// underlying request.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Execute one call.
    ///
    /// Errors carry a [`BackendFailure`](gatehouse_error::BackendFailure) tag.
    /// Anything not explicitly marked terminal is treated as transient.
    async fn invoke(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model_hint: Option<&str>,
    ) -> Result<BackendReply, BackendError>;

    /// Provider name used for routing and audit (e.g. "local", "anthropic").
    fn provider_name(&self) -> &str;

    /// Where this backend runs.
    fn capability(&self) -> Capability;

    /// Default model identifier.
    fn default_model(&self) -> &str;

    /// Whether the backend is usable right now (credentials present, not disabled).
    fn is_available(&self) -> bool {
        true
    }
}

/// Finite, non-restartable sequence of memory items, most relevant first.
pub type MemoryStream = Pin<Box<dyn Stream<Item = MemoryItem> + Send>>;

/// Store that supplies enrichment context and records exchanges.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch up to `max_items` items relevant to `query`.
    async fn retrieve_context(
        &self,
        query: &str,
        max_items: usize,
    ) -> Result<MemoryStream, CollaboratorError>;

    /// Persist a summarised exchange. Callers never wait on or fail because of this.
    async fn record_exchange(
        &self,
        entry: ExchangeSummary,
        importance: f64,
    ) -> Result<(), CollaboratorError>;
}

/// Content evaluator consulted after a successful backend call.
#[async_trait]
pub trait QualityGate: Send + Sync {
    /// Score `content` produced for the given prompt `context`.
    async fn evaluate(
        &self,
        content: &str,
        context: &str,
    ) -> Result<QualityVerdict, CollaboratorError>;
}

/// Persistence collaborator for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one record.
    async fn persist(&self, record: &AuditRecord) -> Result<(), CollaboratorError>;
}
