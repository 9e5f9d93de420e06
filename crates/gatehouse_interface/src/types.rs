//! Value types exchanged with backends and collaborators.

use chrono::{DateTime, Utc};
use gatehouse_core::CallKind;
use serde::{Deserialize, Serialize};

/// Where an inference backend runs.
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Self-hosted model server.
    Local,
    /// Hosted provider API.
    Cloud,
}

/// Outcome of one successful backend invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct BackendReply {
    /// Generated text.
    content: String,
    /// Tokens consumed (input plus output).
    tokens_used: u64,
    /// Actual cost, or an estimate when the provider reports no usage.
    cost: f64,
    /// Model that produced the content.
    model_used: String,
}

impl BackendReply {
    /// Create a reply.
    pub fn new(
        content: impl Into<String>,
        tokens_used: u64,
        cost: f64,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            tokens_used,
            cost: cost.max(0.0),
            model_used: model_used.into(),
        }
    }

    /// Consume the reply, returning the content.
    pub fn into_content(self) -> String {
        self.content
    }
}

/// One item of enrichment context returned by a memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Short summary folded into the prompt.
    pub summary: String,
    /// Relevance to the query in [0, 1].
    pub relevance: f64,
    /// Store-defined item type (e.g. "episodic", "semantic").
    #[serde(rename = "type")]
    pub kind: String,
}

/// Summarised exchange written back to a memory store after a successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSummary {
    /// Originating call.
    pub call_id: String,
    /// Business category of the call.
    pub call_kind: CallKind,
    /// Truncated prompt.
    pub prompt: String,
    /// Truncated response.
    pub response: String,
    /// Provider that answered.
    pub provider: String,
    /// When the exchange completed.
    pub timestamp: DateTime<Utc>,
}

/// Verdict returned by a quality gate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Evaluator considers the content unusable.
    pub is_severe: bool,
    /// Severity in [0, 1].
    pub severity_score: f64,
    /// Human-readable issues.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl QualityVerdict {
    /// A verdict with no issues.
    pub fn clean() -> Self {
        Self::default()
    }
}
