//! Audit trail records.

use crate::CallKind;
use chrono::{DateTime, Utc};
use gatehouse_error::CallErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the quality gate judged a response.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QualityOutcome {
    /// Below the warning threshold
    Clean,
    /// Accepted with a warning prefix
    Warned,
    /// Rejected as severe
    Rejected,
    /// The evaluator failed; the score is a neutral placeholder
    Unknown,
}

/// Quality gate verdict captured for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDetection {
    /// Verdict
    pub outcome: QualityOutcome,
    /// Severity score in [0, 1]
    pub severity_score: f64,
    /// Issues reported by the evaluator
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Everything the gateway knows about one call after it finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Request identifier
    pub call_id: String,
    /// Business category
    pub call_kind: CallKind,
    /// Calling module
    pub caller_module: String,
    /// Calling function
    pub caller_function: String,
    /// Request priority
    pub priority: u8,
    /// Provider named on the request
    pub provider_requested: String,
    /// Provider that produced the final answer
    pub provider_used: Option<String>,
    /// Model that produced the final answer
    pub model_used: Option<String>,
    /// Attempts made for the call, at least 1. Calls rejected before dispatch
    /// (validation, admission, budget) count one.
    pub attempts: u32,
    /// Whether the inline fallback produced the answer
    pub fallback_used: bool,
    /// Pre-flight cost estimate
    pub estimated_cost: f64,
    /// Cost recorded against the budget
    pub actual_cost: f64,
    /// Tokens reported by the backend
    pub tokens_used: u64,
    /// Wall-clock latency in milliseconds
    pub latency_ms: u64,
    /// Memory items folded into the prompt
    pub memory_hits: u32,
    /// Whether the exchange was queued for memory write-back
    pub memory_updated: bool,
    /// Quality verdict, when the gate ran
    pub quality: Option<QualityDetection>,
    /// Overall outcome
    pub success: bool,
    /// Failure label
    pub error_kind: Option<CallErrorKind>,
    /// Caller metadata
    #[serde(default)]
    pub business_context: HashMap<String, serde_json::Value>,
    /// When the call finished
    pub timestamp: DateTime<Utc>,
}
