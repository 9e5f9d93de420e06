//! The outbound call response.

use crate::{AuditRecord, QualityOutcome};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use gatehouse_error::CallErrorKind;
use serde::{Deserialize, Serialize};

/// Result of one gateway call. Failures are values, never panics.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct CallResponse {
    /// Request identifier
    id: String,
    /// Whether content was produced and accepted
    success: bool,
    /// Generated content (empty on failure)
    content: String,
    /// Hallucination score in [0, 1]
    hallucination_score: f64,
    /// Quality score in [0, 1]
    quality_score: f64,
    /// Wall-clock latency in milliseconds
    latency_ms: u64,
    /// Tokens reported by the backend
    tokens_used: u64,
    /// Cost recorded against the budget
    cost: f64,
    /// Memory items folded into the prompt
    memory_hits: u32,
    /// Memory writes queued for this call
    memory_updates: u32,
    /// Human-readable failure description
    error_message: Option<String>,
    /// Failure label
    error_kind: Option<CallErrorKind>,
    /// Provider that answered
    provider_used: Option<String>,
    /// Model that answered
    model_used: Option<String>,
    /// When the response was produced
    timestamp: DateTime<Utc>,
    /// Full audit record for this call
    audit_record: AuditRecord,
}

impl CallResponse {
    /// Build a successful response. Accounting fields come from the audit record.
    pub fn succeeded(content: impl Into<String>, audit_record: AuditRecord) -> Self {
        let (hallucination_score, quality_score) = scores_for(&audit_record);
        Self {
            id: audit_record.call_id.clone(),
            success: true,
            content: content.into(),
            hallucination_score,
            quality_score,
            latency_ms: audit_record.latency_ms,
            tokens_used: audit_record.tokens_used,
            cost: audit_record.actual_cost,
            memory_hits: audit_record.memory_hits,
            memory_updates: u32::from(audit_record.memory_updated),
            error_message: None,
            error_kind: None,
            provider_used: audit_record.provider_used.clone(),
            model_used: audit_record.model_used.clone(),
            timestamp: audit_record.timestamp,
            audit_record,
        }
    }

    /// Build a failed response carrying an error label and message.
    pub fn failed(
        error_kind: CallErrorKind,
        error_message: impl Into<String>,
        audit_record: AuditRecord,
    ) -> Self {
        let (hallucination_score, quality_score) = scores_for(&audit_record);
        Self {
            id: audit_record.call_id.clone(),
            success: false,
            content: String::new(),
            hallucination_score,
            quality_score,
            latency_ms: audit_record.latency_ms,
            tokens_used: audit_record.tokens_used,
            cost: audit_record.actual_cost,
            memory_hits: audit_record.memory_hits,
            memory_updates: u32::from(audit_record.memory_updated),
            error_message: Some(error_message.into()),
            error_kind: Some(error_kind),
            provider_used: audit_record.provider_used.clone(),
            model_used: audit_record.model_used.clone(),
            timestamp: audit_record.timestamp,
            audit_record,
        }
    }
}

/// Derive (hallucination, quality) scores from the recorded quality verdict.
///
/// No verdict means the gate did not run, which reads as a clean result.
/// An unknown verdict uses a neutral 0.5 quality and no hallucination signal.
fn scores_for(record: &AuditRecord) -> (f64, f64) {
    match &record.quality {
        None => (0.0, 1.0),
        Some(detection) if detection.outcome == QualityOutcome::Unknown => (0.0, 0.5),
        Some(detection) => {
            let severity = detection.severity_score.clamp(0.0, 1.0);
            (severity, 1.0 - severity)
        }
    }
}
