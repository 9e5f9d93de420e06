//! The call pipeline: validate, admit, budget, enrich, dispatch, gate, record.

use crate::{AuditLog, CallStats, DispatchState, ProviderRouter, QualityPolicy, RoutedReply};
use chrono::Utc;
use futures_util::StreamExt;
use gatehouse_core::{
    AuditRecord, CallRequest, CallResponse, QualityDetection, QualityOutcome,
};
use gatehouse_error::{
    CollaboratorError, ConfigError, GatehouseResult, GatewayError, GatewayErrorKind, GatewayResult,
};
use gatehouse_interface::{ExchangeSummary, MemoryItem, MemoryStore, QualityGate};
use gatehouse_rate_limit::{
    AdmissionGate, AdmissionPermit, BudgetTracker, GatehouseConfig, MemorySettings,
    RetryOrchestrator, RetryPolicy,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Characters of prompt and response kept in memory write-backs.
const SUMMARY_CHARS: usize = 500;

/// Single entry point for inference calls.
///
/// Owns one budget tracker, one admission gate and one set of counters, all
/// shared by every concurrent [`Gateway::call`]. Wrap the gateway in an `Arc`
/// to call it from several tasks.
///
/// # Example
///
/// ```no_run
/// use gatehouse_core::{CallRequest, Message};
/// use gatehouse_gateway::Gateway;
/// use gatehouse_rate_limit::GatehouseConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::from_config(&GatehouseConfig::load()?)?;
///
/// let request = CallRequest::builder()
///     .messages(vec![Message::user("Summarise today's fills")])
///     .caller_module("reporting")
///     .caller_function("daily_summary")
///     .build()?;
///
/// let response = gateway.call(request).await;
/// println!("{} (${:.4})", response.content(), response.cost());
/// # Ok(())
/// # }
/// ```
#[derive(derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct Gateway {
    /// Provider selection and fallback
    router: ProviderRouter,

    /// Shared spend quotas
    budget: BudgetTracker,

    /// Concurrency cap
    admission: AdmissionGate,

    /// Deadlines and backoff
    retry: RetryOrchestrator,

    /// Thresholds for quality verdicts
    #[builder(default)]
    quality_policy: QualityPolicy,

    /// Memory enrichment limits
    #[builder(default)]
    memory_settings: MemorySettings,

    /// Call counters
    #[builder(default)]
    stats: CallStats,

    /// Recent audit records
    #[builder(default)]
    audit: AuditLog,

    /// Enrichment context source
    #[builder(default, setter(strip_option))]
    memory: Option<Arc<dyn MemoryStore>>,

    /// Content evaluator
    #[builder(default, setter(strip_option))]
    quality_gate: Option<Arc<dyn QualityGate>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("router", &self.router)
            .field("admission", &self.admission)
            .field("retry", &self.retry)
            .field("quality_policy", &self.quality_policy)
            .field("memory", &self.memory.is_some())
            .field("quality_gate", &self.quality_gate.is_some())
            .finish()
    }
}

/// What one call accumulated on its way through the pipeline.
#[derive(Default)]
struct CallTrace {
    provider_used: Option<String>,
    model_used: Option<String>,
    attempts: u32,
    fallback_used: bool,
    estimated_cost: f64,
    actual_cost: f64,
    tokens_used: u64,
    memory_hits: u32,
    memory_updated: bool,
    quality: Option<QualityDetection>,
    permit: Option<AdmissionPermit>,
}

impl Gateway {
    /// Start building a gateway from parts.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// A builder prefilled from configuration, ready for collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an adapter cannot be built.
    pub fn builder_from_config(config: &GatehouseConfig) -> GatehouseResult<GatewayBuilder> {
        config.validate()?;
        Ok(Self::builder()
            .router(ProviderRouter::from_config(config)?)
            .budget(BudgetTracker::from_settings(&config.budget)?)
            .admission(AdmissionGate::from_settings(&config.gateway))
            .retry(RetryOrchestrator::new(RetryPolicy::from_settings(
                &config.gateway,
            )))
            .quality_policy(QualityPolicy::from_settings(&config.quality))
            .memory_settings(config.memory.clone()))
    }

    /// Build a gateway without memory or quality collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an adapter cannot be built.
    pub fn from_config(config: &GatehouseConfig) -> GatehouseResult<Self> {
        Self::builder_from_config(config)?
            .build()
            .map_err(|e| ConfigError::new(e.to_string()).into())
    }

    /// Provider router.
    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    /// Shared budget tracker.
    pub fn budget(&self) -> &BudgetTracker {
        &self.budget
    }

    /// Admission gate.
    pub fn admission(&self) -> &AdmissionGate {
        &self.admission
    }

    /// Call counters.
    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    /// Audit trail.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Run one call through the pipeline.
    ///
    /// Never panics and never returns an error: every failure is reported in
    /// the response's `error_kind` and `error_message`.
    #[instrument(
        skip_all,
        fields(
            call_id = %request.id(),
            call_kind = %request.call_kind(),
            caller = %request.caller_module(),
        )
    )]
    pub async fn call(&self, request: CallRequest) -> CallResponse {
        let started = Instant::now();
        let mut trace = CallTrace::default();
        let outcome = self.run(&request, &mut trace).await;
        self.finish(request, trace, outcome, started)
    }

    async fn run(&self, request: &CallRequest, trace: &mut CallTrace) -> GatewayResult<String> {
        request.validate()?;
        let provider = self.router.select(request)?;

        let permit = match self.admission.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                self.stats.record_concurrency_limit_hit();
                return Err(e);
            }
        };
        if permit.waited() {
            self.stats.record_concurrency_limit_hit();
        }
        trace.permit = Some(permit);

        let mut prompt = request.render_prompt();
        let max_tokens = *request.max_tokens();
        let estimate = self.router.estimate_cost(provider, &prompt, max_tokens);
        trace.estimated_cost = estimate;
        if estimate > *request.max_cost_ceiling() {
            return Err(GatewayError::new(GatewayErrorKind::BudgetExceeded(format!(
                "estimated ${:.4} exceeds the request ceiling ${:.4}",
                estimate,
                request.max_cost_ceiling()
            ))));
        }
        let reservation = self.budget.try_reserve(estimate)?;

        if *request.use_memory() {
            prompt = self.enrich(request, prompt, trace).await;
        }

        let router = &self.router;
        let dispatch_state = DispatchState::default();
        let state = &dispatch_state;
        let prompt_ref = prompt.as_str();
        let temperature = *request.temperature();
        let model_hint = request.model().as_deref();
        let outcome = self
            .retry
            .run(request.timeout(), move |attempt| {
                debug!(attempt = attempt + 1, provider, "Dispatching");
                router.dispatch_with(
                    state,
                    provider,
                    prompt_ref,
                    max_tokens,
                    temperature,
                    model_hint,
                )
            })
            .await;

        self.stats.record_attempts(outcome.retries(), outcome.timeouts);
        trace.attempts = outcome.attempts;

        let RoutedReply {
            reply,
            provider: provider_used,
            fallback_used,
        } = match outcome.result {
            Ok(routed) => routed,
            Err(e) => {
                reservation.settle(0.0);
                return Err(e);
            }
        };

        trace.actual_cost = *reply.cost();
        trace.tokens_used = *reply.tokens_used();
        trace.model_used = Some(reply.model_used().clone());
        trace.provider_used = Some(provider_used.clone());
        trace.fallback_used = fallback_used;
        reservation.settle(trace.actual_cost);

        let mut content = reply.into_content();

        if *request.enable_quality_gate() {
            if let Some(detection) = self.evaluate(request, &content, &prompt).await {
                trace.quality = Some(detection.clone());
                match detection.outcome {
                    QualityOutcome::Rejected => {
                        self.stats.record_quality_rejection();
                        return Err(GatewayError::new(GatewayErrorKind::QualityGateRejected(
                            rejection_reason(&detection),
                        )));
                    }
                    QualityOutcome::Warned => {
                        warn!(
                            severity = detection.severity_score,
                            issues = ?detection.issues,
                            "Response passed with quality warning"
                        );
                        content = self.quality_policy.annotate(&content);
                    }
                    QualityOutcome::Clean | QualityOutcome::Unknown => {}
                }
            }
        }

        if *request.use_memory() {
            trace.memory_updated = self.remember(request, &prompt, &content, &provider_used);
        }

        Ok(content)
    }

    /// Fold memory context into the prompt. Any failure leaves the prompt as is.
    async fn enrich(&self, request: &CallRequest, prompt: String, trace: &mut CallTrace) -> String {
        let Some(store) = &self.memory else {
            return prompt;
        };
        let max_items = self.memory_settings.max_items;
        let query = request.last_user_content().unwrap_or(prompt.as_str());

        // The deadline covers draining the stream too.
        let retrieval = async {
            let stream = store.retrieve_context(query, max_items).await?;
            Ok::<Vec<MemoryItem>, CollaboratorError>(stream.take(max_items).collect().await)
        };
        let items = match tokio::time::timeout(request.timeout(), retrieval).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!(error = %e, "Memory enrichment failed, continuing without context");
                return prompt;
            }
            Err(_) => {
                warn!("Memory enrichment timed out, continuing without context");
                return prompt;
            }
        };

        if items.is_empty() {
            return prompt;
        }

        trace.memory_hits = u32::try_from(items.len()).unwrap_or(u32::MAX);
        debug!(memory_hits = trace.memory_hits, "Enriched prompt with memory context");

        let context = items
            .iter()
            .map(|item| format!("- [{}] {}", item.kind, item.summary))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Relevant context:\n{}\n\n{}", context, prompt)
    }

    /// Ask the quality gate for a verdict. Evaluator failures read as unknown quality.
    async fn evaluate(
        &self,
        request: &CallRequest,
        content: &str,
        prompt: &str,
    ) -> Option<QualityDetection> {
        let gate = self.quality_gate.as_ref()?;
        let detection =
            match tokio::time::timeout(request.timeout(), gate.evaluate(content, prompt)).await {
                Ok(Ok(verdict)) => self.quality_policy.judge(&verdict),
                Ok(Err(e)) => {
                    warn!(error = %e, "Quality evaluation failed, quality unknown");
                    QualityPolicy::unknown(e)
                }
                Err(_) => {
                    warn!("Quality evaluation timed out, quality unknown");
                    QualityPolicy::unknown("evaluation timed out")
                }
            };
        Some(detection)
    }

    /// Queue a summarised exchange for the memory store. Returns whether one was queued.
    fn remember(&self, request: &CallRequest, prompt: &str, content: &str, provider: &str) -> bool {
        let Some(store) = &self.memory else {
            return false;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let entry = ExchangeSummary {
            call_id: request.id().clone(),
            call_kind: *request.call_kind(),
            prompt: truncate_chars(request.last_user_content().unwrap_or(prompt), SUMMARY_CHARS),
            response: truncate_chars(content, SUMMARY_CHARS),
            provider: provider.to_string(),
            timestamp: Utc::now(),
        };
        let importance = self.memory_settings.importance;
        let store = Arc::clone(store);

        handle.spawn(async move {
            let call_id = entry.call_id.clone();
            if let Err(e) = store.record_exchange(entry, importance).await {
                warn!(call_id = %call_id, error = %e, "Memory write-back failed");
            }
        });
        true
    }

    fn finish(
        &self,
        request: CallRequest,
        trace: CallTrace,
        outcome: GatewayResult<String>,
        started: Instant,
    ) -> CallResponse {
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let success = outcome.is_ok();
        self.stats.record_call(success);

        let CallTrace {
            provider_used,
            model_used,
            attempts,
            fallback_used,
            estimated_cost,
            actual_cost,
            tokens_used,
            memory_hits,
            memory_updated,
            quality,
            permit,
        } = trace;
        // A call turned away before dispatch still made its one attempt.
        let attempts = attempts.max(1);

        let record = AuditRecord {
            call_id: request.id().clone(),
            call_kind: *request.call_kind(),
            caller_module: request.caller_module().clone(),
            caller_function: request.caller_function().clone(),
            priority: *request.priority(),
            provider_requested: request.provider().clone(),
            provider_used,
            model_used,
            attempts,
            fallback_used,
            estimated_cost,
            actual_cost,
            tokens_used,
            latency_ms,
            memory_hits,
            memory_updated,
            quality,
            success,
            error_kind: outcome.as_ref().err().map(GatewayError::call_error_kind),
            business_context: request.business_context().clone(),
            timestamp: Utc::now(),
        };
        self.audit.append(record.clone());

        let response = match outcome {
            Ok(content) => {
                info!(
                    provider = record.provider_used.as_deref().unwrap_or_default(),
                    attempts,
                    latency_ms,
                    cost = actual_cost,
                    "Call succeeded"
                );
                CallResponse::succeeded(content, record)
            }
            Err(e) => {
                warn!(
                    error_kind = %e.call_error_kind(),
                    attempts,
                    latency_ms,
                    error = %e.kind(),
                    "Call failed"
                );
                CallResponse::failed(e.call_error_kind(), e.kind().to_string(), record)
            }
        };

        drop(permit);
        response
    }
}

fn rejection_reason(detection: &QualityDetection) -> String {
    if detection.issues.is_empty() {
        format!("severity {:.2}", detection.severity_score)
    } else {
        format!(
            "severity {:.2}: {}",
            detection.severity_score,
            detection.issues.join("; ")
        )
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn rejection_reason_lists_issues() {
        let detection = QualityDetection {
            outcome: QualityOutcome::Rejected,
            severity_score: 0.9,
            issues: vec!["fabricated figure".to_string(), "no source".to_string()],
        };
        assert_eq!(
            rejection_reason(&detection),
            "severity 0.90: fabricated figure; no source"
        );
    }
}
