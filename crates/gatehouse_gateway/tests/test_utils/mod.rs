//! Mock collaborators and builders for gateway tests.

#![allow(dead_code)]

use async_trait::async_trait;
use gatehouse_core::{AuditRecord, CallRequest, CallRequestBuilder, Message};
use gatehouse_error::{BackendError, BackendFailure, Collaborator, CollaboratorError};
use gatehouse_gateway::{Gateway, GatewayBuilder, ProviderRouter};
use gatehouse_interface::{
    AuditSink, BackendReply, Capability, ExchangeSummary, InferenceBackend, MemoryItem,
    MemoryStore, MemoryStream, QualityGate, QualityVerdict,
};
use gatehouse_rate_limit::{
    AdmissionGate, BudgetTracker, PricingConfig, RetryOrchestrator, RetryPolicy, RoutingConfig,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted backend behaviour.
#[derive(Debug, Clone)]
pub enum Step {
    /// Succeed with this content
    Reply(String),
    /// Fail with this classification
    Fail(BackendFailure),
    /// Never complete
    Hang,
}

/// Backend that plays back a script and records how it was called.
///
/// When the script runs out it keeps replying with `"ok"`.
pub struct ScriptedBackend {
    name: String,
    capability: Capability,
    script: Mutex<VecDeque<Step>>,
    delay: Duration,
    cost: f64,
    tokens: u64,
    available: AtomicBool,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    model_hints: Mutex<Vec<Option<String>>>,
}

impl ScriptedBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capability: Capability::Local,
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            cost: 0.0,
            tokens: 42,
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            model_hints: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(self, steps: Vec<Step>) -> Self {
        *self.script.lock().unwrap() = steps.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn last_model_hint(&self) -> Option<String> {
        self.model_hints.lock().unwrap().last().cloned().flatten()
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn invoke(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
        model_hint: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));

        self.prompts.lock().unwrap().push(prompt.to_string());
        self.model_hints
            .lock()
            .unwrap()
            .push(model_hint.map(str::to_string));
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Reply("ok".to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match step {
            Step::Reply(content) => Ok(BackendReply::new(
                content,
                self.tokens,
                self.cost,
                model_hint.unwrap_or("mock-model"),
            )),
            Step::Fail(failure) => Err(BackendError::new(&self.name, failure, "scripted failure")),
            Step::Hang => std::future::pending().await,
        }
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Memory store returning fixed items and forwarding write-backs to a channel.
pub struct StaticMemory {
    items: Vec<MemoryItem>,
    writes: mpsc::UnboundedSender<ExchangeSummary>,
}

impl StaticMemory {
    pub fn new(items: Vec<MemoryItem>) -> (Self, mpsc::UnboundedReceiver<ExchangeSummary>) {
        let (writes, rx) = mpsc::unbounded_channel();
        (Self { items, writes }, rx)
    }
}

#[async_trait]
impl MemoryStore for StaticMemory {
    async fn retrieve_context(
        &self,
        _query: &str,
        max_items: usize,
    ) -> Result<MemoryStream, CollaboratorError> {
        let items: Vec<MemoryItem> = self.items.iter().take(max_items).cloned().collect();
        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    async fn record_exchange(
        &self,
        entry: ExchangeSummary,
        _importance: f64,
    ) -> Result<(), CollaboratorError> {
        let _ = self.writes.send(entry);
        Ok(())
    }
}

/// Memory store whose retrieval stream never yields.
pub struct StallingMemory;

#[async_trait]
impl MemoryStore for StallingMemory {
    async fn retrieve_context(
        &self,
        _query: &str,
        _max_items: usize,
    ) -> Result<MemoryStream, CollaboratorError> {
        Ok(Box::pin(futures_util::stream::pending::<MemoryItem>()))
    }

    async fn record_exchange(
        &self,
        _entry: ExchangeSummary,
        _importance: f64,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Memory store whose every operation fails.
#[derive(Default)]
pub struct FailingMemory {
    pub retrievals: AtomicUsize,
}

#[async_trait]
impl MemoryStore for FailingMemory {
    async fn retrieve_context(
        &self,
        _query: &str,
        _max_items: usize,
    ) -> Result<MemoryStream, CollaboratorError> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::new(Collaborator::Memory, "store offline"))
    }

    async fn record_exchange(
        &self,
        _entry: ExchangeSummary,
        _importance: f64,
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::new(Collaborator::Memory, "store offline"))
    }
}

/// Quality gate returning a fixed verdict, or failing.
pub struct ScriptedQuality {
    verdict: Option<QualityVerdict>,
}

impl ScriptedQuality {
    pub fn scoring(severity_score: f64, is_severe: bool) -> Self {
        Self {
            verdict: Some(QualityVerdict {
                is_severe,
                severity_score,
                issues: vec!["unsupported claim".to_string()],
            }),
        }
    }

    pub fn failing() -> Self {
        Self { verdict: None }
    }
}

#[async_trait]
impl QualityGate for ScriptedQuality {
    async fn evaluate(
        &self,
        _content: &str,
        _context: &str,
    ) -> Result<QualityVerdict, CollaboratorError> {
        self.verdict
            .clone()
            .ok_or_else(|| CollaboratorError::new(Collaborator::Quality, "evaluator crashed"))
    }
}

/// Audit sink forwarding records to a channel.
pub struct ChannelSink(pub mpsc::UnboundedSender<AuditRecord>);

#[async_trait]
impl AuditSink for ChannelSink {
    async fn persist(&self, record: &AuditRecord) -> Result<(), CollaboratorError> {
        let _ = self.0.send(record.clone());
        Ok(())
    }
}

/// Routing with `local` as default and `generic` as fallback.
pub fn routing() -> RoutingConfig {
    RoutingConfig {
        default_provider: Some("local".to_string()),
        fallback_provider: Some("generic".to_string()),
        call_kinds: HashMap::from([("deep_analysis".to_string(), "cloud".to_string())]),
    }
}

/// Router over the given backends, all free.
pub fn router(backends: &[Arc<ScriptedBackend>]) -> ProviderRouter {
    backends.iter().fold(ProviderRouter::new(routing()), |router, backend| {
        router.with_backend(
            Arc::clone(backend) as Arc<dyn InferenceBackend>,
            PricingConfig::default(),
        )
    })
}

/// Gateway builder with generous limits and one-second backoff.
pub fn gateway_builder(router: ProviderRouter) -> GatewayBuilder {
    Gateway::builder()
        .router(router)
        .budget(BudgetTracker::new(100.0, 1000.0).unwrap())
        .admission(AdmissionGate::new(10, None))
        .retry(RetryOrchestrator::new(RetryPolicy::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(30),
        )))
}

/// Request builder with provenance filled in.
pub fn request_builder(prompt: &str) -> CallRequestBuilder {
    let mut builder = CallRequest::builder();
    builder
        .messages(vec![Message::user(prompt)])
        .caller_module("tests")
        .caller_function("gateway");
    builder
}

pub fn request(prompt: &str) -> CallRequest {
    request_builder(prompt).build().unwrap()
}
