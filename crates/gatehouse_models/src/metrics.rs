//! OpenTelemetry instruments for backend calls.
//!
//! One set of instruments is shared by every adapter, labelled by provider
//! and model. Without an installed meter provider every instrument is a no-op.

use gatehouse_core::TokenUsage;
use gatehouse_error::BackendFailure;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::OnceLock;

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Backend call instruments.
#[derive(Clone)]
pub struct LlmMetrics {
    /// Backend calls, labelled with `outcome` ("ok" or the failure class)
    pub calls: Counter<u64>,
    /// Backend call latency in seconds, successes and failures alike
    pub latency: Histogram<f64>,
    /// Tokens, labelled with `direction` ("input" or "output")
    pub tokens: Counter<u64>,
    /// Reported or estimated spend in USD
    pub cost: Counter<f64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("gatehouse_backends");

        Self {
            calls: meter
                .u64_counter("gatehouse.backend.calls")
                .with_description("Backend calls by outcome")
                .build(),
            latency: meter
                .f64_histogram("gatehouse.backend.latency")
                .with_unit("s")
                .with_description("Backend call latency")
                .build(),
            tokens: meter
                .u64_counter("gatehouse.backend.tokens")
                .with_description("Tokens consumed by direction")
                .build(),
            cost: meter
                .f64_counter("gatehouse.backend.cost")
                .with_unit("USD")
                .with_description("Spend attributed to backend calls")
                .build(),
        }
    }

    /// Shared instance, created on first use.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    fn labels(provider: &str, model: &str, outcome: String) -> [KeyValue; 3] {
        [
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("outcome", outcome),
        ]
    }

    /// Record a call that returned content.
    pub fn record_success(
        &self,
        provider: &str,
        model: &str,
        latency_secs: f64,
        usage: &TokenUsage,
        cost: f64,
    ) {
        let labels = Self::labels(provider, model, "ok".to_string());
        self.calls.add(1, &labels);
        self.latency.record(latency_secs, &labels);
        self.cost.add(cost.max(0.0), &labels[..2]);

        for (direction, count) in [
            ("input", *usage.prompt_tokens()),
            ("output", *usage.completion_tokens()),
        ] {
            self.tokens.add(
                count,
                &[
                    KeyValue::new("provider", provider.to_string()),
                    KeyValue::new("model", model.to_string()),
                    KeyValue::new("direction", direction),
                ],
            );
        }
    }

    /// Record a failed call with its classification.
    pub fn record_failure(
        &self,
        provider: &str,
        model: &str,
        latency_secs: f64,
        failure: BackendFailure,
    ) {
        let labels = Self::labels(provider, model, failure.to_string());
        self.calls.add(1, &labels);
        self.latency.record(latency_secs, &labels);
    }
}
