//! Shared HTTP plumbing for the adapters.

use gatehouse_core::{TokenUsage, estimate_tokens};
use gatehouse_error::BackendError;
use gatehouse_interface::BackendReply;
use gatehouse_rate_limit::PricingConfig;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Send a prepared request and decode a JSON body, classifying every failure.
///
/// Connection failures mean the backend is unreachable. Non-success statuses
/// are classified by code. Anything else is transient.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, BackendError> {
    let response = request.send().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to send request");
        if e.is_connect() {
            BackendError::unavailable(provider, format!("Connection failed: {}", e))
        } else if e.is_builder() {
            BackendError::terminal(provider, format!("Invalid request: {}", e))
        } else {
            BackendError::transient(provider, format!("Request failed: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(provider, status = %status, body = %body, "Backend returned error");
        return Err(BackendError::from_status(provider, status.as_u16(), body));
    }

    let parsed = response.json::<T>().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to parse response");
        BackendError::transient(provider, format!("Failed to parse response: {}", e))
    })?;
    debug!(provider, "Received response");
    Ok(parsed)
}

/// Price a reply, estimating usage from text length when the provider reports none.
pub(crate) fn priced_reply(
    pricing: &PricingConfig,
    prompt: &str,
    content: String,
    usage: Option<(u64, u64)>,
    model: String,
) -> (BackendReply, TokenUsage) {
    let usage = match usage {
        Some((input, output)) => TokenUsage::new(input, output),
        None => TokenUsage::new(estimate_tokens(prompt), estimate_tokens(&content)),
    };
    let cost = pricing.cost_of(&usage);
    (
        BackendReply::new(content, *usage.total_tokens(), cost, model),
        usage,
    )
}

/// Record metrics for one finished call.
pub(crate) fn record_outcome(
    provider: &str,
    model: &str,
    started: std::time::Instant,
    outcome: &Result<(BackendReply, TokenUsage), BackendError>,
) {
    let metrics = crate::LlmMetrics::get();
    let latency = started.elapsed().as_secs_f64();
    match outcome {
        Ok((reply, usage)) => {
            metrics.record_success(provider, model, latency, usage, *reply.cost())
        }
        Err(e) => metrics.record_failure(provider, model, latency, e.failure),
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
