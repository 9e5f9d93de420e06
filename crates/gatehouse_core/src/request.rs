//! The inbound call request and its validation rules.

use crate::{CallKind, Message, Role};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use gatehouse_error::{GatewayError, GatewayErrorKind, GatewayResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on `max_tokens`.
pub const MAX_TOKENS_LIMIT: u32 = 8000;
/// Upper bound on the per-attempt timeout.
pub const MAX_TIMEOUT_SECONDS: f64 = 300.0;
/// Highest accepted priority value.
pub const MAX_PRIORITY: u8 = 10;

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_provider() -> String {
    "auto".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_seconds() -> f64 {
    60.0
}

fn default_max_cost_ceiling() -> f64 {
    1.0
}

fn default_priority() -> u8 {
    5
}

fn default_true() -> bool {
    true
}

/// A single inference call submitted to the gateway.
///
/// # Examples
///
/// ```
/// use gatehouse_core::{CallKind, CallRequest, Message};
///
/// let request = CallRequest::builder()
///     .call_kind(CallKind::FastDecision)
///     .messages(vec![Message::user("Should we rebalance?")])
///     .caller_module("portfolio")
///     .caller_function("rebalance")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.provider(), "auto");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct CallRequest {
    /// Unique identifier, generated when absent.
    #[builder(default = "generate_id()")]
    #[serde(default = "generate_id")]
    id: String,

    /// Business category.
    #[builder(default)]
    #[serde(default)]
    call_kind: CallKind,

    /// Provider name, or `"auto"` to route by call kind.
    #[builder(default = "default_provider()")]
    #[serde(default = "default_provider")]
    provider: String,

    /// Model override; the provider's default model is used when absent.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    model: Option<String>,

    /// Ordered conversation.
    messages: Vec<Message>,

    /// Optional system prompt prepended to the conversation.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    system_prompt: Option<String>,

    /// Maximum output tokens.
    #[builder(default = "default_max_tokens()")]
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,

    /// Sampling temperature.
    #[builder(default = "default_temperature()")]
    #[serde(default = "default_temperature")]
    temperature: f32,

    /// Per-attempt deadline in seconds.
    #[builder(default = "default_timeout_seconds()")]
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: f64,

    /// Enrich the prompt from the memory store and write the exchange back.
    #[builder(default)]
    #[serde(default)]
    use_memory: bool,

    /// Run the quality gate on the response.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    enable_quality_gate: bool,

    /// Largest estimated cost this call may incur.
    #[builder(default = "default_max_cost_ceiling()")]
    #[serde(default = "default_max_cost_ceiling")]
    max_cost_ceiling: f64,

    /// Informational priority, recorded in the audit trail.
    #[builder(default = "default_priority()")]
    #[serde(default = "default_priority")]
    priority: u8,

    /// Module that issued the call.
    caller_module: String,

    /// Function that issued the call.
    caller_function: String,

    /// Free-form metadata carried into the audit record.
    #[builder(default)]
    #[serde(default)]
    business_context: HashMap<String, serde_json::Value>,

    /// Creation timestamp.
    #[builder(default = "Utc::now()")]
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl CallRequest {
    /// Creates a new request builder.
    pub fn builder() -> CallRequestBuilder {
        CallRequestBuilder::default()
    }

    /// Check every field bound. Never contacts a backend.
    #[track_caller]
    pub fn validate(&self) -> GatewayResult<()> {
        let invalid = |reason: String| Err(GatewayError::new(GatewayErrorKind::Validation(reason)));

        if self.messages.is_empty() {
            return invalid("messages must not be empty".to_string());
        }
        if self.messages.iter().all(|m| m.content.trim().is_empty()) {
            return invalid("messages must contain non-blank content".to_string());
        }
        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return invalid(format!(
                "max_tokens must be in 1..={}, got {}",
                MAX_TOKENS_LIMIT, self.max_tokens
            ));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return invalid(format!(
                "temperature must be in [0, 2], got {}",
                self.temperature
            ));
        }
        if !self.timeout_seconds.is_finite()
            || self.timeout_seconds <= 0.0
            || self.timeout_seconds > MAX_TIMEOUT_SECONDS
        {
            return invalid(format!(
                "timeout_seconds must be in (0, {}], got {}",
                MAX_TIMEOUT_SECONDS, self.timeout_seconds
            ));
        }
        if !self.max_cost_ceiling.is_finite() || self.max_cost_ceiling <= 0.0 {
            return invalid(format!(
                "max_cost_ceiling must be positive, got {}",
                self.max_cost_ceiling
            ));
        }
        if self.priority > MAX_PRIORITY {
            return invalid(format!(
                "priority must be at most {}, got {}",
                MAX_PRIORITY, self.priority
            ));
        }
        if self.provider.trim().is_empty() {
            return invalid("provider must not be blank".to_string());
        }
        if self.caller_module.trim().is_empty() {
            return invalid("caller_module must not be blank".to_string());
        }
        if self.caller_function.trim().is_empty() {
            return invalid("caller_function must not be blank".to_string());
        }
        Ok(())
    }

    /// Whether the provider is left to routing rules (`"auto"`).
    pub fn is_auto_routed(&self) -> bool {
        self.provider.eq_ignore_ascii_case("auto")
    }

    /// Flatten the conversation into a single prompt.
    ///
    /// The system prompt (if any) comes first, then each message in order.
    pub fn render_prompt(&self) -> String {
        let mut sections = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = &self.system_prompt {
            sections.push(format!("{}: {}", Role::System.as_wire(), system));
        }
        for message in &self.messages {
            sections.push(format!("{}: {}", message.role.as_wire(), message.content));
        }
        sections.join("\n\n")
    }

    /// Text of the last user message, used as the memory lookup query.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Per-attempt deadline.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.timeout_seconds)
    }
}
