//! Cloud inference through the Anthropic Messages API.

use crate::http::{join_url, priced_reply, record_outcome, send_json};
use gatehouse_core::TokenUsage;
use gatehouse_error::BackendError;
use gatehouse_interface::{BackendReply, Capability, InferenceBackend};
use gatehouse_rate_limit::PricingConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

/// Default Anthropic endpoint.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Anthropic Messages API backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    name: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
    default_model: String,
    pricing: PricingConfig,
}

impl AnthropicBackend {
    /// Create a backend. Without an API key the backend reports itself unavailable.
    pub fn new(
        name: impl Into<String>,
        api_key: Option<String>,
        default_model: impl Into<String>,
    ) -> Self {
        debug!("Creating new Anthropic backend");
        Self {
            name: name.into(),
            client: Client::new(),
            base_url: DEFAULT_ANTHROPIC_URL.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            default_model: default_model.into(),
            pricing: PricingConfig::default(),
        }
    }

    /// Override the endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attach pricing.
    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model: &str,
    ) -> Result<(BackendReply, TokenUsage), BackendError> {
        let Some(api_key) = &self.api_key else {
            return Err(BackendError::unavailable(&self.name, "API key not configured"));
        };

        let body = MessagesBody {
            model,
            max_tokens,
            // Anthropic accepts [0, 1].
            temperature: temperature.min(1.0),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .client
            .post(join_url(&self.base_url, "v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let reply: MessagesReply = send_json(&self.name, request).await?;

        let content = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let usage = reply.usage.map(|u| (u.input_tokens, u.output_tokens));
        Ok(priced_reply(&self.pricing, prompt, content, usage, reply.model))
    }
}

#[async_trait::async_trait]
impl InferenceBackend for AnthropicBackend {
    #[instrument(skip(self, prompt), fields(provider = %self.name, prompt_len = prompt.len()))]
    async fn invoke(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model_hint: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        let model = model_hint.unwrap_or(&self.default_model);
        debug!(model, "Generating response with Anthropic");

        let started = Instant::now();
        let outcome = self.generate(prompt, max_tokens, temperature, model).await;
        record_outcome(&self.name, model, started, &outcome);
        outcome.map(|(reply, _)| reply)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::Cloud
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}
