//! Generic OpenAI-compatible chat completions backend.
//!
//! Works with any endpoint implementing `POST /chat/completions`: OpenAI,
//! Groq, vLLM, llama.cpp server and similar. This is the usual fallback
//! target because nearly every provider speaks the format.

use crate::http::{join_url, priced_reply, record_outcome, send_json};
use gatehouse_core::TokenUsage;
use gatehouse_error::BackendError;
use gatehouse_interface::{BackendReply, Capability, InferenceBackend};
use gatehouse_rate_limit::PricingConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleBackend {
    name: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
    requires_key: bool,
    default_model: String,
    pricing: PricingConfig,
    capability: Capability,
}

impl OpenAiCompatibleBackend {
    /// Create a backend for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// `requires_key` marks the backend unavailable when `api_key` is absent.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        requires_key: bool,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            requires_key,
            default_model: default_model.into(),
            pricing: PricingConfig::default(),
            capability: Capability::Cloud,
        }
    }

    /// Attach pricing.
    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    /// Mark the endpoint as self-hosted.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = capability;
        self
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model: &str,
    ) -> Result<(BackendReply, TokenUsage), BackendError> {
        if !self.is_available() {
            return Err(BackendError::unavailable(&self.name, "API key not configured"));
        }

        let body = CompletionBody {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let mut request = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let reply: CompletionReply = send_json(&self.name, request).await?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::transient(&self.name, "Response contained no choices"))?;
        let usage = reply
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens));
        Ok(priced_reply(
            &self.pricing,
            prompt,
            content,
            usage,
            reply.model.unwrap_or_else(|| model.to_string()),
        ))
    }
}

#[async_trait::async_trait]
impl InferenceBackend for OpenAiCompatibleBackend {
    #[instrument(skip(self, prompt), fields(provider = %self.name, prompt_len = prompt.len()))]
    async fn invoke(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model_hint: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        let model = model_hint.unwrap_or(&self.default_model);
        debug!(model, "Generating with OpenAI-compatible endpoint");

        let started = Instant::now();
        let outcome = self.generate(prompt, max_tokens, temperature, model).await;
        record_outcome(&self.name, model, started, &outcome);
        outcome.map(|(reply, _)| reply)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn is_available(&self) -> bool {
        !self.requires_key || self.api_key.is_some()
    }
}
