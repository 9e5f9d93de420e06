//! Local inference through an Ollama-compatible server.

use crate::http::{join_url, priced_reply, record_outcome, send_json};
use gatehouse_core::TokenUsage;
use gatehouse_error::BackendError;
use gatehouse_interface::{BackendReply, Capability, InferenceBackend};
use gatehouse_rate_limit::PricingConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Backend for a self-hosted Ollama server (`POST /api/generate`).
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    name: String,
    client: Client,
    base_url: String,
    default_model: String,
    pricing: PricingConfig,
}

impl OllamaBackend {
    /// Create a backend for the server at `base_url`.
    #[instrument(name = "ollama_backend_new", skip_all)]
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let base_url = base_url.into();
        info!(name = %name, url = %base_url, "Creating Ollama backend");
        Self {
            name,
            client: Client::new(),
            base_url,
            default_model: default_model.into(),
            pricing: PricingConfig::default(),
        }
    }

    /// Attach pricing (local servers are usually free).
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
        let body = GenerateBody {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let request = self
            .client
            .post(join_url(&self.base_url, "api/generate"))
            .json(&body);
        let reply: GenerateReply = send_json(&self.name, request).await?;

        let usage = reply.prompt_eval_count.zip(reply.eval_count);
        Ok(priced_reply(
            &self.pricing,
            prompt,
            reply.response,
            usage,
            reply.model.unwrap_or_else(|| model.to_string()),
        ))
    }
}

#[async_trait::async_trait]
impl InferenceBackend for OllamaBackend {
    #[instrument(skip(self, prompt), fields(provider = %self.name, prompt_len = prompt.len()))]
    async fn invoke(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model_hint: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        let model = model_hint.unwrap_or(&self.default_model);
        debug!(model, "Generating with Ollama");

        let started = Instant::now();
        let outcome = self.generate(prompt, max_tokens, temperature, model).await;
        record_outcome(&self.name, model, started, &outcome);
        outcome.map(|(reply, _)| reply)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::Local
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}
