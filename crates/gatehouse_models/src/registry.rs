//! Construct adapters from provider configuration.

use crate::{AnthropicBackend, OllamaBackend, OpenAiCompatibleBackend};
use crate::anthropic::DEFAULT_ANTHROPIC_URL;
use crate::ollama::DEFAULT_OLLAMA_URL;
use gatehouse_error::{ConfigError, GatehouseResult};
use gatehouse_interface::InferenceBackend;
use gatehouse_rate_limit::{GatehouseConfig, ProviderConfig, ProviderKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Read the API key named by `api_key_env`, if any.
fn api_key(name: &str, config: &ProviderConfig) -> Option<String> {
    let var = config.api_key_env.as_deref()?;
    match std::env::var(var) {
        Ok(key) => Some(key),
        Err(_) => {
            warn!(provider = name, env = var, "API key environment variable not set");
            None
        }
    }
}

/// Build the adapter for one configured provider.
///
/// # Errors
///
/// Returns a configuration error when a required endpoint is missing.
#[instrument(skip(config), fields(kind = %config.kind))]
pub fn build_backend(
    name: &str,
    config: &ProviderConfig,
) -> GatehouseResult<Arc<dyn InferenceBackend>> {
    let backend: Arc<dyn InferenceBackend> = match config.kind {
        ProviderKind::Local => Arc::new(
            OllamaBackend::new(
                name,
                config.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL),
                &config.default_model,
            )
            .with_pricing(config.pricing),
        ),
        ProviderKind::Anthropic => Arc::new(
            AnthropicBackend::new(name, api_key(name, config), &config.default_model)
                .with_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_ANTHROPIC_URL))
                .with_pricing(config.pricing),
        ),
        ProviderKind::OpenaiCompatible => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                ConfigError::new(format!("providers.{}.base_url is required", name))
            })?;
            Arc::new(
                OpenAiCompatibleBackend::new(
                    name,
                    base_url,
                    api_key(name, config),
                    config.api_key_env.is_some(),
                    &config.default_model,
                )
                .with_pricing(config.pricing),
            )
        }
    };
    debug!(available = backend.is_available(), "Built backend");
    Ok(backend)
}

/// Build adapters for every enabled provider.
pub fn build_backends(
    config: &GatehouseConfig,
) -> GatehouseResult<HashMap<String, Arc<dyn InferenceBackend>>> {
    config
        .providers
        .iter()
        .filter(|(_, provider)| provider.enabled)
        .map(|(name, provider)| {
            build_backend(name, provider).map(|backend| (name.clone(), backend))
        })
        .collect()
}
