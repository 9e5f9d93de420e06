//! Provider selection with a single inline fallback.
//!
//! The router never retries. It picks one backend, invokes it once, and on an
//! unrecoverable failure (terminal or unavailable) tries the configured
//! fallback backend once with the same parameters. Transient failures go back
//! to the retry loop untouched. A [`DispatchState`] shared across the attempts
//! of one call keeps a preferred backend that already failed unrecoverably
//! from being invoked again.

use gatehouse_core::CallRequest;
use gatehouse_error::{
    BackendError, BackendFailure, GatehouseResult, GatewayError, GatewayErrorKind, GatewayResult,
};
use gatehouse_interface::{BackendReply, Capability, InferenceBackend};
use gatehouse_models::build_backends;
use gatehouse_rate_limit::{GatehouseConfig, PricingConfig, RoutingConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument, warn};

#[derive(Clone)]
struct Route {
    backend: Arc<dyn InferenceBackend>,
    pricing: PricingConfig,
}

/// Backend reply annotated with the provider that produced it.
#[derive(Debug, Clone)]
pub struct RoutedReply {
    /// What the backend returned
    pub reply: BackendReply,
    /// Provider that answered
    pub provider: String,
    /// Whether the fallback answered instead of the selected provider
    pub fallback_used: bool,
}

/// Per-call dispatch memory, shared by every retry attempt of one call.
#[derive(Debug, Default)]
pub struct DispatchState {
    preferred_failed: AtomicBool,
}

impl DispatchState {
    /// Whether the preferred backend failed unrecoverably on an earlier attempt.
    pub fn preferred_failed(&self) -> bool {
        self.preferred_failed.load(Ordering::Acquire)
    }

    fn mark_preferred_failed(&self) {
        self.preferred_failed.store(true, Ordering::Release);
    }
}

/// Selects and invokes inference backends.
///
/// # Example
///
/// ```no_run
/// use gatehouse_gateway::ProviderRouter;
/// use gatehouse_rate_limit::GatehouseConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GatehouseConfig::load()?;
/// let router = ProviderRouter::from_config(&config)?;
/// for name in router.providers() {
///     println!("{} ({:?})", name, router.capability(name));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProviderRouter {
    routes: HashMap<String, Route>,
    routing: RoutingConfig,
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("providers", &self.providers().collect::<Vec<_>>())
            .field("routing", &self.routing)
            .finish()
    }
}

impl ProviderRouter {
    /// Create an empty router with the given routing rules.
    pub fn new(routing: RoutingConfig) -> Self {
        Self {
            routes: HashMap::new(),
            routing,
        }
    }

    /// Register a backend under its provider name.
    pub fn with_backend(mut self, backend: Arc<dyn InferenceBackend>, pricing: PricingConfig) -> Self {
        let name = backend.provider_name().to_string();
        self.routes.insert(name, Route { backend, pricing });
        self
    }

    /// Build a router with an adapter for every enabled provider in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an adapter cannot be built.
    #[instrument(skip(config))]
    pub fn from_config(config: &GatehouseConfig) -> GatehouseResult<Self> {
        let backends = build_backends(config)?;
        let routes = backends
            .into_iter()
            .map(|(name, backend)| {
                let pricing = config
                    .provider(&name)
                    .map(|provider| provider.pricing)
                    .unwrap_or_default();
                (name, Route { backend, pricing })
            })
            .collect::<HashMap<_, _>>();
        debug!(providers = routes.len(), "Built provider router");

        Ok(Self {
            routes,
            routing: config.routing.clone(),
        })
    }

    /// Registered provider names.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Whether `provider` is registered.
    pub fn contains(&self, provider: &str) -> bool {
        self.routes.contains_key(provider)
    }

    /// Where a registered provider runs.
    pub fn capability(&self, provider: &str) -> Option<Capability> {
        self.routes.get(provider).map(|route| route.backend.capability())
    }

    /// Routing rules in use.
    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Choose the provider for a request.
    ///
    /// An explicitly named, registered provider wins. Otherwise the call kind's
    /// route applies, then the default provider.
    ///
    /// # Errors
    ///
    /// Returns a terminal `Validation` error when nothing registered matches.
    pub fn select(&self, request: &CallRequest) -> GatewayResult<&str> {
        let requested = request.provider().as_str();
        if !request.is_auto_routed() {
            if let Some((name, _)) = self.routes.get_key_value(requested) {
                return Ok(name.as_str());
            }
        }

        let routed = self
            .routing
            .provider_for(*request.call_kind())
            .into_iter()
            .chain(self.routing.default_provider.as_deref())
            .find_map(|name| self.routes.get_key_value(name))
            .map(|(name, _)| name.as_str());

        match routed {
            Some(name) => {
                if !request.is_auto_routed() {
                    warn!(
                        requested,
                        selected = name,
                        "Requested provider not registered, routing by call kind"
                    );
                }
                Ok(name)
            }
            None => Err(GatewayError::new(GatewayErrorKind::Validation(format!(
                "no registered provider for '{}' (call kind {})",
                requested,
                request.call_kind()
            )))),
        }
    }

    /// Pre-flight cost estimate for `prompt` on `provider`. Unknown providers cost nothing.
    pub fn estimate_cost(&self, provider: &str, prompt: &str, max_tokens: u32) -> f64 {
        self.routes
            .get(provider)
            .map(|route| route.pricing.estimate(prompt, max_tokens))
            .unwrap_or(0.0)
    }

    fn fallback_for(&self, preferred: &str) -> Option<(&str, &Route)> {
        let name = self.routing.fallback_provider.as_deref()?;
        if name == preferred {
            return None;
        }
        self.routes
            .get_key_value(name)
            .map(|(name, route)| (name.as_str(), route))
    }

    /// Invoke `provider` once, falling back inline on an unrecoverable failure.
    ///
    /// Equivalent to [`dispatch_with`](Self::dispatch_with) with fresh state.
    ///
    /// # Errors
    ///
    /// Transient failures surface as retryable `Backend` errors. Terminal
    /// failures without a usable fallback surface as `BackendRejected`.
    pub async fn dispatch(
        &self,
        provider: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model_hint: Option<&str>,
    ) -> GatewayResult<RoutedReply> {
        self.dispatch_with(
            &DispatchState::default(),
            provider,
            prompt,
            max_tokens,
            temperature,
            model_hint,
        )
        .await
    }

    /// One attempt of a call. Once `state` records an unrecoverable failure of
    /// `provider`, the attempt goes straight to the fallback.
    ///
    /// # Errors
    ///
    /// Same as [`dispatch`](Self::dispatch).
    #[instrument(skip(self, state, prompt, model_hint), fields(prompt_len = prompt.len()))]
    pub async fn dispatch_with(
        &self,
        state: &DispatchState,
        provider: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        model_hint: Option<&str>,
    ) -> GatewayResult<RoutedReply> {
        let route = self.routes.get(provider).ok_or_else(|| {
            GatewayError::new(GatewayErrorKind::Validation(format!(
                "provider '{}' is not registered",
                provider
            )))
        })?;

        let failure = if state.preferred_failed() {
            BackendError::new(
                provider,
                BackendFailure::Terminal,
                "backend already failed unrecoverably during this call",
            )
        } else if route.backend.is_available() {
            debug!(capability = %route.backend.capability(), "Invoking backend");
            match route
                .backend
                .invoke(prompt, max_tokens, temperature, model_hint)
                .await
            {
                Ok(reply) => {
                    return Ok(RoutedReply {
                        reply,
                        provider: provider.to_string(),
                        fallback_used: false,
                    });
                }
                Err(e) if e.failure == BackendFailure::Transient => return Err(e.into()),
                Err(e) => e,
            }
        } else {
            BackendError::unavailable(provider, "backend is not available")
        };
        state.mark_preferred_failed();

        let Some((fallback, fallback_route)) = self.fallback_for(provider) else {
            return Err(failure.into());
        };

        warn!(
            fallback,
            error = %failure.message,
            "Preferred backend failed unrecoverably, falling back"
        );
        if !fallback_route.backend.is_available() {
            return Err(BackendError::unavailable(fallback, "fallback backend is not available").into());
        }

        // The model hint names a model of the preferred provider, not the fallback.
        let reply = fallback_route
            .backend
            .invoke(prompt, max_tokens, temperature, None)
            .await?;

        Ok(RoutedReply {
            reply,
            provider: fallback.to_string(),
            fallback_used: true,
        })
    }
}
