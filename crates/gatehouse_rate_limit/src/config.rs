//! Layered TOML configuration for the gateway.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from gatehouse.toml)
//! - User overrides (~/.config/gatehouse/gatehouse.toml, then ./gatehouse.toml)
//! - Environment overrides (`GATEHOUSE__GATEWAY__MAX_CONCURRENT_CALLS=4`)

use crate::PricingConfig;
use config::{Config, Environment, File, FileFormat};
use gatehouse_core::CallKind;
use gatehouse_error::{ConfigError, GatehouseError, GatehouseResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../gatehouse.toml");

fn default_max_concurrent_calls() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_seconds() -> f64 {
    1.0
}

fn default_max_delay_seconds() -> f64 {
    30.0
}

fn default_warn_ratio() -> f64 {
    0.8
}

fn default_warn_threshold() -> f64 {
    0.6
}

fn default_severe_threshold() -> f64 {
    0.8
}

fn default_warning_prefix() -> String {
    "[QUALITY WARNING] ".to_string()
}

fn default_memory_items() -> usize {
    5
}

fn default_importance() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

/// Admission and retry settings.
///
/// ```toml
/// [gateway]
/// max_concurrent_calls = 10
/// max_retries = 3
/// base_delay_seconds = 1.0
/// max_delay_seconds = 30.0
/// max_waiting_calls = 100
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Maximum in-flight calls
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay
    #[serde(default = "default_base_delay_seconds")]
    pub base_delay_seconds: f64,

    /// Backoff ceiling
    #[serde(default = "default_max_delay_seconds")]
    pub max_delay_seconds: f64,

    /// Callers allowed to wait for a slot; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_waiting_calls: Option<usize>,

    /// Randomise backoff delays
    #[serde(default)]
    pub jitter: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_concurrent_calls: default_max_concurrent_calls(),
            max_retries: default_max_retries(),
            base_delay_seconds: default_base_delay_seconds(),
            max_delay_seconds: default_max_delay_seconds(),
            max_waiting_calls: None,
            jitter: false,
        }
    }
}

impl GatewaySettings {
    /// First backoff delay as a duration.
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay_seconds)
    }

    /// Backoff ceiling as a duration.
    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_seconds)
    }
}

/// Spend quotas in USD.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BudgetSettings {
    /// Daily quota
    pub daily_budget: f64,

    /// Monthly quota
    pub monthly_budget: f64,

    /// Spend ratio at which a warning is logged
    #[serde(default = "default_warn_ratio")]
    pub warn_ratio: f64,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            daily_budget: 20.0,
            monthly_budget: 400.0,
            warn_ratio: default_warn_ratio(),
        }
    }
}

/// Quality gate policy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QualitySettings {
    /// Severity at or above which a response is passed with a warning
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: f64,

    /// Severity at or above which a response is rejected
    #[serde(default = "default_severe_threshold")]
    pub severe_threshold: f64,

    /// Text prepended to warned responses
    #[serde(default = "default_warning_prefix")]
    pub warning_prefix: String,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            warn_threshold: default_warn_threshold(),
            severe_threshold: default_severe_threshold(),
            warning_prefix: default_warning_prefix(),
        }
    }
}

/// Memory enrichment settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MemorySettings {
    /// Items requested per enrichment
    #[serde(default = "default_memory_items")]
    pub max_items: usize,

    /// Importance attached to written-back exchanges
    #[serde(default = "default_importance")]
    pub importance: f64,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_items: default_memory_items(),
            importance: default_importance(),
        }
    }
}

/// Provider selection rules.
///
/// ```toml
/// [routing]
/// default_provider = "local"
/// fallback_provider = "openai_compatible"
///
/// [routing.call_kinds]
/// deep_analysis = "anthropic"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Provider used when nothing more specific matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    /// Generic backend tried once when the preferred one fails unrecoverably
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,

    /// Provider per call kind (snake_case kind names)
    #[serde(default)]
    pub call_kinds: HashMap<String, String>,
}

impl RoutingConfig {
    /// Provider configured for a call kind, if any.
    pub fn provider_for(&self, kind: CallKind) -> Option<&str> {
        self.call_kinds.get(kind.as_ref()).map(String::as_str)
    }
}

/// Which adapter implementation serves a provider.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// Ollama-style local server
    Local,
    /// Anthropic Messages API
    Anthropic,
    /// Any OpenAI-compatible chat completions endpoint
    OpenaiCompatible,
}

/// Configuration for one provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Adapter implementation
    pub kind: ProviderKind,

    /// Endpoint root; the adapter default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Model used when the request names none
    pub default_model: String,

    /// Token and per-call pricing
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Disabled providers are never registered
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Top-level Gatehouse configuration.
///
/// # Example
///
/// ```no_run
/// use gatehouse_rate_limit::GatehouseConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GatehouseConfig::load()?;
/// println!("max concurrent calls: {}", config.gateway.max_concurrent_calls);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct GatehouseConfig {
    /// Admission and retry
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Spend quotas
    #[serde(default)]
    pub budget: BudgetSettings,

    /// Quality policy
    #[serde(default)]
    pub quality: QualitySettings,

    /// Memory enrichment
    #[serde(default)]
    pub memory: MemorySettings,

    /// Provider selection
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn build_error(e: config::ConfigError) -> GatehouseError {
    GatehouseError::from(ConfigError::new(format!(
        "Failed to build configuration: {}",
        e
    )))
}

fn parse_error(e: config::ConfigError) -> GatehouseError {
    GatehouseError::from(ConfigError::new(format!(
        "Failed to parse configuration: {}",
        e
    )))
}

impl GatehouseConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> GatehouseResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                GatehouseError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(parse_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> GatehouseResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> GatehouseResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/gatehouse/gatehouse.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("gatehouse").required(false))
            .add_source(
                Environment::with_prefix("GATEHOUSE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Check operator bounds.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first violated bound.
    pub fn validate(&self) -> GatehouseResult<()> {
        let gateway = &self.gateway;
        if gateway.max_concurrent_calls < 1 {
            return Err(ConfigError::new("gateway.max_concurrent_calls must be at least 1").into());
        }
        if !(gateway.base_delay_seconds.is_finite() && gateway.base_delay_seconds > 0.0) {
            return Err(ConfigError::new("gateway.base_delay_seconds must be positive").into());
        }
        if !(gateway.max_delay_seconds.is_finite() && gateway.max_delay_seconds > 0.0) {
            return Err(ConfigError::new("gateway.max_delay_seconds must be positive").into());
        }
        if gateway.base_delay_seconds > gateway.max_delay_seconds {
            return Err(ConfigError::new(
                "gateway.base_delay_seconds must not exceed gateway.max_delay_seconds",
            )
            .into());
        }

        let budget = &self.budget;
        if !(budget.daily_budget.is_finite() && budget.daily_budget > 0.0) {
            return Err(ConfigError::new("budget.daily_budget must be positive").into());
        }
        if !(budget.monthly_budget.is_finite() && budget.monthly_budget > 0.0) {
            return Err(ConfigError::new("budget.monthly_budget must be positive").into());
        }
        if budget.daily_budget > budget.monthly_budget {
            return Err(
                ConfigError::new("budget.daily_budget must not exceed budget.monthly_budget").into(),
            );
        }
        if !(0.0..=1.0).contains(&budget.warn_ratio) {
            return Err(ConfigError::new("budget.warn_ratio must be in [0, 1]").into());
        }

        let quality = &self.quality;
        if !(0.0..=1.0).contains(&quality.warn_threshold)
            || !(0.0..=1.0).contains(&quality.severe_threshold)
            || quality.warn_threshold >= quality.severe_threshold
        {
            return Err(ConfigError::new(
                "quality thresholds must satisfy 0 <= warn_threshold < severe_threshold <= 1",
            )
            .into());
        }

        for (name, provider) in &self.providers {
            provider.pricing.validate(name)?;
        }

        let routed = self
            .routing
            .default_provider
            .iter()
            .chain(self.routing.fallback_provider.iter())
            .chain(self.routing.call_kinds.values());
        for provider in routed {
            if !self.providers.contains_key(provider) {
                return Err(ConfigError::new(format!(
                    "routing references unknown provider '{}'",
                    provider
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Look up a provider by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> GatehouseResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            GatehouseError::from(ConfigError::new(format!(
                "Failed to render configuration: {}",
                e
            )))
        })
    }
}
