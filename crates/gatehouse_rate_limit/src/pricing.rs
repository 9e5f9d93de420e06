//! Provider pricing and cost estimation.

use gatehouse_core::{TokenUsage, estimate_tokens};
use gatehouse_error::{ConfigError, GatehouseResult};
use serde::{Deserialize, Serialize};

/// Token and per-call pricing for one provider, in USD.
///
/// # Examples
///
/// ```
/// use gatehouse_rate_limit::PricingConfig;
///
/// let pricing = PricingConfig::new(1.0, 2.0, 0.0);
/// // 8 chars -> 2 input tokens, plus 1000 output tokens.
/// let estimate = pricing.estimate("abcdefgh", 1000);
/// assert!((estimate - 0.002002).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct PricingConfig {
    /// Cost per million input tokens
    #[serde(default)]
    pub cost_per_million_input_tokens: f64,

    /// Cost per million output tokens
    #[serde(default)]
    pub cost_per_million_output_tokens: f64,

    /// Flat fee per call
    #[serde(default)]
    pub cost_per_call: f64,
}

impl PricingConfig {
    /// Create a pricing table.
    pub fn new(input: f64, output: f64, per_call: f64) -> Self {
        Self {
            cost_per_million_input_tokens: input,
            cost_per_million_output_tokens: output,
            cost_per_call: per_call,
        }
    }

    /// Worst-case estimate: every allowed output token is generated.
    pub fn estimate(&self, prompt: &str, max_tokens: u32) -> f64 {
        self.cost_of(&TokenUsage::new(
            estimate_tokens(prompt),
            u64::from(max_tokens),
        ))
    }

    /// Actual cost of reported usage.
    pub fn cost_of(&self, usage: &TokenUsage) -> f64 {
        usage.priced_at(
            self.cost_per_million_input_tokens,
            self.cost_per_million_output_tokens,
        ) + self.cost_per_call
    }

    /// Whether every rate is zero.
    pub fn is_free(&self) -> bool {
        self.cost_per_million_input_tokens == 0.0
            && self.cost_per_million_output_tokens == 0.0
            && self.cost_per_call == 0.0
    }

    pub(crate) fn validate(&self, provider: &str) -> GatehouseResult<()> {
        let rates = [
            self.cost_per_million_input_tokens,
            self.cost_per_million_output_tokens,
            self.cost_per_call,
        ];
        if rates.iter().any(|rate| !rate.is_finite() || *rate < 0.0) {
            return Err(ConfigError::new(format!(
                "providers.{}.pricing rates must be non-negative",
                provider
            ))
            .into());
        }
        Ok(())
    }
}
