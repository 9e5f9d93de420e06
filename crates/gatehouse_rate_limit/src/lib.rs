//! Budget tracking, admission control and retry for the Gatehouse gateway.
//!
//! This crate provides:
//! - [`GatehouseConfig`]: layered TOML configuration (bundled, user, env)
//! - [`BudgetTracker`]: daily/monthly spend quotas with calendar rollover
//! - [`AdmissionGate`]: semaphore-bounded concurrency with an optional backlog cap
//! - [`RetryOrchestrator`]: per-attempt deadlines and exponential backoff
//! - [`PricingConfig`]: per-provider cost estimation
//!
//! # Example
//!
//! ```no_run
//! use gatehouse_rate_limit::{AdmissionGate, BudgetTracker, GatehouseConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatehouseConfig::load()?;
//! let gate = AdmissionGate::from_settings(&config.gateway);
//! let budget = BudgetTracker::from_settings(&config.budget)?;
//!
//! let _permit = gate.acquire().await?;
//! let reservation = budget.try_reserve(0.05)?;
//! // ... call the backend ...
//! reservation.settle(0.03);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admission;
mod budget;
mod clock;
mod config;
mod pricing;
mod retry;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use budget::{BudgetReservation, BudgetSnapshot, BudgetTracker};
pub use clock::{Clock, ManualClock, MonthKey, SystemClock};
pub use config::{
    BudgetSettings, DEFAULT_CONFIG, GatehouseConfig, GatewaySettings, MemorySettings,
    ProviderConfig, ProviderKind, QualitySettings, RoutingConfig,
};
pub use pricing::PricingConfig;
pub use retry::{RetryOrchestrator, RetryOutcome, RetryPolicy};
