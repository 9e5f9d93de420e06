//! Gatehouse: the single entry point for LLM inference calls.
//!
//! Every inference call from every subsystem passes through one [`Gateway`],
//! which bounds concurrency, enforces daily and monthly spend quotas, retries
//! transient backend failures with exponential backoff, falls back once to a
//! generic backend on unrecoverable failures, gates content quality, and
//! records stats and an audit trail for each call.
//!
//! # Quick Start
//!
//! ```no_run
//! use gatehouse::{CallRequest, GatehouseConfig, Gateway, Message};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::from_config(&GatehouseConfig::load()?)?;
//!
//! let request = CallRequest::builder()
//!     .messages(vec![Message::user("Is the basis trade still open?")])
//!     .caller_module("desk")
//!     .caller_function("check_basis")
//!     .build()?;
//!
//! let response = gateway.call(request).await;
//! if *response.success() {
//!     println!("{}", response.content());
//! } else {
//!     eprintln!("{:?}: {:?}", response.error_kind(), response.error_message());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - export spans and backend metrics through OpenTelemetry
//!
//! # Architecture
//!
//! - `gatehouse_error` - error types and caller-visible error labels
//! - `gatehouse_core` - requests, responses, audit records
//! - `gatehouse_interface` - backend and collaborator traits
//! - `gatehouse_rate_limit` - configuration, budget, admission, retry
//! - `gatehouse_models` - HTTP backend adapters
//! - `gatehouse_gateway` - router and call pipeline
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use gatehouse_core::*;
pub use gatehouse_error::*;
pub use gatehouse_gateway::*;
pub use gatehouse_interface::*;
pub use gatehouse_models::*;
pub use gatehouse_rate_limit::*;

mod observability;

pub use observability::{
    LogFormat, ObservabilityConfig, init_observability, init_observability_with_config,
    shutdown_observability,
};
