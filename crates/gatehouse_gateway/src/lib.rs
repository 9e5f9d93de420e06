//! Call dispatch pipeline for the Gatehouse inference gateway.
//!
//! [`Gateway::call`] takes one [`CallRequest`](gatehouse_core::CallRequest) through
//! every stage in order:
//!
//! 1. validation
//! 2. admission (bounded concurrency)
//! 3. cost estimate and budget reservation
//! 4. optional memory enrichment, degrading on failure
//! 5. dispatch through the [`ProviderRouter`] under retry and per-attempt deadlines
//! 6. optional quality gating
//! 7. optional memory write-back
//! 8. budget settlement
//! 9. stats and audit
//!
//! Every failure comes back as a [`CallResponse`](gatehouse_core::CallResponse)
//! with an error label; nothing here panics on the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod gateway;
mod quality;
mod router;
mod stats;

pub use audit::{AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use gateway::{Gateway, GatewayBuilder, GatewayBuilderError};
pub use quality::QualityPolicy;
pub use router::{DispatchState, ProviderRouter, RoutedReply};
pub use stats::{CallStats, StatsSnapshot};
