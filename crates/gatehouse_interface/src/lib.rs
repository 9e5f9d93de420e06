//! Trait interfaces for the Gatehouse inference gateway.
//!
//! The gateway talks to four kinds of collaborator, each behind a trait:
//!
//! - [`InferenceBackend`] executes one concrete model call
//! - [`MemoryStore`] supplies enrichment context and accepts exchange summaries
//! - [`QualityGate`] scores generated content
//! - [`AuditSink`] persists audit records
//!
//! Backends report failures as a tagged [`BackendError`](gatehouse_error::BackendError)
//! so the router can decide between retrying and falling back without
//! inspecting error messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{AuditSink, InferenceBackend, MemoryStore, MemoryStream, QualityGate};
pub use types::{BackendReply, Capability, ExchangeSummary, MemoryItem, QualityVerdict};
