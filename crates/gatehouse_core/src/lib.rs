//! Core data types for the Gatehouse inference gateway.
//!
//! This crate provides the request, response and audit shapes shared by every
//! Gatehouse crate. When the gateway is exposed remotely these types double as
//! the wire schema, so all of them serialize with `serde`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod call_kind;
mod message;
mod request;
mod response;
mod role;
mod token_counting;

pub use audit::{AuditRecord, QualityDetection, QualityOutcome};
pub use call_kind::CallKind;
pub use message::Message;
pub use request::{
    CallRequest, CallRequestBuilder, CallRequestBuilderError, MAX_PRIORITY, MAX_TIMEOUT_SECONDS,
    MAX_TOKENS_LIMIT,
};
pub use response::CallResponse;
pub use role::Role;
pub use token_counting::{TokenUsage, estimate_tokens};
