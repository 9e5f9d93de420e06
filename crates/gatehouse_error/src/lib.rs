//! Error types for the Gatehouse inference gateway.
//!
//! This crate provides the foundation error types used throughout the Gatehouse workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! Callers of the gateway never see these types directly: every response carries a
//! serializable [`CallErrorKind`] label instead.
//!
//! # Examples
//!
//! ```
//! use gatehouse_error::{ConfigError, GatehouseResult};
//!
//! fn load() -> GatehouseResult<()> {
//!     Err(ConfigError::new("daily_budget must be positive"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod call_kind;
mod collaborator;
mod config;
mod error;
mod gateway;

pub use backend::{BackendError, BackendFailure};
pub use call_kind::CallErrorKind;
pub use collaborator::{Collaborator, CollaboratorError};
pub use config::ConfigError;
pub use error::{GatehouseError, GatehouseErrorKind, GatehouseResult};
pub use gateway::{GatewayError, GatewayErrorKind, GatewayResult};
