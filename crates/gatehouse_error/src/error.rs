//! Top-level error wrapper types.

use crate::{BackendError, CollaboratorError, ConfigError, GatewayError};

/// Every error the workspace can surface through its public APIs.
///
/// # Examples
///
/// ```
/// use gatehouse_error::{ConfigError, GatehouseError};
///
/// let err: GatehouseError = ConfigError::new("missing provider").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GatehouseErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Dispatch pipeline error
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Backend adapter error
    #[from(BackendError)]
    Backend(BackendError),
    /// External collaborator error
    #[from(CollaboratorError)]
    Collaborator(CollaboratorError),
}

/// Gatehouse error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Gatehouse Error: {}", _0)]
pub struct GatehouseError(Box<GatehouseErrorKind>);

impl GatehouseError {
    /// Create a new error from a kind.
    pub fn new(kind: GatehouseErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GatehouseErrorKind {
        &self.0
    }
}

impl<T> From<T> for GatehouseError
where
    T: Into<GatehouseErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Gatehouse operations.
pub type GatehouseResult<T> = std::result::Result<T, GatehouseError>;
