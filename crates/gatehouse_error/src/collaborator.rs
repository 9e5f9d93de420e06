//! Errors raised by external collaborators (memory store, quality gate, audit sink).

/// Which collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Collaborator {
    /// Prompt enrichment store
    #[display("memory")]
    Memory,
    /// Content evaluator
    #[display("quality")]
    Quality,
    /// Persistence for audit records
    #[display("audit")]
    Audit,
}

/// Collaborator error with location tracking.
///
/// The gateway never fails a call because of one of these; they are logged
/// and the pipeline degrades.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("{} collaborator error: {} at line {} in {}", collaborator, message, line, file)]
pub struct CollaboratorError {
    /// Failing collaborator
    pub collaborator: Collaborator,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl CollaboratorError {
    /// Create a new collaborator error at the current location.
    #[track_caller]
    pub fn new(collaborator: Collaborator, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            collaborator,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
