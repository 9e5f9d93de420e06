//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Sender of a message in a call.
///
/// # Examples
///
/// ```
/// use gatehouse_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System messages provide context and instructions
    System,
    /// User messages carry the caller's prompt
    User,
    /// Assistant messages are prior model turns
    Assistant,
}

impl Role {
    /// Wire name used by chat-style provider APIs.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}
