//! Business categories of inference calls.

use serde::{Deserialize, Serialize};

/// Business category of a call, used for routing and audit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallKind {
    /// Latency-sensitive reactive decision
    FastDecision,
    /// Slow, thorough analysis
    DeepAnalysis,
    /// Background discovery scanning
    Discovery,
    /// Anything else
    #[default]
    General,
}
