//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use gatehouse::CallKind;
use std::path::PathBuf;

/// Gatehouse - metered, quality-checked gateway for LLM inference calls
#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(about = "Metered, quality-checked gateway for LLM inference calls", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Read configuration from this file instead of the layered defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one call through the gateway and print the response as JSON
    Call(CallArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for a single gateway call
#[derive(Args, Debug)]
pub struct CallArgs {
    /// User prompt
    #[arg(long)]
    pub prompt: String,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Provider name, or "auto" to route by call kind
    #[arg(long, default_value = "auto")]
    pub provider: String,

    /// Model to request instead of the provider default
    #[arg(long)]
    pub model: Option<String>,

    /// Business category (fast_decision, deep_analysis, discovery, general)
    #[arg(long, default_value = "general")]
    pub call_kind: CallKind,

    /// Maximum tokens to generate
    #[arg(long, default_value_t = 1000)]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Per-attempt timeout in seconds
    #[arg(long, default_value_t = 60.0)]
    pub timeout: f64,

    /// Largest acceptable estimated cost in USD
    #[arg(long, default_value_t = 1.0)]
    pub max_cost: f64,

    /// Skip the quality gate
    #[arg(long)]
    pub no_quality_gate: bool,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,
}
