//! Inference backend adapters for Gatehouse.
//!
//! # Available Backends
//!
//! - [`OllamaBackend`]: local models through an Ollama server
//! - [`AnthropicBackend`]: the Anthropic Messages API
//! - [`OpenAiCompatibleBackend`]: any OpenAI-compatible chat completions endpoint
//!
//! Every adapter implements [`InferenceBackend`](gatehouse_interface::InferenceBackend),
//! classifies failures with a [`BackendFailure`](gatehouse_error::BackendFailure) tag,
//! prices replies with the provider's [`PricingConfig`](gatehouse_rate_limit::PricingConfig),
//! and records [`LlmMetrics`].
//!
//! # Example
//!
//! ```no_run
//! use gatehouse_interface::InferenceBackend;
//! use gatehouse_models::OllamaBackend;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = OllamaBackend::new("local", "http://localhost:11434", "llama3.1:8b");
//! let reply = backend.invoke("Hello", 64, 0.2, None).await?;
//! println!("{}", reply.content());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod http;
mod metrics;
mod ollama;
mod openai_compat;
mod registry;

pub use anthropic::{AnthropicBackend, DEFAULT_ANTHROPIC_URL};
pub use metrics::LlmMetrics;
pub use ollama::{DEFAULT_OLLAMA_URL, OllamaBackend};
pub use openai_compat::OpenAiCompatibleBackend;
pub use registry::{build_backend, build_backends};
