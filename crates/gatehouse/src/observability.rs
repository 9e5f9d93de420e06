//! Logging and telemetry setup.
//!
//! Logs always go through `tracing-subscriber`. With the `observability`
//! feature, spans are also bridged to OpenTelemetry and both spans and the
//! backend metrics recorded by `LlmMetrics` are exported to stdout.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "observability")]
use opentelemetry::{KeyValue, global, trace::TracerProvider};
#[cfg(feature = "observability")]
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
#[cfg(feature = "observability")]
use std::sync::OnceLock;

#[cfg(feature = "observability")]
static PROVIDERS: OnceLock<(SdkTracerProvider, SdkMeterProvider)> = OnceLock::new();

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Plain,
    /// One JSON object per event
    Json,
}

/// Logging and telemetry settings for a gatehouse process.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Reported as `service.name` on exported telemetry
    pub service_name: String,
    /// Reported as `service.version`
    pub service_version: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl ObservabilityConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            filter: "info".to_string(),
            format: LogFormat::Plain,
        }
    }

    /// Settings for the CLI: `verbose` turns on debug output for the
    /// gatehouse crates only, leaving HTTP and runtime crates at info.
    pub fn from_flags(verbose: bool, json: bool) -> Self {
        let config = Self::new("gatehouse").with_format(if json {
            LogFormat::Json
        } else {
            LogFormat::Plain
        });
        if verbose {
            config.with_filter(
                "info,gatehouse=debug,gatehouse_gateway=debug,\
                 gatehouse_rate_limit=debug,gatehouse_models=debug",
            )
        } else {
            config
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new("gatehouse")
    }
}

/// Initialize with [`ObservabilityConfig::default`].
pub fn init_observability() -> Result<(), Box<dyn std::error::Error>> {
    init_observability_with_config(ObservabilityConfig::default())
}

/// Install the global subscriber, plus OpenTelemetry providers when the
/// `observability` feature is on.
///
/// `RUST_LOG` takes precedence over `config.filter`.
///
/// # Errors
///
/// Fails when the filter does not parse or a global subscriber is already set.
pub fn init_observability_with_config(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed(),
        LogFormat::Plain => tracing_subscriber::fmt::layer().with_target(true).boxed(),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    #[cfg(feature = "observability")]
    {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attribute(KeyValue::new(
                "service.version",
                config.service_version.clone(),
            ))
            .build();

        let tracer_provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_resource(resource.clone())
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(opentelemetry_stdout::MetricExporter::default())
            .with_resource(resource)
            .build();

        let tracer = tracer_provider.tracer(config.service_name.clone());
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()?;

        global::set_tracer_provider(tracer_provider.clone());
        global::set_meter_provider(meter_provider.clone());
        let _ = PROVIDERS.set((tracer_provider, meter_provider));
    }

    #[cfg(not(feature = "observability"))]
    registry.try_init()?;

    tracing::debug!(
        service = %config.service_name,
        version = %config.service_version,
        format = ?config.format,
        "Observability initialized"
    );
    Ok(())
}

/// Flush and stop telemetry exporters. Logging keeps working.
pub fn shutdown_observability() {
    #[cfg(feature = "observability")]
    if let Some((tracer_provider, meter_provider)) = PROVIDERS.get() {
        if let Err(e) = meter_provider.shutdown() {
            tracing::warn!(error = %e, "Failed to shut down meter provider");
        }
        if let Err(e) = tracer_provider.shutdown() {
            tracing::warn!(error = %e, "Failed to shut down tracer provider");
        }
    }
}
