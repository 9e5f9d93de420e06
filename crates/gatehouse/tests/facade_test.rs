//! Building a gateway from configuration through the facade re-exports.

use gatehouse::{
    CallErrorKind, CallRequest, Capability, GatehouseConfig, Gateway, LogFormat, Message,
    ObservabilityConfig,
};
use std::io::Write;

fn closed_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn write_config(port: u16) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(
        file,
        r#"
[gateway]
max_concurrent_calls = 4
max_retries = 1
base_delay_seconds = 0.01
max_delay_seconds = 0.01

[budget]
daily_budget = 5.0
monthly_budget = 50.0

[routing]
default_provider = "local"

[providers.local]
kind = "local"
base_url = "http://127.0.0.1:{port}"
default_model = "llama3.1:8b"

[providers.archived]
kind = "local"
default_model = "old-model"
enabled = false
"#
    )?;
    Ok(file)
}

#[test]
fn gateway_is_built_from_config_file() -> anyhow::Result<()> {
    let file = write_config(closed_port()?)?;
    let config = GatehouseConfig::from_file(file.path())?;

    let gateway = Gateway::from_config(&config)?;

    assert!(gateway.router().contains("local"));
    assert!(!gateway.router().contains("archived"));
    assert_eq!(gateway.router().capability("local"), Some(Capability::Local));
    assert_eq!(gateway.admission().capacity(), 4);
    assert_eq!(gateway.budget().snapshot().daily_limit, 5.0);
    assert_eq!(gateway.stats().total(), 0);
    Ok(())
}

#[test]
fn invalid_config_is_rejected_before_building() -> anyhow::Result<()> {
    let mut config = GatehouseConfig::from_toml_str(gatehouse::DEFAULT_CONFIG)?;
    config.gateway.max_concurrent_calls = 0;
    assert!(Gateway::from_config(&config).is_err());
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_fails_after_retries() -> anyhow::Result<()> {
    let file = write_config(closed_port()?)?;
    let gateway = Gateway::from_config(&GatehouseConfig::from_file(file.path())?)?;

    let request = CallRequest::builder()
        .messages(vec![Message::user("ping")])
        .caller_module("facade_test")
        .caller_function("unreachable")
        .build()?;
    let response = gateway.call(request).await;

    assert!(!response.success());
    assert!(response.content().is_empty());
    assert_eq!(*response.error_kind(), Some(CallErrorKind::MaxRetriesExceeded));
    assert_eq!(response.audit_record().attempts, 2);
    assert_eq!(response.provider_used(), &None);
    assert_eq!(gateway.budget().daily_spent(), 0.0);
    assert_eq!(gateway.stats().failure(), 1);
    assert_eq!(gateway.stats().retries(), 1);
    Ok(())
}

#[test]
fn observability_config_builder() {
    let config = ObservabilityConfig::new("gatehouse-test")
        .with_version("9.9.9")
        .with_filter("gatehouse_gateway=debug")
        .with_format(LogFormat::Json);

    assert_eq!(config.service_name, "gatehouse-test");
    assert_eq!(config.service_version, "9.9.9");
    assert_eq!(config.filter, "gatehouse_gateway=debug");
    assert_eq!(config.format, LogFormat::Json);
}

#[test]
fn cli_flags_map_to_observability() {
    let quiet = ObservabilityConfig::from_flags(false, false);
    assert_eq!(quiet.filter, "info");
    assert_eq!(quiet.format, LogFormat::Plain);

    let verbose = ObservabilityConfig::from_flags(true, true);
    assert!(verbose.filter.starts_with("info,"));
    assert!(verbose.filter.contains("gatehouse_gateway=debug"));
    assert!(!verbose.filter.contains(' '));
    assert_eq!(verbose.format, LogFormat::Json);
}
