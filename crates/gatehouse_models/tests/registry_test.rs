use gatehouse_interface::Capability;
use gatehouse_models::{build_backend, build_backends};
use gatehouse_rate_limit::{DEFAULT_CONFIG, GatehouseConfig, PricingConfig, ProviderConfig, ProviderKind};

#[test]
fn bundled_providers_build() -> anyhow::Result<()> {
    let config = GatehouseConfig::from_toml_str(DEFAULT_CONFIG)?;
    let backends = build_backends(&config)?;

    assert_eq!(backends.len(), config.providers.len());
    let local = &backends["local"];
    assert_eq!(local.provider_name(), "local");
    assert_eq!(local.capability(), Capability::Local);
    assert!(local.is_available());
    Ok(())
}

#[test]
fn disabled_providers_are_skipped() -> anyhow::Result<()> {
    let mut config = GatehouseConfig::from_toml_str(DEFAULT_CONFIG)?;
    if let Some(provider) = config.providers.get_mut("anthropic") {
        provider.enabled = false;
    }
    let backends = build_backends(&config)?;
    assert!(!backends.contains_key("anthropic"));
    Ok(())
}

#[test]
fn openai_compatible_requires_base_url() {
    let config = ProviderConfig {
        kind: ProviderKind::OpenaiCompatible,
        base_url: None,
        api_key_env: None,
        default_model: "m".to_string(),
        pricing: PricingConfig::default(),
        enabled: true,
    };
    assert!(build_backend("generic", &config).is_err());
}

#[test]
fn missing_key_variable_marks_backend_unavailable() -> anyhow::Result<()> {
    let config = ProviderConfig {
        kind: ProviderKind::OpenaiCompatible,
        base_url: Some("http://localhost:9".to_string()),
        api_key_env: Some("GATEHOUSE_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
        default_model: "m".to_string(),
        pricing: PricingConfig::default(),
        enabled: true,
    };
    let backend = build_backend("generic", &config)?;
    assert!(!backend.is_available());
    assert_eq!(backend.default_model(), "m");
    Ok(())
}
