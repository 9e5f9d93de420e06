use gatehouse_core::{CallKind, CallRequest, CallRequestBuilder, Message, Role};
use gatehouse_error::{CallErrorKind, GatewayErrorKind};

fn base() -> CallRequestBuilder {
    let mut builder = CallRequest::builder();
    builder
        .call_kind(CallKind::DeepAnalysis)
        .messages(vec![Message::user("Explain the drawdown")])
        .caller_module("research")
        .caller_function("explain");
    builder
}

#[test]
fn builder_fills_defaults() -> anyhow::Result<()> {
    let request = base().build()?;

    assert!(!request.id().is_empty());
    assert_eq!(request.provider(), "auto");
    assert_eq!(*request.max_tokens(), 1000);
    assert_eq!(*request.priority(), 5);
    assert!(*request.enable_quality_gate());
    assert!(!*request.use_memory());
    assert!(request.is_auto_routed());
    request.validate()?;
    Ok(())
}

#[test]
fn generated_ids_are_unique() -> anyhow::Result<()> {
    let a = base().build()?;
    let b = base().build()?;
    assert_ne!(a.id(), b.id());
    Ok(())
}

#[test]
fn missing_provenance_fails_to_build() {
    let result = CallRequest::builder()
        .messages(vec![Message::user("hi")])
        .build();
    assert!(result.is_err());
}

#[test]
fn validate_rejects_out_of_bounds_fields() -> anyhow::Result<()> {
    let cases = vec![
        base().messages(Vec::<Message>::new()).build()?,
        base().messages(vec![Message::user("   ")]).build()?,
        base().max_tokens(0u32).build()?,
        base().max_tokens(8001u32).build()?,
        base().temperature(2.5f32).build()?,
        base().temperature(-0.1f32).build()?,
        base().timeout_seconds(0.0).build()?,
        base().timeout_seconds(301.0).build()?,
        base().max_cost_ceiling(0.0).build()?,
        base().priority(11u8).build()?,
        base().caller_module("").build()?,
        base().caller_function("  ").build()?,
        base().provider("").build()?,
    ];

    for request in cases {
        let err = request.validate().expect_err("request should be invalid");
        assert!(matches!(err.kind(), GatewayErrorKind::Validation(_)));
        assert_eq!(err.call_error_kind(), CallErrorKind::Validation);
    }
    Ok(())
}

#[test]
fn validate_accepts_inclusive_upper_bounds() -> anyhow::Result<()> {
    let request = base()
        .max_tokens(8000u32)
        .temperature(2.0f32)
        .timeout_seconds(300.0)
        .priority(10u8)
        .build()?;
    request.validate()?;
    Ok(())
}

#[test]
fn render_prompt_puts_system_first() -> anyhow::Result<()> {
    let request = base()
        .system_prompt("Be terse.")
        .messages(vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ])
        .build()?;

    let prompt = request.render_prompt();
    assert!(prompt.starts_with("system: Be terse."));
    assert!(prompt.ends_with("user: second"));
    assert_eq!(request.last_user_content(), Some("second"));
    Ok(())
}

#[test]
fn request_deserializes_with_defaults() -> anyhow::Result<()> {
    let request: CallRequest = serde_json::from_value(serde_json::json!({
        "messages": [{"role": "user", "content": "scan for anomalies"}],
        "call_kind": "discovery",
        "caller_module": "scanner",
        "caller_function": "tick"
    }))?;

    assert_eq!(*request.call_kind(), CallKind::Discovery);
    assert_eq!(request.messages()[0].role, Role::User);
    assert!(!request.id().is_empty());
    request.validate()?;
    Ok(())
}
