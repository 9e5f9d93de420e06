//! Single-call command handler.

use super::CallArgs;
use gatehouse::{CallRequest, CallResponse, GatehouseConfig, Gateway, Message};
use tracing::{info, instrument};

/// Build a gateway from `config` and run one call described by `args`.
///
/// Gateway failures are returned inside the response; only setup problems
/// (bad configuration, malformed arguments) are errors here.
#[instrument(skip_all, fields(provider = %args.provider, call_kind = %args.call_kind))]
pub async fn run_call(
    config: &GatehouseConfig,
    args: CallArgs,
) -> Result<CallResponse, Box<dyn std::error::Error>> {
    let gateway = Gateway::from_config(config)?;

    let mut builder = CallRequest::builder();
    builder
        .messages(vec![Message::user(args.prompt)])
        .provider(args.provider)
        .call_kind(args.call_kind)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .timeout_seconds(args.timeout)
        .max_cost_ceiling(args.max_cost)
        .enable_quality_gate(!args.no_quality_gate)
        .caller_module("gatehouse_cli")
        .caller_function("call");
    if let Some(system) = args.system {
        builder.system_prompt(system);
    }
    if let Some(model) = args.model {
        builder.model(model);
    }
    let request = builder.build()?;

    info!(call_id = %request.id(), "Dispatching call");
    Ok(gateway.call(request).await)
}
