use aws_config::{BehaviorVersion, SdkConfig};
use dr_routing::{ControllerResponse, RoutingConfig};
use failover_controller::{handle_invocation, AlertPayload, FailoverService};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

async fn function_handler(
    sdk_config: &SdkConfig,
    event: LambdaEvent<AlertPayload>,
) -> Result<ControllerResponse, Error> {
    Ok(handle_invocation(
        RoutingConfig::from_env(),
        |config| FailoverService::from_sdk_config(sdk_config, config),
        &event.payload,
    )
    .await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let sdk_config = &sdk_config;

    run(service_fn(move |event: LambdaEvent<AlertPayload>| async move {
        function_handler(sdk_config, event).await
    }))
    .await
}
