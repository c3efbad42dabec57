use aws_config::{BehaviorVersion, SdkConfig};
use dr_routing::{ControllerResponse, RoutingConfig};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use recovery_check::{handle_invocation, RecoveryService};
use serde_json::Value;

// The scheduled event carries nothing the check needs.
async fn function_handler(
    sdk_config: &SdkConfig,
    http_client: &reqwest::Client,
    _event: LambdaEvent<Value>,
) -> Result<ControllerResponse, Error> {
    Ok(handle_invocation(RoutingConfig::from_env(), |config| {
        RecoveryService::from_sdk_config(sdk_config, http_client.clone(), config)
    })
    .await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let http_client = reqwest::Client::builder().build()?;
    let (sdk_config, http_client) = (&sdk_config, &http_client);

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(sdk_config, http_client, event).await
    }))
    .await
}
