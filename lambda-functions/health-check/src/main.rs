use health_check::{ApiResponse, HealthCheckService, HealthSettings};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn function_handler(
    service: &HealthCheckService,
    _event: LambdaEvent<Value>,
) -> Result<ApiResponse, Error> {
    service.run_health_check().await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let service = HealthCheckService::new(HealthSettings::from_env()).await;
    let service = &service;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(service, event).await
    }))
    .await
}
