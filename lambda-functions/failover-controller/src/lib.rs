use aws_config::{BehaviorVersion, Region, SdkConfig};
use dr_routing::{
    read_routing_pair, ConfigError, ControllerResponse, ControllerStatus, Notification, Notifier,
    Route53Router, RoutingConfig, RoutingError, RoutingPair, RoutingState, SnsNotifier,
    TargetWeights, TrafficRouter, Transition,
};
use lambda_runtime::Error;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

pub const FAILOVER_COMMENT: &str = "Failing over to DR region";

/// SNS delivery of the alarm that triggered the failover.
#[derive(Deserialize, Debug, Clone)]
pub struct SnsEvent {
    #[serde(rename = "Records")]
    pub records: Vec<SnsRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SnsRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsMessage,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SnsMessage {
    #[serde(rename = "Subject")]
    pub subject: Option<String>,
    #[serde(rename = "Message")]
    pub message: String,
}

/// The alert is only logged. Whether to fail over is the alarm's call.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum AlertPayload {
    Sns(SnsEvent),
    Other(Value),
}

impl AlertPayload {
    pub fn summary(&self) -> String {
        match self {
            Self::Sns(event) => match event.records.first() {
                Some(record) => match &record.sns.subject {
                    Some(subject) => format!("{}: {}", subject, record.sns.message),
                    None => record.sns.message.clone(),
                },
                None => "SNS event without records".to_string(),
            },
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Failover transition table: only a primary-active zone moves.
pub fn failover_transition(
    pair: &RoutingPair,
    active_weight: u32,
) -> Result<Transition, RoutingError> {
    match pair.state() {
        RoutingState::PrimaryActive => Ok(Transition::Shift(TargetWeights::dr_active(
            active_weight,
        ))),
        RoutingState::DrActive => Ok(Transition::Stay),
        RoutingState::Inconsistent => Err(pair.inconsistent()),
    }
}

pub struct FailoverService<R, N> {
    router: R,
    notifier: N,
    config: RoutingConfig,
}

impl FailoverService<Route53Router, SnsNotifier> {
    pub async fn from_env() -> Result<Self, Error> {
        let config = RoutingConfig::from_env()?;
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Ok(Self::from_sdk_config(&sdk_config, config))
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, config: RoutingConfig) -> Self {
        // Notify from the DR region; the primary may be the one that is down.
        let dr_sdk_config = sdk_config
            .to_builder()
            .region(Region::new(config.dr_region.clone()))
            .build();

        Self::new(
            Route53Router::from_sdk_config(sdk_config, &config.hosted_zone_id),
            SnsNotifier::from_sdk_config(&dr_sdk_config, &config.topic_arn),
            config,
        )
    }
}

/// Handles one alert with configuration read at invocation start. A bad
/// environment is reported as an `error` result like any other failure.
pub async fn handle_invocation<R, N, F>(
    config: Result<RoutingConfig, ConfigError>,
    build: F,
    alert: &AlertPayload,
) -> ControllerResponse
where
    R: TrafficRouter,
    N: Notifier,
    F: FnOnce(RoutingConfig) -> FailoverService<R, N>,
{
    match config {
        Ok(config) => build(config).handle_alert(alert).await,
        Err(e) => {
            error!("Failover configuration is invalid: {}", e);
            ControllerResponse::error(&e)
        }
    }
}

impl<R, N> FailoverService<R, N>
where
    R: TrafficRouter,
    N: Notifier,
{
    pub fn new(router: R, notifier: N, config: RoutingConfig) -> Self {
        Self {
            router,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub async fn execute_failover(
        &self,
        alert: &AlertPayload,
    ) -> Result<ControllerResponse, RoutingError> {
        info!("Received alert: {}", alert.summary());

        let hostname = self.config.hostname();
        let pair = read_routing_pair(&self.router, &hostname, &self.config.record_type).await?;

        info!(
            "Routing for {} is {} (primary {}={}, dr {}={})",
            hostname,
            pair.state(),
            pair.primary.set_identifier,
            pair.primary.weight,
            pair.dr.set_identifier,
            pair.dr.weight
        );

        let weights = match failover_transition(&pair, self.config.active_weight)? {
            Transition::Stay => {
                info!("Primary region is already inactive, no failover needed");
                return Ok(ControllerResponse::new(ControllerStatus::NoFailoverNeeded)
                    .with_message("No failover needed, primary region is already inactive"));
            }
            Transition::Shift(weights) => weights,
        };

        info!(
            "Primary region {} is active, failing over to {}",
            self.config.primary_region, self.config.dr_region
        );

        let batch = pair.reweigh(weights, FAILOVER_COMMENT);
        let change_id = self.router.apply_weight_change(&hostname, &batch).await?;

        let notification = Notification::failover(
            &self.config.primary_region,
            &self.config.dr_region,
            &change_id,
        );
        if let Err(e) = self.notifier.publish(&notification).await {
            warn!("Failover {} committed but notification failed: {}", change_id, e);
        }

        Ok(ControllerResponse::new(ControllerStatus::FailoverInitiated)
            .with_change_id(change_id)
            .with_message(format!(
                "Traffic redirected from {} to {}",
                self.config.primary_region, self.config.dr_region
            )))
    }

    /// Runs one invocation; every failure becomes an `error` status.
    pub async fn handle_alert(&self, alert: &AlertPayload) -> ControllerResponse {
        match self.execute_failover(alert).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error during failover: {}", e);
                ControllerResponse::error(&e)
            }
        }
    }
}
