use aws_config::{BehaviorVersion, SdkConfig};
use dr_routing::{
    read_routing_pair, ConfigError, ControllerResponse, ControllerStatus, HealthProber, HttpHealthProber,
    Notification, Notifier, Route53Router, RoutingConfig, RoutingError, RoutingPair,
    RoutingState, SnsNotifier, TargetWeights, TrafficRouter, Transition,
};
use lambda_runtime::Error;
use tracing::{error, info, warn};

pub const FAILBACK_COMMENT: &str = "Restoring traffic to primary region";

/// Failback transition table: only a dr-active zone moves.
pub fn failback_transition(
    pair: &RoutingPair,
    active_weight: u32,
) -> Result<Transition, RoutingError> {
    match pair.state() {
        RoutingState::DrActive => Ok(Transition::Shift(TargetWeights::primary_active(
            active_weight,
        ))),
        RoutingState::PrimaryActive => Ok(Transition::Stay),
        RoutingState::Inconsistent => Err(pair.inconsistent()),
    }
}

pub struct RecoveryService<R, P, N> {
    router: R,
    prober: P,
    notifier: N,
    config: RoutingConfig,
}

impl RecoveryService<Route53Router, HttpHealthProber, SnsNotifier> {
    pub async fn from_env() -> Result<Self, Error> {
        let config = RoutingConfig::from_env()?;
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self::from_sdk_config(&sdk_config, http_client, config))
    }

    /// The probe timeout is applied per request, so one HTTP client serves any config.
    pub fn from_sdk_config(
        sdk_config: &SdkConfig,
        http_client: reqwest::Client,
        config: RoutingConfig,
    ) -> Self {
        Self::new(
            Route53Router::from_sdk_config(sdk_config, &config.hosted_zone_id),
            HttpHealthProber::new(http_client),
            SnsNotifier::from_sdk_config(sdk_config, &config.topic_arn),
            config,
        )
    }
}

/// Runs one scheduled check with configuration read at invocation start.
pub async fn handle_invocation<R, P, N, F>(
    config: Result<RoutingConfig, ConfigError>,
    build: F,
) -> ControllerResponse
where
    R: TrafficRouter,
    P: HealthProber,
    N: Notifier,
    F: FnOnce(RoutingConfig) -> RecoveryService<R, P, N>,
{
    match config {
        Ok(config) => build(config).handle_schedule().await,
        Err(e) => {
            error!("Recovery configuration is invalid: {}", e);
            ControllerResponse::error(&e)
        }
    }
}

impl<R, P, N> RecoveryService<R, P, N>
where
    R: TrafficRouter,
    P: HealthProber,
    N: Notifier,
{
    pub fn new(router: R, prober: P, notifier: N, config: RoutingConfig) -> Self {
        Self {
            router,
            prober,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub async fn run_recovery_check(&self) -> Result<ControllerResponse, RoutingError> {
        let url = self.config.health_check_url();

        // Staying in DR while the primary is down is the expected steady state.
        if !self.prober.probe(&url, self.config.probe_timeout).await {
            info!("Primary region is still unhealthy, maintaining failover to DR region");
            return Ok(ControllerResponse::new(ControllerStatus::PrimaryUnhealthy));
        }

        let hostname = self.config.hostname();
        let pair = read_routing_pair(&self.router, &hostname, &self.config.record_type).await?;

        info!(
            "Primary healthy at {}; routing for {} is {} (primary {}={}, dr {}={})",
            url,
            hostname,
            pair.state(),
            pair.primary.set_identifier,
            pair.primary.weight,
            pair.dr.set_identifier,
            pair.dr.weight
        );

        let weights = match failback_transition(&pair, self.config.active_weight)? {
            Transition::Stay => {
                return Ok(ControllerResponse::new(ControllerStatus::NormalOperation))
            }
            Transition::Shift(weights) => weights,
        };

        info!(
            "Primary region {} is healthy, failing back from {}",
            self.config.primary_region, self.config.dr_region
        );

        let batch = pair.reweigh(weights, FAILBACK_COMMENT);
        let change_id = self.router.apply_weight_change(&hostname, &batch).await?;

        let notification = Notification::failback(
            &self.config.primary_region,
            &self.config.dr_region,
            &change_id,
        );
        if let Err(e) = self.notifier.publish(&notification).await {
            warn!("Failback {} committed but notification failed: {}", change_id, e);
        }

        Ok(ControllerResponse::new(ControllerStatus::FailbackInitiated).with_change_id(change_id))
    }

    pub async fn handle_schedule(&self) -> ControllerResponse {
        match self.run_recovery_check().await {
            Ok(response) => response,
            Err(e) => {
                error!("Error in recovery check: {}", e);
                ControllerResponse::error(&e)
            }
        }
    }
}
