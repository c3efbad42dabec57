use std::collections::BTreeMap;

use anyhow::Context as _;
use aws_sdk_cloudwatch::{
    types::{MetricDatum, StandardUnit},
    Client as CloudWatchClient,
};
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

pub const METRIC_NAMESPACE: &str = "ImageApi/DisasterRecovery";
pub const HEALTH_METRIC: &str = "ApiHealth";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ServiceStatus {
    pub dynamodb: bool,
    pub s3: bool,
}

impl ServiceStatus {
    pub fn overall(&self) -> HealthStatus {
        if self.dynamodb && self.s3 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}

/// Payload the recovery prober parses.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HealthBody {
    pub status: HealthStatus,
    pub region: String,
    pub timestamp: String,
    pub services: ServiceStatus,
}

/// API Gateway proxy integration response.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Result<Self, serde_json::Error> {
        let mut headers = cors_headers();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(Self {
            status_code,
            headers,
            body: serde_json::to_string(body)?,
        })
    }
}

pub fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type".to_string(),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            "OPTIONS,GET".to_string(),
        ),
    ])
}

/// 200 with a `healthy` body, otherwise 503 so status-only checks fail too.
pub fn health_response(
    region: &str,
    services: ServiceStatus,
    timestamp: String,
) -> Result<ApiResponse, serde_json::Error> {
    let status = services.overall();
    let status_code = match status {
        HealthStatus::Healthy => 200,
        HealthStatus::Unhealthy => 503,
    };

    ApiResponse::json(
        status_code,
        &HealthBody {
            status,
            region: region.to_string(),
            timestamp,
            services,
        },
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthSettings {
    pub region: String,
    pub items_table: String,
    pub images_bucket: String,
}

impl HealthSettings {
    pub fn from_env() -> Self {
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let items_table =
            std::env::var("ITEMS_TABLE").unwrap_or_else(|_| "images-items".to_string());
        let images_bucket = std::env::var("IMAGES_BUCKET")
            .unwrap_or_else(|_| format!("images-bucket-{}", region));

        Self {
            region,
            items_table,
            images_bucket,
        }
    }
}

pub struct HealthCheckService {
    dynamo_client: DynamoClient,
    s3_client: S3Client,
    cloudwatch_client: CloudWatchClient,
    settings: HealthSettings,
}

impl HealthCheckService {
    pub async fn new(settings: HealthSettings) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        Self {
            dynamo_client: DynamoClient::new(&config),
            s3_client: S3Client::new(&config),
            cloudwatch_client: CloudWatchClient::new(&config),
            settings,
        }
    }

    pub async fn check_dynamodb_health(&self) -> anyhow::Result<()> {
        self.dynamo_client
            .describe_table()
            .table_name(&self.settings.items_table)
            .send()
            .await
            .with_context(|| format!("describe table {}", self.settings.items_table))?;
        Ok(())
    }

    pub async fn check_s3_health(&self) -> anyhow::Result<()> {
        self.s3_client
            .head_bucket()
            .bucket(&self.settings.images_bucket)
            .send()
            .await
            .with_context(|| format!("head bucket {}", self.settings.images_bucket))?;
        Ok(())
    }

    pub async fn publish_metric(
        &self,
        status: &ServiceStatus,
    ) -> Result<(), lambda_runtime::Error> {
        let timestamp =
            aws_sdk_cloudwatch::primitives::DateTime::from(std::time::SystemTime::now());

        let metric = MetricDatum::builder()
            .metric_name(HEALTH_METRIC)
            .value(match status.overall() {
                HealthStatus::Healthy => 1.0,
                HealthStatus::Unhealthy => 0.0,
            })
            .unit(StandardUnit::None)
            .timestamp(timestamp)
            .build();

        self.cloudwatch_client
            .put_metric_data()
            .namespace(METRIC_NAMESPACE)
            .metric_data(metric)
            .send()
            .await?;

        Ok(())
    }

    pub async fn run_health_check(&self) -> Result<ApiResponse, lambda_runtime::Error> {
        let dynamodb = match self.check_dynamodb_health().await {
            Ok(()) => true,
            Err(e) => {
                warn!("DynamoDB check failed: {:#}", e);
                false
            }
        };
        let s3 = match self.check_s3_health().await {
            Ok(()) => true,
            Err(e) => {
                warn!("S3 check failed: {:#}", e);
                false
            }
        };

        let services = ServiceStatus { dynamodb, s3 };

        if let Err(e) = self.publish_metric(&services).await {
            error!("Failed to publish health metric: {}", e);
        }

        info!(
            "Region {} is {:?} (dynamodb={}, s3={})",
            self.settings.region,
            services.overall(),
            services.dynamodb,
            services.s3
        );

        Ok(health_response(
            &self.settings.region,
            services,
            Utc::now().to_rfc3339(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_determination() {
        let healthy = ServiceStatus {
            dynamodb: true,
            s3: true,
        };
        let dynamo_down = ServiceStatus {
            dynamodb: false,
            s3: true,
        };
        let s3_down = ServiceStatus {
            dynamodb: true,
            s3: false,
        };

        assert_eq!(healthy.overall(), HealthStatus::Healthy);
        assert_eq!(dynamo_down.overall(), HealthStatus::Unhealthy);
        assert_eq!(s3_down.overall(), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_healthy_response() {
        let response = health_response(
            "us-east-1",
            ServiceStatus {
                dynamodb: true,
                s3: true,
            },
            "2025-01-01T00:00:00Z".to_string(),
        )
        .unwrap();

        assert_eq!(response.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["region"], "us-east-1");
        assert_eq!(body["timestamp"], "2025-01-01T00:00:00Z");
        assert_eq!(body["services"]["dynamodb"], true);
    }

    #[test]
    fn test_unhealthy_response_is_503() {
        let response = health_response(
            "us-east-1",
            ServiceStatus {
                dynamodb: true,
                s3: false,
            },
            "2025-01-01T00:00:00Z".to_string(),
        )
        .unwrap();

        assert_eq!(response.status_code, 503);
        assert!(response.body.contains("\"status\":\"unhealthy\""));
    }

    #[test]
    fn test_envelope_serialization() {
        let response = ApiResponse::json(200, &serde_json::json!({"status": "healthy"})).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["headers"]["Access-Control-Allow-Origin"], "*");
        assert_eq!(json["headers"]["Access-Control-Allow-Methods"], "OPTIONS,GET");
        assert_eq!(json["headers"]["Content-Type"], "application/json");
        assert!(json["body"].is_string());
    }
}
