use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client as SnsClient;
use tracing::info;

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub fn failover(primary_region: &str, dr_region: &str, change_id: &str) -> Self {
        Self {
            subject: "API Failover Completed".to_string(),
            message: format!(
                "Traffic has been redirected from the primary region ({}) to the disaster recovery region ({}) due to a health check failure. Route53 change: {}",
                primary_region, dr_region, change_id
            ),
        }
    }

    pub fn failback(primary_region: &str, dr_region: &str, change_id: &str) -> Self {
        Self {
            subject: "API Failback Completed".to_string(),
            message: format!(
                "Traffic has been restored from the disaster recovery region ({}) to the primary region ({}). The system has recovered from disaster recovery mode. Route53 change: {}",
                dr_region, primary_region, change_id
            ),
        }
    }
}

/// Operational notifications. Delivery is not confirmed.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct SnsNotifier {
    client: SnsClient,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: SnsClient, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    pub fn from_sdk_config(config: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self::new(SnsClient::new(config), topic_arn)
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(&notification.subject)
            .message(&notification.message)
            .send()
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))?;

        info!(
            "Published '{}' to {} (message id {})",
            notification.subject,
            self.topic_arn,
            output.message_id().unwrap_or("unknown")
        );

        Ok(())
    }
}
