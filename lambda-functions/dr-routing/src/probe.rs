use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

/// Body the regional health endpoint answers with.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HealthPayload {
    pub status: String,
    pub region: Option<String>,
}

impl HealthPayload {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Outbound health check. Any ambiguity reads as unhealthy; it never errors.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait HealthProber: Send + Sync {
    async fn probe(&self, url: &str, timeout: Duration) -> bool;
}

pub struct HttpHealthProber {
    client: reqwest::Client,
}

impl HttpHealthProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpHealthProber {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HealthProber for HttpHealthProber {
    async fn probe(&self, url: &str, timeout: Duration) -> bool {
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                info!("Health probe of {} failed: {}", url, e);
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            info!("Health probe of {} returned {}", url, status);
            return false;
        }

        // The request timeout also bounds reading the body.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                info!("Health probe of {} failed reading body: {}", url, e);
                return false;
            }
        };

        payload_is_healthy(&body)
    }
}

/// True only for a JSON body with an explicit `"status": "healthy"`.
pub fn payload_is_healthy(body: &str) -> bool {
    match serde_json::from_str::<HealthPayload>(body) {
        Ok(payload) => payload.is_healthy(),
        Err(e) => {
            warn!("Unparsable health payload: {}", e);
            false
        }
    }
}
