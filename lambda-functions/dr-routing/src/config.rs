use std::time::Duration;

use bon::Builder;

use crate::error::ConfigError;

pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/Prod/health";
pub const DEFAULT_API_SUBDOMAIN: &str = "api";
pub const DEFAULT_RECORD_TYPE: &str = "A";
pub const DEFAULT_ACTIVE_WEIGHT: u32 = 100;
/// Largest weight Route 53 accepts on a weighted record.
pub const MAX_RECORD_WEIGHT: u32 = 255;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

/// Process-wide settings shared by the failover and recovery functions.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    #[builder(into)]
    pub hosted_zone_id: String,
    #[builder(into)]
    pub domain_name: String,
    #[builder(into)]
    pub primary_region: String,
    #[builder(into)]
    pub dr_region: String,
    #[builder(into)]
    pub topic_arn: String,
    #[builder(into, default = DEFAULT_HEALTH_CHECK_PATH.to_string())]
    pub health_check_path: String,
    #[builder(into, default = DEFAULT_API_SUBDOMAIN.to_string())]
    pub api_subdomain: String,
    #[builder(into, default = DEFAULT_RECORD_TYPE.to_string())]
    pub record_type: String,
    /// Weight given to whichever side is serving traffic.
    #[builder(default = DEFAULT_ACTIVE_WEIGHT)]
    pub active_weight: u32,
    #[builder(default = Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS))]
    pub probe_timeout: Duration,
}

impl RoutingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let active_weight = match lookup("ACTIVE_WEIGHT") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(weight) if (1..=MAX_RECORD_WEIGHT).contains(&weight) => weight,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ACTIVE_WEIGHT",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_ACTIVE_WEIGHT,
        };

        // A zero timeout fails every probe, so failback could never happen.
        let probe_timeout_ms = match lookup("HEALTH_CHECK_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "HEALTH_CHECK_TIMEOUT_MS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_PROBE_TIMEOUT_MS,
        };

        Ok(Self {
            hosted_zone_id: required("HOSTED_ZONE_ID")?,
            domain_name: required("DOMAIN_NAME")?,
            primary_region: required("PRIMARY_REGION")?,
            dr_region: required("DR_REGION")?,
            topic_arn: required("SNS_TOPIC_ARN")?,
            health_check_path: optional("HEALTH_CHECK_PATH", DEFAULT_HEALTH_CHECK_PATH),
            api_subdomain: optional("API_SUBDOMAIN", DEFAULT_API_SUBDOMAIN),
            record_type: optional("RECORD_TYPE", DEFAULT_RECORD_TYPE),
            active_weight,
            probe_timeout: Duration::from_millis(probe_timeout_ms),
        })
    }

    /// The monitored public API hostname, e.g. `api.example.com`.
    pub fn hostname(&self) -> String {
        format!(
            "{}.{}",
            self.api_subdomain,
            self.domain_name.trim_end_matches('.')
        )
    }

    pub fn health_check_url(&self) -> String {
        let path = self.health_check_path.trim();
        if path.starts_with('/') {
            format!("https://{}{}", self.hostname(), path)
        } else {
            format!("https://{}/{}", self.hostname(), path)
        }
    }
}
