use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerStatus {
    FailoverInitiated,
    NoFailoverNeeded,
    PrimaryUnhealthy,
    NormalOperation,
    FailbackInitiated,
    Error,
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailoverInitiated => write!(f, "failover-initiated"),
            Self::NoFailoverNeeded => write!(f, "no-failover-needed"),
            Self::PrimaryUnhealthy => write!(f, "primary-unhealthy"),
            Self::NormalOperation => write!(f, "normal-operation"),
            Self::FailbackInitiated => write!(f, "failback-initiated"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Plain status object returned by the failover and recovery functions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerResponse {
    pub status: ControllerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl ControllerResponse {
    pub fn new(status: ControllerStatus) -> Self {
        Self {
            status,
            change_id: None,
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_change_id(mut self, change_id: impl Into<String>) -> Self {
        self.change_id = Some(change_id.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new(ControllerStatus::Error).with_message(err.to_string())
    }
}
