use thiserror::Error;

/// Failures that end a controller invocation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    /// DNS read failed, or the primary/dr record pair could not be resolved.
    #[error("routing lookup failed: {0}")]
    Lookup(String),

    /// The weight change batch was rejected. Nothing is assumed committed.
    #[error("routing update rejected: {0}")]
    Update(String),

    #[error("inconsistent routing state: primary weight {primary_weight}, dr weight {dr_weight}")]
    InconsistentState { primary_weight: u32, dr_weight: u32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum NotifyError {
    #[error("failed to publish notification: {0}")]
    Publish(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for environment variable {name}")]
    Invalid { name: &'static str, value: String },
}
