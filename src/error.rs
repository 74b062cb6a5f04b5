use std::time::Duration;
use thiserror::Error;

/// Why an actuator could not apply a payload.
///
/// Every variant is terminal for the request: the dispatcher logs it and
/// moves on without retrying.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("could not establish connection: {0}")]
    NotConnected(String),

    #[error("communication error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no completion within {0:?}")]
    Timeout(Duration),

    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("could not parse {key}={value:?}")]
    Parse { key: &'static str, value: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }
}
