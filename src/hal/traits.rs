use anyhow::Result;
use async_trait::async_trait;

use crate::error::ActuatorError;

/// Performs the real-world effect of a request
#[async_trait]
pub trait Actuator<P>: Send + Sync {
    /// Apply one payload. `Ok` carries a human-readable confirmation.
    ///
    /// Implementations must resolve in bounded time; any reconnect or retry
    /// is their own concern.
    async fn apply(&self, payload: &P) -> Result<String, ActuatorError>;
}

/// Announces which subject just became active
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `Ok(false)` reports a soft failure, `Err` a hard one. Both are only
    /// logged by the caller.
    async fn notify(&self, subject: &str) -> Result<bool>;
}
