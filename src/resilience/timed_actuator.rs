use crate::error::ActuatorError;
use crate::hal::Actuator;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Bounds every call of the wrapped actuator.
///
/// A call that overruns is abandoned and reported as
/// [`ActuatorError::Timeout`], so a hung link cannot stall the dispatcher.
pub struct TimedActuator<P> {
    inner: Arc<dyn Actuator<P>>,
    limit: Duration,
    _payload: PhantomData<fn(&P)>,
}

impl<P: Send + Sync + 'static> TimedActuator<P> {
    pub fn new(inner: Arc<dyn Actuator<P>>, limit: Duration) -> Self {
        Self {
            inner,
            limit,
            _payload: PhantomData,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<P: Send + Sync + 'static> Actuator<P> for TimedActuator<P> {
    async fn apply(&self, payload: &P) -> Result<String, ActuatorError> {
        match timeout(self.limit, self.inner.apply(payload)).await {
            Ok(result) => result,
            Err(_) => Err(ActuatorError::Timeout(self.limit)),
        }
    }
}
