use crate::error::ActuatorError;
use crate::hal::Actuator;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// One call observed by [`MockActuator`]
#[derive(Debug, Clone)]
pub struct AppliedPayload<P> {
    pub payload: P,
    pub at: Instant,
    pub succeeded: bool,
}

/// In-memory actuator recording every payload it is handed
pub struct MockActuator<P> {
    calls: Mutex<Vec<AppliedPayload<P>>>,
    call_count: AtomicUsize,
    fail_on: HashSet<usize>,
    panic_on: HashSet<usize>,
    delay: Option<Duration>,
}

impl<P: Clone + Send + Sync> MockActuator<P> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            fail_on: HashSet::new(),
            panic_on: HashSet::new(),
            delay: None,
        }
    }

    /// Fail the calls with these zero-based indexes
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on.extend(calls);
        self
    }

    /// Panic inside the calls with these zero-based indexes
    pub fn panicking_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.panic_on.extend(calls);
        self
    }

    /// Take this long to complete each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<AppliedPayload<P>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn payloads(&self) -> Vec<P> {
        self.calls().into_iter().map(|c| c.payload).collect()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl<P: Clone + Send + Sync> Default for MockActuator<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Clone + Send + Sync> Actuator<P> for MockActuator<P> {
    async fn apply(&self, payload: &P) -> Result<String, ActuatorError> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);
        let at = Instant::now();

        if self.panic_on.contains(&index) {
            panic!("mock actuator panicked on call {}", index);
        }

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let succeeded = !self.fail_on.contains(&index);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AppliedPayload {
                payload: payload.clone(),
                at,
                succeeded,
            });

        if succeeded {
            Ok(format!("applied call {}", index))
        } else {
            Err(ActuatorError::Rejected(format!("scripted failure on call {}", index)))
        }
    }
}
