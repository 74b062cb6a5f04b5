use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::DispatchConfig;
use crate::core::{Payload, QueueStatus, Request, RequestSummary};
use crate::engine::dispatcher::Dispatcher;
use crate::engine::queue::PacedQueue;
use crate::engine::state::DispatcherState;
use crate::error::ConfigError;
use crate::hal::{Actuator, Notifier};
use crate::observability::{DispatchMetrics, DispatchMonitor};

struct Worker {
    state: DispatcherState,
    stop_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

/// Paced dispatch queue with its background dispatcher.
///
/// Producers call [`enqueue`](Self::enqueue) from any task; admission never
/// blocks on dispatch and never fails. One dispatcher task, managed by
/// [`start`](Self::start) / [`stop`](Self::stop), applies the requests in
/// order, no two closer together than the configured interval.
pub struct PacedDispatchQueue<P> {
    queue: Arc<PacedQueue<P>>,
    dispatcher: Dispatcher<P>,
    metrics: Arc<DispatchMetrics>,
    config: DispatchConfig,
    worker: Mutex<Worker>,
}

impl<P: Payload> PacedDispatchQueue<P> {
    pub fn new(
        config: DispatchConfig,
        actuator: Arc<dyn Actuator<P>>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let metrics = Arc::new(DispatchMetrics::new());
        let queue = Arc::new(PacedQueue::new(config.interval, metrics.clone()));
        let dispatcher = Dispatcher::new(
            queue.clone(),
            actuator,
            notifier,
            metrics.clone(),
            &config,
        );

        Ok(Self {
            queue,
            dispatcher,
            metrics,
            config,
            worker: Mutex::new(Worker {
                state: DispatcherState::Stopped,
                stop_tx: None,
                handle: None,
            }),
        })
    }

    fn lock_worker(&self) -> MutexGuard<'_, Worker> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, subject: impl Into<String>, payload: P) -> Request<P> {
        self.queue.enqueue(subject, payload)
    }

    pub fn status(&self) -> QueueStatus {
        self.queue.status(self.is_running())
    }

    /// Drop every pending request; returns how many were discarded.
    ///
    /// A request the dispatcher has already taken is unaffected.
    pub fn clear(&self) -> usize {
        self.queue.clear()
    }

    /// Best-effort snapshot of the pending requests, in dispatch order
    pub fn peek_contents(&self) -> Vec<RequestSummary> {
        self.queue.peek_contents()
    }

    pub fn is_running(&self) -> bool {
        self.lock_worker().state.is_running()
    }

    /// Spawn the dispatcher. Returns false if it was already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut worker = self.lock_worker();
        if !worker.state.can_transition_to(&DispatcherState::Running) {
            debug!("dispatcher already running");
            return false;
        }

        // A loop stopped without `shutdown` may still be finishing its last
        // dispatch or returning a request to the queue. The new one waits for
        // it so only one is ever active, and the idle check sees the final
        // queue contents.
        let previous = worker.handle.take().filter(|h| !h.is_finished());
        if previous.is_none() {
            reset_if_idle(&self.queue);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let dispatcher = self.dispatcher.clone();
        let queue = self.queue.clone();

        worker.handle = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
                reset_if_idle(&queue);
            }
            dispatcher.run(stop_rx).await;
        }));
        worker.stop_tx = Some(stop_tx);
        worker.state = DispatcherState::Running;

        info!(interval = ?self.config.interval, "dispatcher started");
        true
    }

    /// Ask the dispatcher to stop. Returns immediately; the loop exits at its
    /// next poll boundary, after any in-flight actuator call.
    pub fn stop(&self) -> bool {
        let mut worker = self.lock_worker();
        if !worker.state.can_transition_to(&DispatcherState::Stopped) {
            return false;
        }

        if let Some(stop_tx) = worker.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        worker.state = DispatcherState::Stopped;

        info!("dispatcher stop requested");
        true
    }

    /// Stop and wait for the dispatcher task to finish
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.lock_worker().handle.take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "dispatcher task ended abnormally");
            }
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }

    pub fn monitor(&self) -> DispatchMonitor {
        DispatchMonitor::new(self.metrics.clone())
    }
}

fn reset_if_idle<P: Payload>(queue: &PacedQueue<P>) {
    if queue.reset_clock_if_idle() {
        debug!("queue idle, scheduling clock reset");
    }
}

/// Dropping only signals the dispatcher; call `shutdown` to wait for it.
impl<P> Drop for PacedDispatchQueue<P> {
    fn drop(&mut self) {
        let worker = self.worker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(stop_tx) = worker.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
    }
}
