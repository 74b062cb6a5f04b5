use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info};

use crate::config::DispatchConfig;
use crate::core::{Payload, Request};
use crate::engine::queue::PacedQueue;
use crate::hal::{Actuator, Notifier};
use crate::observability::DispatchMetrics;
use crate::resilience::{BestEffortNotifier, TimedActuator};

/// The single consumer of a [`PacedQueue`].
///
/// Pops requests in admission order, waits for each one's slot, applies it
/// through the actuator and then announces the subject. A failed or
/// panicking actuator call is logged and the request is dropped; the loop
/// only ends when told to stop.
pub struct Dispatcher<P> {
    queue: Arc<PacedQueue<P>>,
    actuator: Arc<dyn Actuator<P>>,
    notifier: Option<BestEffortNotifier>,
    metrics: Arc<DispatchMetrics>,
    poll_interval: Duration,
}

impl<P> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            actuator: self.actuator.clone(),
            notifier: self.notifier.clone(),
            metrics: self.metrics.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl<P: Payload> Dispatcher<P> {
    pub fn new(
        queue: Arc<PacedQueue<P>>,
        actuator: Arc<dyn Actuator<P>>,
        notifier: Option<Arc<dyn Notifier>>,
        metrics: Arc<DispatchMetrics>,
        config: &DispatchConfig,
    ) -> Self {
        let actuator: Arc<dyn Actuator<P>> =
            Arc::new(TimedActuator::new(actuator, config.actuator_timeout));
        let notifier = notifier
            .map(|n| BestEffortNotifier::new(n, metrics.clone(), config.notify_timeout));

        Self {
            queue,
            actuator,
            notifier,
            metrics,
            poll_interval: config.poll_interval,
        }
    }

    /// Process requests until `stop` turns true or its sender goes away
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        info!("dispatcher loop started");

        while !*stop.borrow() {
            let Some(request) = self.queue.try_pop() else {
                tokio::select! {
                    _ = self.queue.notified() => {}
                    _ = sleep(self.poll_interval) => {}
                    changed = stop.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                continue;
            };

            if !self.wait_for_slot(&request, &mut stop).await {
                info!(
                    request_id = %request.request_id,
                    "stopped before slot, returning request to queue"
                );
                self.queue.requeue_front(request);
                break;
            }

            self.dispatch(request).await;
        }

        info!("dispatcher loop stopped");
    }

    /// Sleep in steps of at most `poll_interval` until the request's slot.
    /// Returns false if stopped first.
    async fn wait_for_slot(&self, request: &Request<P>, stop: &mut watch::Receiver<bool>) -> bool {
        let slot = request.scheduled_time;
        let now = Instant::now();
        if now < slot {
            debug!(
                subject = %request.subject,
                wait_secs = (slot - now).as_secs_f64(),
                "waiting for slot"
            );
        }

        loop {
            if *stop.borrow() {
                return false;
            }
            let now = Instant::now();
            if now >= slot {
                return true;
            }

            let wake = slot.min(now + self.poll_interval);
            tokio::select! {
                _ = sleep_until(wake) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    async fn dispatch(&self, request: Request<P>) {
        let lateness = Instant::now().saturating_duration_since(request.scheduled_time);
        info!(
            subject = %request.subject,
            request_id = %request.request_id,
            payload = ?request.payload,
            "dispatching request"
        );

        let start = self.metrics.start_dispatch();
        let call = {
            let actuator = self.actuator.clone();
            let payload = request.payload.clone();
            tokio::spawn(async move { actuator.apply(&payload).await })
        };

        match call.await {
            Ok(Ok(message)) => {
                info!(subject = %request.subject, %message, "dispatch succeeded");
            }
            Ok(Err(e)) => {
                self.metrics.record_dispatch_failure();
                error!(
                    subject = %request.subject,
                    payload = ?request.payload,
                    error = %e,
                    "dispatch failed"
                );
            }
            Err(join_err) => {
                self.metrics.record_dispatch_failure();
                self.metrics.record_internal_error();
                error!(
                    subject = %request.subject,
                    error = %join_err,
                    "actuator task aborted"
                );
            }
        }
        self.metrics.finish_dispatch(start, lateness);

        match &self.notifier {
            Some(notifier) => {
                notifier.fire(request.subject);
            }
            None => debug!(subject = %request.subject, "no notifier configured"),
        }
    }
}
