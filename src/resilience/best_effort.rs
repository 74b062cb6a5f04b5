use crate::hal::Notifier;
use crate::observability::DispatchMetrics;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Fire-and-forget wrapper around a [`Notifier`].
///
/// Each notification runs on its own task bounded by `limit`. Failures,
/// timeouts and panics are logged and counted, never returned. Starting a
/// notification aborts any earlier one still in flight, so observers never
/// end up showing a subject older than the latest dispatch.
#[derive(Clone)]
pub struct BestEffortNotifier {
    inner: Arc<dyn Notifier>,
    metrics: Arc<DispatchMetrics>,
    limit: Duration,
    in_flight: Arc<Mutex<Option<AbortHandle>>>,
}

impl BestEffortNotifier {
    pub fn new(inner: Arc<dyn Notifier>, metrics: Arc<DispatchMetrics>, limit: Duration) -> Self {
        Self {
            inner,
            metrics,
            limit,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Start announcing `subject`. The handle may be dropped.
    pub fn fire(&self, subject: String) -> JoinHandle<()> {
        let metrics = self.metrics.clone();
        let limit = self.limit;

        let mut call = {
            let inner = self.inner.clone();
            let subject = subject.clone();
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = in_flight.take() {
                previous.abort();
            }
            let call = tokio::spawn(async move { inner.notify(&subject).await });
            *in_flight = Some(call.abort_handle());
            call
        };

        tokio::spawn(async move {
            match timeout(limit, &mut call).await {
                Ok(Ok(Ok(true))) => info!(subject = %subject, "notified observers"),
                Ok(Ok(Ok(false))) => {
                    metrics.record_notify_failure();
                    warn!(subject = %subject, "notifier declined update");
                }
                Ok(Ok(Err(e))) => {
                    metrics.record_notify_failure();
                    error!(subject = %subject, error = %e, "notify failed");
                }
                Ok(Err(join_err)) if join_err.is_cancelled() => {
                    debug!(subject = %subject, "notification superseded");
                }
                Ok(Err(join_err)) => {
                    metrics.record_notify_failure();
                    error!(subject = %subject, error = %join_err, "notifier task aborted");
                }
                Err(_) => {
                    call.abort();
                    metrics.record_notify_failure();
                    error!(subject = %subject, limit = ?limit, "notify timed out");
                }
            }
        })
    }
}
