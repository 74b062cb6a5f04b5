use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by the queue, the dispatcher and the notifier wrapper
pub struct DispatchMetrics {
    admitted: AtomicU64,
    dispatched: AtomicU64,
    dispatch_failures: AtomicU64,
    notify_failures: AtomicU64,
    cleared: AtomicU64,
    internal_errors: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
    total_lateness_us: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            admitted: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            notify_failures: AtomicU64::new(0),
            cleared: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
            total_lateness_us: AtomicU64::new(0),
        }
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    /// Requests handed to the actuator, successful or not
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures.load(Ordering::Relaxed)
    }

    pub fn notify_failures(&self) -> u64 {
        self.notify_failures.load(Ordering::Relaxed)
    }

    pub fn cleared(&self) -> u64 {
        self.cleared.load(Ordering::Relaxed)
    }

    pub fn internal_errors(&self) -> u64 {
        self.internal_errors.load(Ordering::Relaxed)
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cleared(&self, count: usize) {
        self.cleared.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notify_failure(&self) {
        self.notify_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_dispatch(&self) -> Instant {
        Instant::now()
    }

    /// `lateness` is how far past its slot the request reached the actuator
    pub fn finish_dispatch(&self, start: Instant, lateness: Duration) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(micros(start.elapsed()), Ordering::Relaxed);
        self.total_lateness_us
            .fetch_add(micros(lateness), Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }

    pub fn avg_lateness_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_lateness_us.load(Ordering::Relaxed) / samples
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
