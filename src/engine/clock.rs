use std::time::Duration;
use tokio::time::Instant;

/// Tracks the most recently assigned dispatch slot.
///
/// Slots handed out by [`reserve`](Self::reserve) never go backwards and are
/// spaced exactly `interval` apart while a backlog exists. Once the clock has
/// fallen behind `now` the next slot restarts at `now + interval`.
#[derive(Debug, Clone)]
pub struct SchedulingClock {
    interval: Duration,
    last_scheduled_time: Instant,
}

impl SchedulingClock {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_scheduled_time: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_scheduled_time(&self) -> Instant {
        self.last_scheduled_time
    }

    /// Assign the next slot and advance the clock to it
    pub fn reserve(&mut self, now: Instant) -> Instant {
        let base = self.last_scheduled_time.max(now);
        // Saturates at the current frontier if the instant would overflow
        let slot = base.checked_add(self.interval).unwrap_or(base);
        self.last_scheduled_time = slot;
        slot
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_scheduled_time = now;
    }

    /// Frontier a new admission would be scheduled after
    pub fn next_available_slot(&self, now: Instant) -> Instant {
        self.last_scheduled_time.max(now)
    }

    pub fn estimated_wait_for_new(&self, now: Instant) -> Duration {
        self.next_available_slot(now)
            .duration_since(now)
            .saturating_add(self.interval)
    }
}
