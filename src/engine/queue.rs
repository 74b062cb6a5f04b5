use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::{wall_clock, Payload, QueueStatus, Request, RequestId, RequestSummary};
use crate::engine::clock::SchedulingClock;
use crate::observability::DispatchMetrics;

struct QueueInner<P> {
    clock: SchedulingClock,
    pending: VecDeque<Request<P>>,
    next_seq: u64,
}

/// FIFO of admitted requests plus the clock that paces them.
///
/// Both live behind one mutex so slot assignment, position and append happen
/// atomically. The lock is never held across an await.
pub struct PacedQueue<P> {
    inner: Mutex<QueueInner<P>>,
    available: Notify,
    metrics: Arc<DispatchMetrics>,
}

impl<P: Payload> PacedQueue<P> {
    pub fn new(interval: Duration, metrics: Arc<DispatchMetrics>) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                clock: SchedulingClock::new(interval, Instant::now()),
                pending: VecDeque::new(),
                next_seq: 0,
            }),
            available: Notify::new(),
            metrics,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<P>> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interval(&self) -> Duration {
        self.lock().clock.interval()
    }

    /// Admit a request and assign its slot. Never fails.
    pub fn enqueue(&self, subject: impl Into<String>, payload: P) -> Request<P> {
        let subject = subject.into();

        let request = {
            let mut inner = self.lock();
            let now = Instant::now();
            let slot = inner.clock.reserve(now);
            inner.next_seq += 1;

            let request = Request {
                request_id: RequestId {
                    subject: subject.clone(),
                    seq: inner.next_seq,
                },
                subject,
                payload,
                scheduled_time: slot,
                scheduled_at: wall_clock(slot, now),
                queue_position: inner.pending.len() + 1,
                estimated_wait: slot.duration_since(now),
                admitted_at: now,
            };
            inner.pending.push_back(request.clone());
            request
        };

        self.available.notify_one();
        self.metrics.record_admitted();

        info!(
            subject = %request.subject,
            request_id = %request.request_id,
            payload = ?request.payload,
            position = request.queue_position,
            wait_secs = request.estimated_wait.as_secs_f64(),
            "queued request"
        );

        request
    }

    /// Discard every pending request and restart the clock from now
    pub fn clear(&self) -> usize {
        let cleared = {
            let mut inner = self.lock();
            let cleared = inner.pending.len();
            inner.pending.clear();
            inner.clock.reset(Instant::now());
            cleared
        };

        self.metrics.record_cleared(cleared);
        info!(cleared, "cleared queue and reset timing");
        cleared
    }

    pub fn peek_contents(&self) -> Vec<RequestSummary> {
        self.lock().pending.iter().map(Request::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    pub fn status(&self, dispatcher_running: bool) -> QueueStatus {
        let inner = self.lock();
        let now = Instant::now();
        let next_slot = inner.clock.next_available_slot(now);

        QueueStatus {
            queue_size: inner.pending.len(),
            dispatcher_running,
            next_available_slot: wall_clock(next_slot, now),
            estimated_wait_for_new_request: inner.clock.estimated_wait_for_new(now),
        }
    }

    /// Restart the clock from now, but only when nothing is waiting.
    ///
    /// Returns whether the clock was reset.
    pub fn reset_clock_if_idle(&self) -> bool {
        let mut inner = self.lock();
        if !inner.pending.is_empty() {
            return false;
        }
        inner.clock.reset(Instant::now());
        true
    }

    pub(crate) fn try_pop(&self) -> Option<Request<P>> {
        self.lock().pending.pop_front()
    }

    /// Return a popped request to the head of the queue, keeping its slot
    pub(crate) fn requeue_front(&self, request: Request<P>) {
        debug!(request_id = %request.request_id, "returning request to head of queue");
        self.lock().pending.push_front(request);
        self.available.notify_one();
    }

    /// Resolves after the next admission (or immediately if one raced ahead)
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.available.notified()
    }
}
