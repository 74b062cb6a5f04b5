use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Anything that can travel through the queue to an actuator
pub trait Payload: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// Identifier assigned at admission; `seq` is unique per queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId {
    pub subject: String,
    pub seq: u64,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.subject, self.seq)
    }
}

/// A subject's pending request to apply a payload.
///
/// `queue_position` and `estimated_wait` are computed once at admission and
/// are display hints only: they are not updated when earlier requests are
/// dispatched or the queue is cleared.
#[derive(Debug, Clone, Serialize)]
pub struct Request<P> {
    pub request_id: RequestId,
    pub subject: String,
    pub payload: P,
    #[serde(skip)]
    pub scheduled_time: Instant,
    /// Wall-clock rendering of `scheduled_time`
    pub scheduled_at: DateTime<Utc>,
    pub queue_position: usize,
    #[serde(with = "secs")]
    pub estimated_wait: Duration,
    #[serde(skip)]
    pub admitted_at: Instant,
}

impl<P> Request<P> {
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            subject: self.subject.clone(),
            scheduled_at: self.scheduled_at,
            queue_position: self.queue_position,
            estimated_wait: self.estimated_wait,
        }
    }
}

/// Diagnostic view of a queued request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSummary {
    pub subject: String,
    pub scheduled_at: DateTime<Utc>,
    pub queue_position: usize,
    #[serde(with = "secs")]
    pub estimated_wait: Duration,
}

/// Point-in-time load report for callers showing wait estimates
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queue_size: usize,
    pub dispatcher_running: bool,
    pub next_available_slot: DateTime<Utc>,
    #[serde(with = "secs")]
    pub estimated_wait_for_new_request: Duration,
}

/// Map a monotonic instant onto the wall clock, relative to `now`.
pub fn wall_clock(at: Instant, now: Instant) -> DateTime<Utc> {
    let wall_now = Utc::now();
    let offset = |d: Duration| TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX);
    if at >= now {
        wall_now
            .checked_add_signed(offset(at.duration_since(now)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    } else {
        wall_now
            .checked_sub_signed(offset(now.duration_since(at)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Serialize durations as fractional seconds
pub mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
