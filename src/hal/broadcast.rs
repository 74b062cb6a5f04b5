use crate::hal::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info};

pub const DEFAULT_SUBJECT: &str = "Waiting for user...";

/// Event delivered to display subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectUpdate {
    pub subject: String,
    pub timestamp: DateTime<Utc>,
}

/// Fans the active subject out to every attached display.
///
/// New subscribers can read [`current`](Self::current) to render the subject
/// that was active before they connected.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<SubjectUpdate>,
    current: Mutex<String>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            current: Mutex::new(DEFAULT_SUBJECT.to_string()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubjectUpdate> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, subject: &str) -> Result<bool> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = subject.to_string();

        let update = SubjectUpdate {
            subject: subject.to_string(),
            timestamp: Utc::now(),
        };

        // No display attached is fine; the subject is still remembered.
        match self.tx.send(update) {
            Ok(receivers) => info!(subject, receivers, "broadcast subject update"),
            Err(_) => debug!(subject, "no displays attached"),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let notifier = BroadcastNotifier::new(4);
        let mut rx = notifier.subscribe();

        assert_eq!(notifier.current(), DEFAULT_SUBJECT);
        assert!(notifier.notify("alice").await.unwrap());

        let update = rx.recv().await.unwrap();
        assert_eq!(update.subject, "alice");
        assert_eq!(notifier.current(), "alice");
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_succeeds() {
        let notifier = BroadcastNotifier::default();
        assert_eq!(notifier.subscriber_count(), 0);
        assert!(notifier.notify("bob").await.unwrap());
        assert_eq!(notifier.current(), "bob");
    }
}
