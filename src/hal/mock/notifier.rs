use crate::hal::Notifier;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub enum NotifyBehavior {
    Succeed,
    /// Return `Ok(false)`
    Decline,
    Fail,
    /// Never finish within any sensible timeout
    Stall(Duration),
}

/// In-memory notifier recording every subject it is asked to announce
pub struct MockNotifier {
    subjects: Mutex<Vec<String>>,
    displayed: Mutex<Option<String>>,
    behavior: NotifyBehavior,
    slow: Vec<(String, Duration)>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::with_behavior(NotifyBehavior::Succeed)
    }

    pub fn with_behavior(behavior: NotifyBehavior) -> Self {
        Self {
            subjects: Mutex::new(Vec::new()),
            displayed: Mutex::new(None),
            behavior,
            slow: Vec::new(),
        }
    }

    /// Take `delay` before completing any announcement of `subject`
    pub fn slow_for(mut self, subject: impl Into<String>, delay: Duration) -> Self {
        self.slow.push((subject.into(), delay));
        self
    }

    pub fn subjects(&self) -> Vec<String> {
        self.subjects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last subject whose announcement completed successfully
    pub fn displayed(&self) -> Option<String> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, subject: &str) -> Result<bool> {
        self.subjects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subject.to_string());

        if let Some((_, delay)) = self.slow.iter().find(|(s, _)| s == subject) {
            sleep(*delay).await;
        }

        match &self.behavior {
            NotifyBehavior::Succeed => {}
            NotifyBehavior::Decline => return Ok(false),
            NotifyBehavior::Fail => return Err(anyhow!("display unreachable")),
            NotifyBehavior::Stall(d) => sleep(*d).await,
        }

        *self.displayed.lock().unwrap_or_else(PoisonError::into_inner) = Some(subject.to_string());
        Ok(true)
    }
}
