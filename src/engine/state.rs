use serde::{Deserialize, Serialize};

/// Lifecycle of the background dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatcherState {
    Stopped,
    Running,
}

impl DispatcherState {
    pub fn can_transition_to(&self, target: &DispatcherState) -> bool {
        use DispatcherState::*;

        matches!((self, target), (Stopped, Running) | (Running, Stopped))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Stopped => "Stopped",
            Self::Running => "Running",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl Default for DispatcherState {
    fn default() -> Self {
        Self::Stopped
    }
}
