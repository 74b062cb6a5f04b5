pub mod actuator;
pub mod notifier;

pub use actuator::{AppliedPayload, MockActuator};
pub use notifier::{MockNotifier, NotifyBehavior};
