pub mod best_effort;
pub mod timed_actuator;

pub use best_effort::BestEffortNotifier;
pub use timed_actuator::TimedActuator;
