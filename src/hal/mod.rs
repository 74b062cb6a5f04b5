pub mod broadcast;
pub mod mock;
pub mod serial;
pub mod traits;

pub use broadcast::{BroadcastNotifier, SubjectUpdate};
pub use serial::{PortInfo, SerialActuator, SerialConfig};
pub use traits::{Actuator, Notifier};
