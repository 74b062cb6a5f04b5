pub mod clock;
pub mod dispatcher;
pub mod queue;
pub mod service;
pub mod state;

pub use clock::SchedulingClock;
pub use dispatcher::Dispatcher;
pub use queue::PacedQueue;
pub use service::PacedDispatchQueue;
pub use state::DispatcherState;
