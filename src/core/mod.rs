pub mod color;
pub mod request;

pub use color::{ColorError, Rgb};
pub use request::{wall_clock, Payload, QueueStatus, Request, RequestId, RequestSummary};
