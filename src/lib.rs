//! Paced dispatch of "apply this value" requests to a single actuator.
//!
//! Requests from any number of producers are admitted into a FIFO and each
//! gets a slot at least one interval after the previous one. A single
//! background dispatcher applies them at their slots and then tells any
//! observers which subject just became active.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod hal;
pub mod observability;
pub mod resilience;

pub use config::DispatchConfig;
pub use engine::PacedDispatchQueue;
pub use error::{ActuatorError, ConfigError};
