pub mod metrics;
pub mod monitor;

pub use metrics::DispatchMetrics;
pub use monitor::DispatchMonitor;
