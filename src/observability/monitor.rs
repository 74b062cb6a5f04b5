use super::DispatchMetrics;
use std::sync::Arc;

pub struct DispatchMonitor {
    metrics: Arc<DispatchMetrics>,
}

impl DispatchMonitor {
    pub fn new(metrics: Arc<DispatchMetrics>) -> Self {
        Self { metrics }
    }

    pub fn generate_report(&self) -> String {
        let m = &self.metrics;
        let plural = |n: u64, word: &str| {
            format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
        };

        let mut report = String::from("=== Dispatch Metrics ===\n");
        report.push_str(&format!(
            "  Admitted: {}\n  Dispatched: {}\n  Cleared: {}\n",
            plural(m.admitted(), "request"),
            plural(m.dispatched(), "request"),
            plural(m.cleared(), "request"),
        ));
        report.push_str(&format!(
            "  Dispatch failures: {}\n  Notify failures: {}\n  Internal errors: {}\n",
            m.dispatch_failures(),
            m.notify_failures(),
            m.internal_errors(),
        ));
        report.push_str(&format!(
            "  Avg actuator latency: {}μs\n  Avg lateness: {}μs\n",
            m.avg_latency_us(),
            m.avg_lateness_us(),
        ));

        report
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }
}
