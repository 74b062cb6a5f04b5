use pacelight::hal::mock::MockActuator;
use pacelight::observability::{DispatchMetrics, DispatchMonitor};
use pacelight::{DispatchConfig, PacedDispatchQueue};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[test]
fn test_metrics_creation() {
    let metrics = DispatchMetrics::new();
    assert_eq!(metrics.admitted(), 0);
    assert_eq!(metrics.dispatched(), 0);
    assert_eq!(metrics.avg_latency_us(), 0);
    assert_eq!(metrics.avg_lateness_us(), 0);
}

#[test]
fn test_metrics_increment() {
    let metrics = Arc::new(DispatchMetrics::new());

    metrics.record_admitted();
    metrics.record_admitted();
    metrics.record_cleared(2);
    metrics.record_dispatch_failure();
    metrics.record_notify_failure();

    assert_eq!(metrics.admitted(), 2);
    assert_eq!(metrics.cleared(), 2);
    assert_eq!(metrics.dispatch_failures(), 1);
    assert_eq!(metrics.notify_failures(), 1);
}

#[test]
fn test_lateness_is_averaged() {
    let metrics = DispatchMetrics::new();

    metrics.finish_dispatch(metrics.start_dispatch(), Duration::from_millis(10));
    metrics.finish_dispatch(metrics.start_dispatch(), Duration::from_millis(30));

    assert_eq!(metrics.dispatched(), 2);
    assert_eq!(metrics.avg_lateness_us(), 20_000);
}

#[test]
fn test_oversized_lateness_saturates() {
    let metrics = DispatchMetrics::new();
    metrics.finish_dispatch(metrics.start_dispatch(), Duration::MAX);
    assert_eq!(metrics.avg_lateness_us(), u64::MAX);
}

#[test]
fn test_report_lists_counters() {
    let metrics = Arc::new(DispatchMetrics::new());
    metrics.record_admitted();
    metrics.record_dispatch_failure();

    let report = DispatchMonitor::new(metrics).generate_report();
    assert!(report.contains("Admitted: 1 request\n"));
    assert!(report.contains("Dispatched: 0 requests"));
    assert!(report.contains("Dispatch failures: 1"));
}

#[tokio::test(start_paused = true)]
async fn test_queue_feeds_metrics() {
    let actuator = Arc::new(MockActuator::<u8>::new().failing_on([0]));
    let queue = PacedDispatchQueue::new(
        DispatchConfig::with_interval(Duration::from_secs(1)),
        actuator,
        None,
    )
    .unwrap();

    queue.enqueue("a", 1);
    queue.enqueue("b", 2);
    queue.enqueue("c", 3);
    queue.enqueue("d", 4);
    queue.start();
    sleep(Duration::from_millis(2_200)).await;
    // "c" is already taken and waiting for its slot; only "d" is pending
    assert_eq!(queue.clear(), 1);
    queue.shutdown().await;

    let metrics = queue.metrics();
    assert_eq!(metrics.admitted(), 4);
    assert_eq!(metrics.dispatched(), 2);
    assert_eq!(metrics.dispatch_failures(), 1);
    assert_eq!(metrics.cleared(), 1);

    let report = queue.monitor().generate_report();
    assert!(report.contains("Cleared: 1 request\n"));
}
