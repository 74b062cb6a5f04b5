use pacelight::core::Rgb;
use pacelight::engine::PacedQueue;
use pacelight::hal::mock::MockActuator;
use pacelight::observability::DispatchMetrics;
use pacelight::{DispatchConfig, PacedDispatchQueue};
use std::sync::Arc;
use tokio::time::{advance, Duration, Instant};

const INTERVAL: Duration = Duration::from_secs(20);

fn color_queue() -> PacedDispatchQueue<Rgb> {
    PacedDispatchQueue::new(
        DispatchConfig::with_interval(INTERVAL),
        Arc::new(MockActuator::new()),
        None,
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_three_requests_are_spaced_one_interval_apart() {
    let queue = color_queue();
    let t0 = Instant::now();

    let a = queue.enqueue("A", Rgb::new(255, 0, 0));
    assert_eq!(a.scheduled_time, t0 + Duration::from_secs(20));
    assert_eq!(a.queue_position, 1);
    assert_eq!(a.estimated_wait, Duration::from_secs(20));

    advance(Duration::from_millis(100)).await;
    let b = queue.enqueue("B", Rgb::new(0, 255, 0));
    assert_eq!(b.scheduled_time, t0 + Duration::from_secs(40));
    assert_eq!(b.queue_position, 2);
    assert_eq!(b.estimated_wait, Duration::from_millis(39_900));

    advance(Duration::from_millis(100)).await;
    let c = queue.enqueue("C", Rgb::new(0, 0, 255));
    assert_eq!(c.scheduled_time, t0 + Duration::from_secs(60));
    assert_eq!(c.queue_position, 3);
    assert_eq!(c.estimated_wait, Duration::from_millis(59_800));

    let status = queue.status();
    assert_eq!(status.queue_size, 3);
    assert!(!status.dispatcher_running);
    assert_eq!(status.estimated_wait_for_new_request, Duration::from_millis(79_800));
    assert!(status.next_available_slot > chrono::Utc::now() + chrono::TimeDelta::seconds(59));
}

#[tokio::test(start_paused = true)]
async fn test_clear_discards_and_restarts_clock() {
    let queue = color_queue();
    let t0 = Instant::now();

    queue.enqueue("A", Rgb::new(1, 0, 0));
    advance(Duration::from_millis(100)).await;
    queue.enqueue("B", Rgb::new(2, 0, 0));
    advance(Duration::from_millis(100)).await;
    queue.enqueue("C", Rgb::new(3, 0, 0));

    advance(Duration::from_millis(800)).await;
    assert_eq!(queue.clear(), 3);
    assert!(queue.peek_contents().is_empty());

    advance(Duration::from_millis(100)).await;
    let d = queue.enqueue("D", Rgb::new(4, 0, 0));
    assert_eq!(d.scheduled_time, t0 + Duration::from_millis(21_100));
    assert_eq!(d.queue_position, 1);
    assert_eq!(d.estimated_wait, INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_clear_on_empty_queue_returns_zero() {
    let queue = color_queue();
    assert_eq!(queue.clear(), 0);
    assert_eq!(queue.status().estimated_wait_for_new_request, INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_slots_never_go_backwards_across_real_time_gaps() {
    let queue = color_queue();
    let gaps = [0u64, 5, 0, 30, 1, 60, 0, 0, 19, 21];

    let mut previous: Option<Instant> = None;
    for (i, gap) in gaps.iter().enumerate() {
        advance(Duration::from_secs(*gap)).await;
        let request = queue.enqueue(format!("user{}", i), Rgb::new(i as u8, 0, 0));

        assert!(request.scheduled_time >= Instant::now() + INTERVAL);
        if let Some(prev) = previous {
            assert!(request.scheduled_time >= prev + INTERVAL);
        }
        previous = Some(request.scheduled_time);
    }
}

#[tokio::test(start_paused = true)]
async fn test_idle_clock_does_not_accumulate_backlog() {
    let queue = color_queue();
    queue.enqueue("early", Rgb::new(9, 9, 9));
    queue.clear();

    advance(Duration::from_secs(120)).await;
    let now = Instant::now();
    let late = queue.enqueue("late", Rgb::new(1, 1, 1));
    assert_eq!(late.scheduled_time, now + INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_peek_contents_reports_admission_order() {
    let queue = color_queue();
    for name in ["first", "second", "third"] {
        queue.enqueue(name, Rgb::new(0, 0, 0));
    }

    let contents = queue.peek_contents();
    let subjects: Vec<_> = contents.iter().map(|s| s.subject.as_str()).collect();
    assert_eq!(subjects, vec!["first", "second", "third"]);
    let positions: Vec<_> = contents.iter().map(|s| s.queue_position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    assert!(contents.windows(2).all(|w| w[0].scheduled_at < w[1].scheduled_at));

    // Peeking is non-destructive
    assert_eq!(queue.status().queue_size, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admission_gets_distinct_evenly_spaced_slots() {
    let queue = Arc::new(PacedQueue::<u32>::new(INTERVAL, Arc::new(DispatchMetrics::new())));

    let mut handles = Vec::new();
    for producer in 0..8u32 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            (0..25u32)
                .map(|i| queue.enqueue(format!("p{}", producer), producer * 100 + i))
                .collect::<Vec<_>>()
        }));
    }

    let mut requests = Vec::new();
    for handle in handles {
        requests.extend(handle.await.unwrap());
    }
    requests.sort_by_key(|r| r.request_id.seq);

    assert_eq!(requests.len(), 200);
    for (i, pair) in requests.windows(2).enumerate() {
        assert_eq!(pair[1].scheduled_time - pair[0].scheduled_time, INTERVAL);
        assert_eq!(pair[0].queue_position, i + 1);
    }
    assert_eq!(queue.len(), 200);
}

#[tokio::test(start_paused = true)]
async fn test_request_serializes_for_callers() {
    let queue = color_queue();
    let request = queue.enqueue("alice", Rgb::new(255, 128, 64));

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["subject"], "alice");
    assert_eq!(json["payload"]["r"], 255);
    assert_eq!(json["queue_position"], 1);
    assert_eq!(json["estimated_wait"], 20.0);
    assert_eq!(json["request_id"]["subject"], "alice");
    assert!(json["scheduled_at"].is_string());
    assert!(json.get("scheduled_time").is_none());
}
