use anyhow::Result;
use pacelight::core::Rgb;
use pacelight::hal::mock::MockActuator;
use pacelight::hal::{Actuator, BroadcastNotifier, Notifier, SerialActuator, SerialConfig};
use pacelight::{DispatchConfig, PacedDispatchQueue};
use std::sync::Arc;
use tokio::time::{sleep_until, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase())),
        )
        .init();

    let config = DispatchConfig::from_env()?;
    let serial = SerialConfig::from_env()?;

    let actuator: Arc<dyn Actuator<Rgb>> = if serial.port.is_some() {
        Arc::new(SerialActuator::new(serial))
    } else {
        info!("SERIAL_PORT not set, using in-memory actuator");
        Arc::new(MockActuator::new())
    };

    let display = Arc::new(BroadcastNotifier::default());
    let mut updates = display.subscribe();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            println!(
                "Now showing: {} ({})",
                update.subject,
                update.timestamp.format("%H:%M:%S")
            );
        }
    });

    let notifier: Arc<dyn Notifier> = display.clone();
    let queue = PacedDispatchQueue::new(config, actuator, Some(notifier))?;
    queue.start();

    println!("Pacelight - interval {:?}", queue.interval());
    println!("================================\n");

    let mut last_slot = None;
    for (subject, hex) in [("user1", "#FF0000"), ("user2", "#00FF00"), ("user3", "#0000FF")] {
        let request = queue.enqueue(subject, Rgb::from_hex(hex)?);
        println!(
            "{} queued {} at position {}, wait {:.1}s",
            subject,
            request.payload,
            request.queue_position,
            request.estimated_wait.as_secs_f64()
        );
        last_slot = Some(request.scheduled_time);
    }

    println!("\nStatus:\n{}", serde_json::to_string_pretty(&queue.status())?);
    println!("\nContents:\n{}", serde_json::to_string_pretty(&queue.peek_contents())?);

    if let Some(slot) = last_slot {
        tokio::select! {
            _ = sleep_until(slot + Duration::from_secs(1)) => {}
            _ = tokio::signal::ctrl_c() => println!("\nInterrupted"),
        }
    }

    queue.shutdown().await;
    println!("\n{}", queue.monitor().generate_report());
    println!("Last subject shown: {}", display.current());

    Ok(())
}
