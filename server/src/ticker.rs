// grocer_server/src/ticker.rs

use chrono::Utc;
use grocer::Engine;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Runs a generation cycle every `period` until the runtime shuts down.
///
/// The first tick fires immediately. A failed cycle is logged and the next
/// tick tries again.
pub fn spawn_generation_ticker(engine: Engine, period: Duration) -> JoinHandle<()> {
  info!(period_secs = period.as_secs(), "Starting subscription generation ticker.");
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
      interval.tick().await;
      match engine.generate_due_orders(Utc::now()).await {
        Ok(report) => info!(
          generated = report.generated.len(),
          skipped = report.skipped.len(),
          "{}",
          report.message()
        ),
        Err(e) => error!(error = %e, "Subscription generation cycle failed."),
      }
    }
  })
}
