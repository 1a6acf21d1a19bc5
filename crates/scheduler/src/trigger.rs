//! Recurring daily trigger.
//!
//! Owns the sleep-until-fire loop: each iteration recomputes the next fire
//! instant from live "now" (so clock adjustments self-heal), sleeps with
//! shutdown awareness, then awaits the callback to completion. Callback
//! failures are logged and never stop future ticks.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use herald_common::types::ScheduleConfig;

use crate::next_fire_time;

/// Handle to the running daily loop. Created by [`DailyTrigger::start`].
/// Dropping the handle closes the shutdown channel, which stops the loop
/// at its next await point; [`DailyTrigger::stop`] also waits for the exit.
pub struct DailyTrigger {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl DailyTrigger {
    /// Spawn the recurring loop. `tick` runs once per scheduled fire; its
    /// error is logged and the loop continues with the next day.
    pub fn start<F, Fut>(schedule: ScheduleConfig, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            run_loop(schedule, &mut tick, &mut shutdown_rx).await;
        });
        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signal shutdown and wait for the loop to finish. An in-flight send
    /// is never aborted: the loop only observes the signal between awaits.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

async fn run_loop<F, Fut>(
    schedule: ScheduleConfig,
    tick: &mut F,
    shutdown_rx: &mut watch::Receiver<bool>,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    tracing::info!(schedule = %schedule.local_label(), "Daily trigger started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let now = Utc::now();
        let next = next_fire_time(now, &schedule);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(
            next_fire = %next,
            wait = %format_wait(wait),
            "Sleeping until next scheduled fire"
        );

        tokio::select! {
            _ = sleep(wait) => {}
            changed = shutdown_rx.changed() => {
                // A closed channel can never signal again: a dropped
                // handle stops the loop.
                if changed.is_err() {
                    tracing::info!("Shutdown channel closed, stopping daily trigger");
                    break;
                }
                if *shutdown_rx.borrow() {
                    tracing::info!("Shutdown requested during sleep, stopping daily trigger");
                    break;
                }
                // Spurious wake: recompute and sleep again.
                continue;
            }
        }

        // Not raced against shutdown: a fire in progress always completes.
        if let Err(e) = tick().await {
            tracing::error!(error = %e, "Scheduled fire failed, waiting for tomorrow's tick");
        }

        // Step past the fired second so the recompute lands on the next day
        // instead of re-matching the same instant.
        tokio::select! {
            _ = sleep(Duration::from_secs(1)) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("Daily trigger stopped");
}

/// Compact "22h 30m" rendering for sleep-duration logs.
fn format_wait(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}
