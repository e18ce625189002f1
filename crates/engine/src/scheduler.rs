use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use common::{Pace, PeriodicTask};

/// Drives one `PeriodicTask` at a fixed interval until shutdown.
///
/// Cycles never overlap: the wait starts when a cycle finishes. A failed or
/// panicking cycle is logged and the loop carries on at the normal interval.
/// A cycle that asks for `Pace::Cooldown` waits `interval * cooldown_multiplier`.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
    cooldown_multiplier: u32,
}

impl Scheduler {
    pub fn new(interval: Duration, cooldown_multiplier: u32) -> Self {
        Self {
            interval,
            cooldown_multiplier: cooldown_multiplier.max(1),
        }
    }

    pub fn wait_for(&self, pace: Pace) -> Duration {
        match pace {
            Pace::Normal => self.interval,
            Pace::Cooldown => self.interval * self.cooldown_multiplier,
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    /// Returns the number of completed cycles. Call from `tokio::spawn`.
    pub async fn run<T: PeriodicTask>(self, mut task: T, mut shutdown: watch::Receiver<bool>) -> u64 {
        let name = task.name().to_string();
        info!(task = %name, interval_secs = self.interval.as_secs_f64(), "Task started");

        let mut cycles = 0u64;
        loop {
            if *shutdown.borrow() {
                break;
            }

            cycles += 1;
            let pace = match AssertUnwindSafe(task.run_cycle()).catch_unwind().await {
                Ok(Ok(pace)) => pace,
                Ok(Err(e)) => {
                    error!(task = %name, cycle = cycles, error = %e, "Cycle failed");
                    Pace::Normal
                }
                Err(_) => {
                    error!(task = %name, cycle = cycles, "Cycle panicked");
                    Pace::Normal
                }
            };

            let wait = self.wait_for(pace);
            if pace == Pace::Cooldown {
                info!(task = %name, cooldown_secs = wait.as_secs_f64(), "Cooling down");
            }

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!(task = %name, "Shutdown sender dropped");
                        break;
                    }
                }
            }
        }

        info!(task = %name, cycles, "Task stopped");
        cycles
    }
}
