use async_trait::async_trait;
use tracing::debug;

use common::{Decision, Pace, PeriodicTask, Result};

use crate::decision::{DecisionEngine, DecisionStats};
use crate::publisher::SignalPublisher;

/// Periodic task: decide, then publish whatever signal comes out.
///
/// A cycle that produces a signal asks the scheduler for a cooldown,
/// whether or not delivery succeeded.
pub struct DecisionTask {
    engine: DecisionEngine,
    publisher: SignalPublisher,
}

impl DecisionTask {
    pub fn new(engine: DecisionEngine, publisher: SignalPublisher) -> Self {
        Self { engine, publisher }
    }

    pub fn stats(&self) -> &DecisionStats {
        self.engine.stats()
    }
}

#[async_trait]
impl PeriodicTask for DecisionTask {
    fn name(&self) -> &str {
        "signal-decision"
    }

    async fn run_cycle(&mut self) -> Result<Pace> {
        match self.engine.decide().await? {
            Decision::Signal(signal) => {
                self.publisher.publish(&signal).await;
                Ok(Pace::Cooldown)
            }
            Decision::NoSignal(reason) => {
                debug!(symbol = %self.engine.symbol(), kind = reason.kind(), "Decision cycle idle");
                Ok(Pace::Normal)
            }
        }
    }
}
