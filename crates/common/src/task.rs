use async_trait::async_trait;

use crate::{Pace, Result};

/// A unit of periodic work driven by `engine::Scheduler`.
///
/// The scheduler never runs two cycles of the same task at once, so
/// implementations may hold `&mut` state between cycles.
#[async_trait]
pub trait PeriodicTask: Send {
    fn name(&self) -> &str;

    /// Run one cycle to completion. Errors are logged by the scheduler and
    /// never stop the loop.
    async fn run_cycle(&mut self) -> Result<Pace>;
}
