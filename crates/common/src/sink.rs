use async_trait::async_trait;

use crate::{Result, Signal};

/// Transport towards the execution service.
///
/// One call is one delivery attempt; implementations never retry.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, signal: &Signal) -> Result<()>;
}
