use std::sync::Arc;

use tracing::{error, info};

use common::{Signal, SignalSink};

/// Hands signals to the execution side. Delivery is fire-and-forget: a
/// failed send is logged and the signal is dropped.
pub struct SignalPublisher {
    sink: Arc<dyn SignalSink>,
}

impl SignalPublisher {
    pub fn new(sink: Arc<dyn SignalSink>) -> Self {
        Self { sink }
    }

    /// Returns `true` when the sink accepted the signal.
    pub async fn publish(&self, signal: &Signal) -> bool {
        match self.sink.send(signal).await {
            Ok(()) => {
                info!(
                    symbol = %signal.symbol,
                    direction = %signal.direction,
                    confidence = signal.confidence,
                    "Signal sent"
                );
                true
            }
            Err(e) => {
                error!(symbol = %signal.symbol, error = %e, "Failed to send signal");
                false
            }
        }
    }
}
