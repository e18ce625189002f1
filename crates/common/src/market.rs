use async_trait::async_trait;

use crate::{Result, Tick};

/// Read-only view of the tick store and the trade ledger.
///
/// `SqliteMarketData` in `crates/engine` implements this against the legacy
/// trading database. Every method is a separate query so the decision engine
/// can stop calling the store as soon as a gate fails.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Most recent `limit` ticks for `symbol`, newest first.
    async fn recent_ticks(&self, symbol: &str, limit: usize) -> Result<Vec<Tick>>;

    /// Spread in pips of the latest tick.
    async fn current_spread(&self, symbol: &str) -> Result<f64>;

    /// Mid price `(bid + ask) / 2` of the latest tick.
    async fn mid_price(&self, symbol: &str) -> Result<f64>;

    /// Number of trades on `symbol` that are not yet closed.
    async fn open_positions(&self, symbol: &str) -> Result<usize>;
}
