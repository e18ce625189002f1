use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use common::{Error, MarketData, Result, Tick};

/// Read side of the shared SQLite database: `ticks_raw` written by the
/// collector, `trades` written by the execution service. Never writes.
pub struct SqliteMarketData {
    db: SqlitePool,
}

impl SqliteMarketData {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open `url` read-only without touching the file yet. Only unparsable
    /// options fail here; a missing or locked database surfaces as a
    /// `Database` error on the first query.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.read_only(true);
        let db = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy_with(options);
        Ok(Self::new(db))
    }

    async fn latest_tick(&self, symbol: &str) -> Result<Tick> {
        self.recent_ticks(symbol, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::MarketData(format!("no ticks recorded for {symbol}")))
    }
}

#[async_trait]
impl MarketData for SqliteMarketData {
    async fn recent_ticks(&self, symbol: &str, limit: usize) -> Result<Vec<Tick>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<(f64, f64, f64, f64, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT timestamp, bid, ask, spread, volume
            FROM ticks_raw
            WHERE symbol = ?1
            ORDER BY timestamp DESC
            LIMIT ?2
            "#,
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp, bid, ask, spread, volume)| Tick {
                timestamp,
                bid,
                ask,
                spread,
                volume: volume.unwrap_or(0.0),
            })
            .collect())
    }

    async fn current_spread(&self, symbol: &str) -> Result<f64> {
        Ok(self.latest_tick(symbol).await?.spread)
    }

    async fn mid_price(&self, symbol: &str) -> Result<f64> {
        Ok(self.latest_tick(symbol).await?.mid())
    }

    async fn open_positions(&self, symbol: &str) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM trades
            WHERE symbol = ?1 AND close_time IS NULL
            "#,
        )
        .bind(symbol)
        .fetch_one(&self.db)
        .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
