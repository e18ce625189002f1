use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use common::{FeatureSettings, MarketData, Pace, PeriodicTask, Result};

use crate::bars::BarAggregator;
use crate::builder::FeatureBuilder;
use crate::store::FeatureStore;

/// What one feature cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    Cached { feature_count: usize },
    Skipped(String),
}

/// Periodic task: ticks → bars → feature vector → feature store.
pub struct FeaturePipeline {
    symbol: String,
    tick_limit: usize,
    min_features: usize,
    market: Arc<dyn MarketData>,
    store: Arc<FeatureStore>,
    aggregator: BarAggregator,
    builder: FeatureBuilder,
}

impl FeaturePipeline {
    pub fn new(
        symbol: impl Into<String>,
        settings: &FeatureSettings,
        market: Arc<dyn MarketData>,
        store: Arc<FeatureStore>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            tick_limit: settings.tick_limit,
            min_features: settings.min_features,
            market,
            store,
            aggregator: BarAggregator::new(settings.bar_interval_secs, settings.min_bars),
            builder: FeatureBuilder::new(settings.rsi_period),
        }
    }

    /// Run one cycle. Precondition failures are reported, not raised; only
    /// market-data failures are errors.
    pub async fn cycle(&self) -> Result<CycleReport> {
        let ticks = self.market.recent_ticks(&self.symbol, self.tick_limit).await?;
        if ticks.is_empty() {
            return Ok(self.skip("no tick data".to_string()));
        }

        let series = match self.aggregator.aggregate(&ticks) {
            Ok(series) => series,
            Err(insufficient) => return Ok(self.skip(insufficient.to_string())),
        };

        let vector = match self.builder.build(&self.symbol, &series, Utc::now()) {
            Ok(vector) => vector,
            Err(failure) => return Ok(self.skip(failure.to_string())),
        };

        if !vector.is_valid(self.min_features) {
            return Ok(self.skip(format!(
                "invalid vector: {} finite of {} features",
                vector.finite_count(),
                vector.len()
            )));
        }

        let feature_count = vector.len();
        self.store.put(&self.symbol, vector).await;
        info!(symbol = %self.symbol, features = feature_count, bars = series.len(), "Generated features");
        Ok(CycleReport::Cached { feature_count })
    }

    fn skip(&self, reason: String) -> CycleReport {
        debug!(symbol = %self.symbol, reason = %reason, "Feature cycle skipped");
        CycleReport::Skipped(reason)
    }
}

#[async_trait]
impl PeriodicTask for FeaturePipeline {
    fn name(&self) -> &str {
        "feature-pipeline"
    }

    async fn run_cycle(&mut self) -> Result<Pace> {
        self.cycle().await?;
        Ok(Pace::Normal)
    }
}
