use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array2;
use tokio::sync::Mutex;

use common::{
    DecisionSettings, Direction, FeatureSettings, MarketData, Pace, PeriodicTask, Result, Signal,
    SignalSink, Tick,
};
use features::{CycleReport, FeaturePipeline, FeatureStore};
use signal::{Classifier, DecisionEngine, DecisionTask, Prediction, SignalPublisher};

/// One minute-bar uptrend, newest tick first on read.
struct TrendingMarket {
    ticks: Vec<Tick>,
    open_positions: usize,
}

impl TrendingMarket {
    fn new(minutes: usize) -> Self {
        let ticks = (0..minutes)
            .flat_map(|m| {
                (0..4).map(move |k| {
                    let bid = 1.08 + m as f64 * 0.0001 + k as f64 * 0.00002;
                    Tick {
                        timestamp: 1_700_000_000.0 + (m * 60 + k * 10) as f64,
                        bid,
                        ask: bid + 0.00012,
                        spread: 1.2,
                        volume: 1.0 + (m % 5) as f64,
                    }
                })
            })
            .collect();
        Self {
            ticks,
            open_positions: 0,
        }
    }
}

#[async_trait]
impl MarketData for TrendingMarket {
    async fn recent_ticks(&self, _symbol: &str, limit: usize) -> Result<Vec<Tick>> {
        Ok(self.ticks.iter().rev().take(limit).copied().collect())
    }

    async fn current_spread(&self, _symbol: &str) -> Result<f64> {
        Ok(self.ticks.last().map(|t| t.spread).unwrap_or_default())
    }

    async fn mid_price(&self, _symbol: &str) -> Result<f64> {
        Ok(self.ticks.last().map(Tick::mid).unwrap_or_default())
    }

    async fn open_positions(&self, _symbol: &str) -> Result<usize> {
        Ok(self.open_positions)
    }
}

/// Says BUY at 0.85 to everything.
struct Bullish;

impl Classifier for Bullish {
    fn predict(&mut self, _features: &Array2<f64>) -> Result<Prediction> {
        Ok(Prediction {
            class_index: 1,
            probabilities: vec![0.05, 0.85, 0.10],
        })
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Signal>>,
}

#[async_trait]
impl SignalSink for RecordingSink {
    async fn send(&self, signal: &Signal) -> Result<()> {
        self.sent.lock().await.push(signal.clone());
        Ok(())
    }
}

#[tokio::test]
async fn ticks_flow_through_to_one_published_signal() {
    let market = Arc::new(TrendingMarket::new(60));
    let store = Arc::new(FeatureStore::new(100));
    let sink = Arc::new(RecordingSink::default());

    let pipeline = FeaturePipeline::new(
        "EURUSD",
        &FeatureSettings::default(),
        market.clone(),
        store.clone(),
    );
    let report = pipeline.cycle().await.unwrap();
    assert!(matches!(report, CycleReport::Cached { .. }));

    let engine = DecisionEngine::new(
        "EURUSD",
        DecisionSettings::default(),
        store,
        market.clone(),
        Box::new(Bullish),
    );
    let mut task = DecisionTask::new(engine, SignalPublisher::new(sink.clone()));

    assert_eq!(task.run_cycle().await.unwrap(), Pace::Cooldown);

    let sent = sink.sent.lock().await;
    assert_eq!(sent.len(), 1);
    let signal = &sent[0];
    assert_eq!(signal.direction, Direction::Buy);
    assert!((signal.confidence - 0.85).abs() < 1e-12);
    assert!(signal.take_profit > signal.entry_price);
    assert!(signal.entry_price > signal.stop_loss);
    assert!(signal.feature_count >= 5);
    assert_eq!(task.stats().signals, 1);
}

#[tokio::test]
async fn empty_store_publishes_nothing() {
    let market = Arc::new(TrendingMarket::new(60));
    let sink = Arc::new(RecordingSink::default());
    let engine = DecisionEngine::new(
        "EURUSD",
        DecisionSettings::default(),
        Arc::new(FeatureStore::new(10)),
        market,
        Box::new(Bullish),
    );
    let mut task = DecisionTask::new(engine, SignalPublisher::new(sink.clone()));

    assert_eq!(task.run_cycle().await.unwrap(), Pace::Normal);
    assert!(sink.sent.lock().await.is_empty());
    assert_eq!(task.stats().vetoes.get("no_features"), Some(&1));
}

#[tokio::test]
async fn full_book_publishes_nothing() {
    let mut market = TrendingMarket::new(60);
    market.open_positions = 3;
    let market = Arc::new(market);
    let store = Arc::new(FeatureStore::new(10));
    let sink = Arc::new(RecordingSink::default());

    FeaturePipeline::new("EURUSD", &FeatureSettings::default(), market.clone(), store.clone())
        .cycle()
        .await
        .unwrap();

    let engine = DecisionEngine::new(
        "EURUSD",
        DecisionSettings::default(),
        store,
        market,
        Box::new(Bullish),
    );
    let mut task = DecisionTask::new(engine, SignalPublisher::new(sink.clone()));
    assert_eq!(task.run_cycle().await.unwrap(), Pace::Normal);
    assert!(sink.sent.lock().await.is_empty());
}
