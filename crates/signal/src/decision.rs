use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use common::{Decision, DecisionSettings, Error, MarketData, NoSignalReason, Result, Signal};
use features::FeatureStore;

use crate::classifier::Classifier;
use crate::pricing::{bracket, pip_size};

/// Running counters over decision cycles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionStats {
    pub cycles: u64,
    pub signals: u64,
    pub failures: u64,
    /// Vetoes keyed by `NoSignalReason::kind()`.
    pub vetoes: BTreeMap<&'static str, u64>,
}

/// Scores the latest feature vector and gates it into a signal.
///
/// Gates run in a fixed order: features, confidence, spread, exposure. The
/// first failing gate ends the cycle before any further collaborator call.
pub struct DecisionEngine {
    symbol: String,
    config: DecisionSettings,
    store: Arc<FeatureStore>,
    market: Arc<dyn MarketData>,
    classifier: Box<dyn Classifier>,
    stats: DecisionStats,
}

impl DecisionEngine {
    pub fn new(
        symbol: impl Into<String>,
        config: DecisionSettings,
        store: Arc<FeatureStore>,
        market: Arc<dyn MarketData>,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            config,
            store,
            market,
            classifier,
            stats: DecisionStats::default(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn stats(&self) -> &DecisionStats {
        &self.stats
    }

    /// Run one decision cycle. Collaborator failures are returned as errors;
    /// every other outcome is a `Decision`.
    pub async fn decide(&mut self) -> Result<Decision> {
        self.stats.cycles += 1;
        let outcome = self.evaluate().await;
        match &outcome {
            Ok(Decision::Signal(_)) => self.stats.signals += 1,
            Ok(Decision::NoSignal(reason)) => {
                *self.stats.vetoes.entry(reason.kind()).or_default() += 1;
            }
            Err(_) => self.stats.failures += 1,
        }
        outcome
    }

    async fn evaluate(&mut self) -> Result<Decision> {
        // ── Fetch ─────────────────────────────────────────────────────────
        let Some(entry) = self.store.latest(&self.symbol).await else {
            return Ok(self.no_signal(NoSignalReason::NoFeatures));
        };

        // ── Vectorize ─────────────────────────────────────────────────────
        let Some(row) = entry.vector.to_row() else {
            return Ok(self.no_signal(NoSignalReason::NonFiniteFeatures {
                count: entry.vector.len() - entry.vector.finite_count(),
            }));
        };
        let feature_count = row.ncols();
        if feature_count < self.config.min_features {
            return Ok(self.no_signal(NoSignalReason::InsufficientFeatures {
                available: feature_count,
                required: self.config.min_features,
            }));
        }

        if let Some(expected) = self.classifier.expected_features() {
            if !expected.iter().map(String::as_str).eq(entry.vector.names()) {
                return Err(Error::Model(format!(
                    "model expects features [{}], vector has [{}]",
                    expected.join(", "),
                    entry.vector.names().collect::<Vec<_>>().join(", ")
                )));
            }
        }

        // ── Classify ──────────────────────────────────────────────────────
        let result = self.classifier.score(&row)?;

        // ── Confidence gate ───────────────────────────────────────────────
        let direction = match result.class.direction() {
            Some(direction) if result.confidence >= self.config.min_confidence => direction,
            _ => {
                return Ok(self.no_signal(NoSignalReason::LowConfidence {
                    class: result.class,
                    confidence: result.confidence,
                }))
            }
        };

        // ── Spread gate ───────────────────────────────────────────────────
        let spread = self.market.current_spread(&self.symbol).await?;
        if spread > self.config.max_spread_pips {
            return Ok(self.no_signal(NoSignalReason::SpreadTooWide {
                spread,
                max: self.config.max_spread_pips,
            }));
        }

        // ── Exposure gate ─────────────────────────────────────────────────
        let open = self.market.open_positions(&self.symbol).await?;
        if open >= self.config.max_open_positions {
            return Ok(self.no_signal(NoSignalReason::PositionLimit {
                open,
                max: self.config.max_open_positions,
            }));
        }

        // ── Price derivation ──────────────────────────────────────────────
        let price = self.market.mid_price(&self.symbol).await?;
        let levels = bracket(
            direction,
            price,
            pip_size(&self.symbol),
            self.config.sl_pips,
            self.config.tp_pips,
        );

        let signal = Signal {
            symbol: self.symbol.clone(),
            direction,
            confidence: result.confidence,
            entry_price: levels.entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            lot_size: self.config.lot_size,
            timestamp: Utc::now(),
            spread_at_generation: spread,
            feature_count,
        };
        info!(
            symbol = %signal.symbol,
            direction = %signal.direction,
            confidence = signal.confidence,
            entry = signal.entry_price,
            sl = signal.stop_loss,
            tp = signal.take_profit,
            "Generated signal"
        );
        Ok(Decision::Signal(signal))
    }

    fn no_signal(&self, reason: NoSignalReason) -> Decision {
        match reason {
            NoSignalReason::NoFeatures
            | NoSignalReason::InsufficientFeatures { .. }
            | NoSignalReason::NonFiniteFeatures { .. } => {
                debug!(symbol = %self.symbol, reason = %reason, "No signal");
            }
            _ => info!(symbol = %self.symbol, reason = %reason, "No signal"),
        }
        Decision::NoSignal(reason)
    }
}
