use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One raw quote observation from the tick store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Unix timestamp in seconds.
    pub timestamp: f64,
    pub bid: f64,
    pub ask: f64,
    /// Spread in pips as recorded by the feed.
    pub spread: f64,
    pub volume: f64,
}

impl Tick {
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// Fixed-interval OHLC bar built from the bid price of one or more ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bucket, unix seconds, aligned to the bar interval.
    pub bucket_start: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Bars plus the spread observed at each bar's close, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    pub bars: Vec<Bar>,
    pub spreads: Vec<f64>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// Named, ordered features computed in one pipeline cycle.
///
/// `symbol` and `timestamp` are tags, never features: they are excluded
/// from `values()` and `to_row()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub features: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            features: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.features.push((name.into(), value));
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.features.iter().map(|(_, v)| *v).collect()
    }

    /// Only finite values count towards validity.
    pub fn finite_count(&self) -> usize {
        self.features.iter().filter(|(_, v)| v.is_finite()).count()
    }

    /// A vector is cacheable when it has at least `min_features` entries
    /// and every entry is finite.
    pub fn is_valid(&self, min_features: usize) -> bool {
        self.finite_count() == self.len() && self.len() >= min_features
    }

    /// The single-row `(1, n)` model input, in feature order. `None` when
    /// any value is non-finite: columns are positional, so a hole cannot be
    /// skipped.
    pub fn to_row(&self) -> Option<Array2<f64>> {
        if self.finite_count() != self.len() {
            return None;
        }
        Array2::from_shape_vec((1, self.len()), self.values()).ok()
    }
}

/// An immutable feature vector as stored in the feature cache.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCacheEntry {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub vector: FeatureVector,
}

pub type SharedEntry = Arc<FeatureCacheEntry>;

/// Side of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Class predicted by the classification model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredictedClass {
    Hold,
    Buy,
    Sell,
}

impl PredictedClass {
    /// Model output index: 0 = HOLD, 1 = BUY, 2 = SELL. Anything else is HOLD.
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => PredictedClass::Buy,
            2 => PredictedClass::Sell,
            _ => PredictedClass::Hold,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            PredictedClass::Hold => None,
            PredictedClass::Buy => Some(Direction::Buy),
            PredictedClass::Sell => Some(Direction::Sell),
        }
    }
}

impl std::fmt::Display for PredictedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictedClass::Hold => write!(f, "HOLD"),
            PredictedClass::Buy => write!(f, "BUY"),
            PredictedClass::Sell => write!(f, "SELL"),
        }
    }
}

/// Outcome of one inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub class: PredictedClass,
    /// Probability of the most likely class, in `[0, 1]`.
    pub confidence: f64,
}

/// A filtered, risk-checked trading signal handed to the execution side.
///
/// Wire names follow the downstream signal API (`sl`, `tp`, `spread`,
/// `features_used`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub entry_price: f64,
    #[serde(rename = "sl")]
    pub stop_loss: f64,
    #[serde(rename = "tp")]
    pub take_profit: f64,
    pub lot_size: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "spread")]
    pub spread_at_generation: f64,
    #[serde(rename = "features_used")]
    pub feature_count: usize,
}

/// Why a decision cycle ended without a signal.
#[derive(Debug, Clone, PartialEq)]
pub enum NoSignalReason {
    NoFeatures,
    InsufficientFeatures { available: usize, required: usize },
    /// The cached vector holds NaN or infinite values.
    NonFiniteFeatures { count: usize },
    LowConfidence { class: PredictedClass, confidence: f64 },
    SpreadTooWide { spread: f64, max: f64 },
    PositionLimit { open: usize, max: usize },
}

impl NoSignalReason {
    /// Short stable label, used as a log field and stats key.
    pub fn kind(&self) -> &'static str {
        match self {
            NoSignalReason::NoFeatures => "no_features",
            NoSignalReason::InsufficientFeatures { .. } => "insufficient_features",
            NoSignalReason::NonFiniteFeatures { .. } => "non_finite_features",
            NoSignalReason::LowConfidence { .. } => "low_confidence",
            NoSignalReason::SpreadTooWide { .. } => "spread_too_wide",
            NoSignalReason::PositionLimit { .. } => "position_limit",
        }
    }
}

impl std::fmt::Display for NoSignalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoSignalReason::NoFeatures => write!(f, "no features"),
            NoSignalReason::InsufficientFeatures { available, required } => {
                write!(f, "insufficient features ({available} < {required})")
            }
            NoSignalReason::NonFiniteFeatures { count } => {
                write!(f, "{count} non-finite features")
            }
            NoSignalReason::LowConfidence { class, confidence } => {
                write!(f, "low confidence / hold ({class} @ {confidence:.2})")
            }
            NoSignalReason::SpreadTooWide { spread, max } => {
                write!(f, "spread too wide ({spread} > {max} pips)")
            }
            NoSignalReason::PositionLimit { open, max } => {
                write!(f, "position limit reached ({open} >= {max})")
            }
        }
    }
}

/// Terminal outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoSignal(NoSignalReason),
    Signal(Signal),
}

impl Decision {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Decision::Signal(s) => Some(s),
            Decision::NoSignal(_) => None,
        }
    }
}

/// How long the scheduler should wait before the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pace {
    #[default]
    Normal,
    /// Something was emitted; back off for the cooldown period.
    Cooldown,
}
