use chrono::{DateTime, Datelike, Timelike, Utc};

use common::{BarSeries, FeatureVector};

use crate::indicators::{
    atr, bollinger, ema, pct_change, sma, stochastic, MacdIndicator, RsiIndicator,
};

const STOCH_WINDOW: usize = 14;
const STOCH_SMOOTH: usize = 3;
const ATR_PERIOD: usize = 14;
const BB_PERIOD: usize = 20;
const BB_STD_DEV: f64 = 2.0;
const VOLUME_SMA_PERIOD: usize = 20;

/// Why no vector could be built this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildFailure {
    EmptySeries,
    /// An indicator's window was not filled.
    Undefined(&'static str),
    /// A feature evaluated to NaN or infinity.
    NonFinite(&'static str),
}

impl std::fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildFailure::EmptySeries => write!(f, "empty bar series"),
            BuildFailure::Undefined(name) => write!(f, "indicator '{name}' undefined"),
            BuildFailure::NonFinite(name) => write!(f, "feature '{name}' is not finite"),
        }
    }
}

/// Turns a bar series into one normalized feature vector.
///
/// Stateless: the output depends only on the bars and the `now` passed in.
/// `hour_of_day` and `day_of_week` are read from `now` in UTC, not in the
/// host's local zone.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    rsi: RsiIndicator,
    macd: MacdIndicator,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(14)
    }
}

impl FeatureBuilder {
    pub fn new(rsi_period: usize) -> Self {
        Self {
            rsi: RsiIndicator::new(rsi_period),
            macd: MacdIndicator::default(),
        }
    }

    /// Compute the full feature set. Any undefined or non-finite feature
    /// aborts the whole vector.
    pub fn build(
        &self,
        symbol: &str,
        series: &BarSeries,
        now: DateTime<Utc>,
    ) -> Result<FeatureVector, BuildFailure> {
        let raw = self.raw_features(series, now)?;

        let mut values: Vec<f64> = raw.iter().map(|(_, v)| *v).collect();
        normalize(&mut values);

        let mut vector = FeatureVector::new(symbol, now);
        for ((name, _), value) in raw.into_iter().zip(values) {
            vector.push(name, value);
        }
        Ok(vector)
    }

    /// Unnormalized features in their fixed order.
    pub fn raw_features(
        &self,
        series: &BarSeries,
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, f64)>, BuildFailure> {
        if series.is_empty() {
            return Err(BuildFailure::EmptySeries);
        }
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();
        let close = closes[closes.len() - 1];

        let mut out: Vec<(&'static str, f64)> = Vec::with_capacity(27);

        // Momentum
        let rsi = self.rsi.compute(&closes).ok_or(BuildFailure::Undefined("rsi"))?;
        let stoch = stochastic(&highs, &lows, &closes, STOCH_WINDOW, STOCH_SMOOTH)
            .ok_or(BuildFailure::Undefined("stochastic"))?;
        out.push(("rsi", rsi));
        out.push(("stoch_k", stoch.k));
        out.push(("stoch_d", stoch.d));

        // Trend
        let sma_20 = sma(&closes, 20).ok_or(BuildFailure::Undefined("sma_20"))?;
        let sma_50 = sma(&closes, 50).ok_or(BuildFailure::Undefined("sma_50"))?;
        let ema_12 = ema(&closes, 12).ok_or(BuildFailure::Undefined("ema_12"))?;
        let ema_26 = ema(&closes, 26).ok_or(BuildFailure::Undefined("ema_26"))?;
        out.push(("sma_20", sma_20));
        out.push(("sma_50", sma_50));
        out.push(("ema_12", ema_12));
        out.push(("ema_26", ema_26));

        let macd = self.macd.compute(&closes).ok_or(BuildFailure::Undefined("macd"))?;
        out.push(("macd", macd.line));
        out.push(("macd_signal", macd.signal));
        out.push(("macd_diff", macd.histogram));

        // Volatility
        let atr = atr(&highs, &lows, &closes, ATR_PERIOD).ok_or(BuildFailure::Undefined("atr"))?;
        let bb = bollinger(&closes, BB_PERIOD, BB_STD_DEV)
            .ok_or(BuildFailure::Undefined("bollinger"))?;
        out.push(("atr", atr));
        out.push(("bb_upper", bb.upper));
        out.push(("bb_lower", bb.lower));
        out.push(("bb_middle", bb.middle));

        // Volume
        let volume_sma = sma(&volumes, VOLUME_SMA_PERIOD)
            .ok_or(BuildFailure::Undefined("volume_sma"))?;
        let last_volume = volumes[volumes.len() - 1];
        let volume_ratio = if volume_sma > 0.0 { last_volume / volume_sma } else { 1.0 };
        out.push(("volume_sma", volume_sma));
        out.push(("volume_ratio", volume_ratio));

        // Price action
        out.push(("close_to_sma20_ratio", close / sma_20));
        out.push(("close_to_bb_upper_ratio", close / bb.upper));
        out.push(("close_to_bb_lower_ratio", close / bb.lower));
        out.push(("ema_12_26_ratio", ema_12 / ema_26));
        out.push(("price_trend", if close > sma_20 { 1.0 } else { -1.0 }));
        out.push(("price_change_1m", pct_change(&closes, 1)));
        out.push(("price_change_5m", pct_change(&closes, 5)));

        // Market condition
        let avg_spread = series.spreads.iter().sum::<f64>() / series.spreads.len().max(1) as f64;
        let last_spread = series.spreads.last().copied().unwrap_or(0.0);
        let spread_ratio = if avg_spread > 0.0 { last_spread / avg_spread } else { 1.0 };
        out.push(("avg_spread", avg_spread));
        out.push(("spread_ratio", spread_ratio));

        // Calendar, sampled from the UTC wall clock rather than the bars.
        out.push(("hour_of_day", now.hour() as f64));
        out.push(("day_of_week", now.weekday().num_days_from_monday() as f64));

        if let Some((name, _)) = out.iter().find(|(_, v)| !v.is_finite()) {
            return Err(BuildFailure::NonFinite(*name));
        }
        Ok(out)
    }
}

/// Cycle-local z-score: rescale every value to `(v - mean) / std` using the
/// population standard deviation across the vector itself. With zero
/// deviation the values are left as they are.
pub fn normalize(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std > 0.0 && std.is_finite() {
        for v in values.iter_mut() {
            *v = (*v - mean) / std;
        }
    }
}
