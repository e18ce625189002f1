use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Trading parameters, loaded from a TOML file.
///
/// Every key is optional. Example `config/scalper.toml`:
/// ```toml
/// symbol = "EURUSD"
///
/// [features]
/// bar_interval_secs = 60
/// min_bars = 50
///
/// [decision]
/// min_confidence = 0.75
/// max_spread_pips = 2.0
///
/// [schedule]
/// decision_interval_secs = 5
/// cooldown_multiplier = 6
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Instrument both loops work on, e.g. "EURUSD".
    pub symbol: String,
    pub features: FeatureSettings,
    pub decision: DecisionSettings,
    pub schedule: ScheduleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            features: FeatureSettings::default(),
            decision: DecisionSettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

/// Bar aggregation and feature computation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub bar_interval_secs: u64,
    /// Fewer bars than this and the cycle is skipped.
    pub min_bars: usize,
    /// How many recent ticks to pull per cycle.
    pub tick_limit: usize,
    pub rsi_period: usize,
    /// Vectors with fewer finite features are never cached.
    pub min_features: usize,
    /// Per-symbol feature cache bound.
    pub cache_capacity: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            bar_interval_secs: 60,
            min_bars: 50,
            tick_limit: 1000,
            rsi_period: 14,
            min_features: 5,
            cache_capacity: 1000,
        }
    }
}

/// Confidence and risk gates of the decision engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecisionSettings {
    pub min_confidence: f64,
    pub max_spread_pips: f64,
    pub max_open_positions: usize,
    pub lot_size: f64,
    pub sl_pips: f64,
    pub tp_pips: f64,
    pub min_features: usize,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.75,
            max_spread_pips: 2.0,
            max_open_positions: 3,
            lot_size: 0.01,
            sl_pips: 10.0,
            tp_pips: 20.0,
            min_features: 5,
        }
    }
}

/// Loop timing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub feature_interval_secs: u64,
    pub decision_interval_secs: u64,
    /// Decision loop waits `interval * cooldown_multiplier` after a signal.
    pub cooldown_multiplier: u32,
    pub publish_timeout_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            feature_interval_secs: 30,
            decision_interval_secs: 5,
            cooldown_multiplier: 6,
            publish_timeout_secs: 5,
        }
    }
}

impl ScheduleSettings {
    pub fn feature_interval(&self) -> Duration {
        Duration::from_secs(self.feature_interval_secs)
    }

    pub fn decision_interval(&self) -> Duration {
        Duration::from_secs(self.decision_interval_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

impl Settings {
    /// Load from a TOML file. A missing file yields the defaults; an
    /// unreadable or invalid one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(Error::Config(msg.to_string()));

        if self.symbol.trim().is_empty() {
            return fail("symbol must not be empty");
        }
        let f = &self.features;
        if f.bar_interval_secs == 0 {
            return fail("features.bar_interval_secs must be > 0");
        }
        if f.min_bars == 0 || f.tick_limit == 0 || f.cache_capacity == 0 {
            return fail("features.min_bars, tick_limit and cache_capacity must be > 0");
        }
        if f.rsi_period < 2 {
            return fail("features.rsi_period must be >= 2");
        }
        let d = &self.decision;
        if !(0.0..=1.0).contains(&d.min_confidence) {
            return fail("decision.min_confidence must be within [0, 1]");
        }
        if !(d.sl_pips >= 0.0 && d.tp_pips >= 0.0 && d.sl_pips.is_finite() && d.tp_pips.is_finite()) {
            return fail("decision.sl_pips and tp_pips must be finite and >= 0");
        }
        if !(d.lot_size > 0.0 && d.lot_size.is_finite()) {
            return fail("decision.lot_size must be finite and > 0");
        }
        if !(d.max_spread_pips >= 0.0 && d.max_spread_pips.is_finite()) {
            return fail("decision.max_spread_pips must be finite and >= 0");
        }
        if d.min_features == 0 {
            return fail("decision.min_features must be > 0");
        }
        let s = &self.schedule;
        if s.feature_interval_secs == 0 || s.decision_interval_secs == 0 {
            return fail("schedule intervals must be > 0");
        }
        if s.cooldown_multiplier == 0 {
            return fail("schedule.cooldown_multiplier must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_legacy_constants() {
        let s = Settings::default();
        assert_eq!(s.symbol, "EURUSD");
        assert_eq!(s.features.min_bars, 50);
        assert_eq!(s.features.cache_capacity, 1000);
        assert_eq!(s.decision.min_confidence, 0.75);
        assert_eq!(s.decision.max_spread_pips, 2.0);
        assert_eq!(s.decision.max_open_positions, 3);
        assert_eq!(s.decision.sl_pips, 10.0);
        assert_eq!(s.decision.tp_pips, 20.0);
        assert_eq!(s.schedule.feature_interval_secs, 30);
        assert_eq!(s.schedule.decision_interval_secs, 5);
        assert_eq!(s.schedule.cooldown_multiplier, 6);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let s = Settings::from_toml(
            r#"
            symbol = "USDJPY"

            [decision]
            max_spread_pips = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(s.symbol, "USDJPY");
        assert_eq!(s.decision.max_spread_pips, 1.5);
        assert_eq!(s.decision.min_confidence, 0.75);
        assert_eq!(s.features, FeatureSettings::default());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = Settings::from_toml("[decision]\nmin_confidence = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_bad_decision_gates() {
        for body in [
            "max_spread_pips = -1.0",
            "max_spread_pips = nan",
            "max_spread_pips = inf",
            "min_features = 0",
            "lot_size = 0.0",
            "sl_pips = nan",
        ] {
            let err = Settings::from_toml(&format!("[decision]\n{body}\n")).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted: {body}");
        }
        assert!(Settings::from_toml("[decision]\nmax_spread_pips = 0.0\n").is_ok());
    }

    #[test]
    fn rejects_zero_interval() {
        let err = Settings::from_toml("[schedule]\ndecision_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[features]\nmin_bars = 60").unwrap();
        let s = Settings::load(file.path()).unwrap();
        assert_eq!(s.features.min_bars, 60);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "symbol = [").unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
