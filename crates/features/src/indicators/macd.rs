use super::moving_average::ema_series;

/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// Computes: MACD line = EMA(fast) − EMA(slow), Signal = EMA(macd_line, signal_period),
/// histogram = line − signal.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// Latest MACD values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Default for MacdIndicator {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast < slow,
            "MACD fast period must be less than slow period"
        );
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self { fast, slow, signal }
    }

    /// Minimum number of closes needed for a value.
    pub fn min_len(&self) -> usize {
        self.slow + self.signal - 1
    }

    /// Compute MACD from a slice of close prices (oldest first).
    /// Returns `None` if there isn't enough data.
    pub fn compute(&self, closes: &[f64]) -> Option<Macd> {
        if closes.len() < self.min_len() {
            return None;
        }

        let fast = ema_series(closes, self.fast);
        let slow = ema_series(closes, self.slow);

        // Align both series on the close index: fast[j] is close `fast - 1 + j`.
        let offset = self.slow - self.fast;
        let line_series: Vec<f64> = slow
            .iter()
            .enumerate()
            .map(|(j, s)| fast[j + offset] - s)
            .collect();

        let signal_series = ema_series(&line_series, self.signal);
        let line = *line_series.last()?;
        let signal = *signal_series.last()?;

        Some(Macd {
            line,
            signal,
            histogram: line - signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn macd_returns_none_with_insufficient_data() {
        let macd = MacdIndicator::default();
        let prices = vec![100.0; 33]; // need >= 34
        assert!(macd.compute(&prices).is_none());
    }

    #[test]
    fn macd_returns_some_at_minimum_length() {
        let macd = MacdIndicator::default();
        assert!(macd.compute(&trending_up(34)).is_some());
    }

    #[test]
    fn macd_positive_on_uptrend() {
        let macd = MacdIndicator::new(3, 6, 3);
        let m = macd.compute(&trending_up(40)).unwrap();
        assert!(m.line > 0.0, "fast EMA should lead on an uptrend: {m:?}");
        assert!((m.histogram - (m.line - m.signal)).abs() < 1e-12);
    }

    #[test]
    fn macd_zero_on_flat_series() {
        let m = MacdIndicator::default().compute(&[1.1; 60]).unwrap();
        assert!(m.line.abs() < 1e-12);
        assert!(m.signal.abs() < 1e-12);
    }
}
