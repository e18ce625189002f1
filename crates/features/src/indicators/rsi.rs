/// Wilder RSI over bar closes.
///
/// The first `period` changes seed plain averages of gains and losses; every
/// later change is folded in with Wilder smoothing. Defined once there are
/// `period + 1` closes.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self { period }
    }

    /// RSI of `closes` (oldest first), in `[0, 100]`. A window with no
    /// movement at all reads 50.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() <= self.period {
            return None;
        }
        let n = self.period as f64;
        let split = |c: f64| (c.max(0.0), (-c).max(0.0));

        let mut changes = closes.windows(2).map(|w| w[1] - w[0]);
        let (gain, loss) = changes
            .by_ref()
            .take(self.period)
            .map(split)
            .fold((0.0, 0.0), |(g, l), (up, down)| (g + up, l + down));
        let (mut avg_gain, mut avg_loss) = (gain / n, loss / n);

        for (up, down) in changes.map(split) {
            avg_gain = (avg_gain * (n - 1.0) + up) / n;
            avg_loss = (avg_loss * (n - 1.0) + down) / n;
        }

        let total = avg_gain + avg_loss;
        if total == 0.0 {
            return Some(50.0);
        }
        Some(100.0 * avg_gain / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIP: f64 = 0.0001;

    /// EURUSD-style closes from a base price and pip offsets.
    fn closes(base: f64, pips: &[f64]) -> Vec<f64> {
        pips.iter().map(|p| base + p * PIP).collect()
    }

    #[test]
    fn undefined_until_period_plus_one_closes() {
        let rsi = RsiIndicator::new(14);
        assert!(rsi.compute(&closes(1.08, &[0.0; 14])).is_none());
        assert!(rsi.compute(&closes(1.08, &[0.0; 15])).is_some());
    }

    #[test]
    fn seed_window_is_plain_average() {
        // +2, -1, +3 pips: gains 5, losses 1.
        let rsi = RsiIndicator::new(3);
        let v = rsi.compute(&closes(1.08, &[0.0, 2.0, 1.0, 4.0])).unwrap();
        assert!((v - 500.0 / 6.0).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn later_changes_use_wilder_smoothing() {
        // Seed as above, then -2 pips: gain 10/9, loss 8/9.
        let rsi = RsiIndicator::new(3);
        let v = rsi.compute(&closes(1.08, &[0.0, 2.0, 1.0, 4.0, 2.0])).unwrap();
        assert!((v - 1000.0 / 18.0).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn one_sided_moves_hit_the_bounds() {
        let rsi = RsiIndicator::new(3);
        let up = rsi.compute(&closes(1.08, &[0.0, 1.0, 3.0, 4.0, 6.0])).unwrap();
        let down = rsi.compute(&closes(1.08, &[6.0, 4.0, 3.0, 1.0, 0.0])).unwrap();
        assert!((up - 100.0).abs() < 1e-9);
        assert!(down.abs() < 1e-9);
    }

    #[test]
    fn quiet_market_is_neutral() {
        let rsi = RsiIndicator::new(3);
        assert_eq!(rsi.compute(&[1.0850; 6]), Some(50.0));
    }

    #[test]
    fn independent_of_quote_scale() {
        // The same pip path on a JPY pair (pip 0.01) gives the same reading.
        let path = [0.0, 3.0, 1.0, 2.0, 5.0, 4.0, 7.0];
        let rsi = RsiIndicator::new(4);
        let eur = rsi.compute(&closes(1.08, &path)).unwrap();
        let jpy: Vec<f64> = path.iter().map(|p| 150.0 + p * 0.01).collect();
        let jpy = rsi.compute(&jpy).unwrap();
        assert!((eur - jpy).abs() < 1e-6, "{eur} vs {jpy}");
    }
}
