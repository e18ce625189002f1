/// Simple moving average of the last `period` values.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average series, oldest first.
///
/// Multiplier `k = 2 / (period + 1)`, seeded with the SMA of the first
/// `period` values. Element `i` of the result corresponds to
/// `data[period - 1 + i]`. Empty when there is not enough data.
pub fn ema_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(data.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &value in &data[period..] {
        prev = value * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

/// Latest EMA value.
pub fn ema(data: &[f64], period: usize) -> Option<f64> {
    ema_series(data, period).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_of_last_window() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&data, 2), Some(4.5));
        assert_eq!(sma(&data, 5), Some(3.0));
        assert_eq!(sma(&data, 6), None);
        assert_eq!(sma(&data, 0), None);
    }

    #[test]
    fn ema_series_is_seeded_with_sma() {
        let data = [2.0, 4.0, 6.0, 8.0];
        let series = ema_series(&data, 3);
        assert_eq!(series.len(), 2);
        assert!((series[0] - 4.0).abs() < 1e-12);
        // k = 0.5 → 8 * 0.5 + 4 * 0.5
        assert!((series[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let data = vec![1.25; 40];
        assert!((ema(&data, 12).unwrap() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn ema_needs_period_values() {
        assert!(ema(&[1.0, 2.0], 3).is_none());
    }
}
