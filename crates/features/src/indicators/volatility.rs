use super::moving_average::sma;

/// Average True Range with Wilder smoothing.
///
/// True range needs the previous close, so the first usable bar is index 1.
/// The average is seeded with the mean of the first `period` true ranges.
/// Needs `period + 1` bars.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = closes.len();
    if period == 0 || highs.len() != n || lows.len() != n || n < period + 1 {
        return None;
    }

    let true_ranges: Vec<f64> = (1..n)
        .map(|i| {
            let prev_close = closes[i - 1];
            (highs[i] - lows[i])
                .max((highs[i] - prev_close).abs())
                .max((lows[i] - prev_close).abs())
        })
        .collect();

    let mut value = true_ranges[..period].iter().sum::<f64>() / period as f64;
    for &tr in &true_ranges[period..] {
        value = (value * (period - 1) as f64 + tr) / period as f64;
    }
    Some(value)
}

/// Bollinger bands around the SMA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger bands over the last `period` closes at `k` population
/// standard deviations.
pub fn bollinger(closes: &[f64], period: usize, k: f64) -> Option<Bollinger> {
    let middle = sma(closes, period)?;
    let window = &closes[closes.len() - period..];
    let variance = window.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / period as f64;
    let width = k * variance.sqrt();
    Some(Bollinger {
        upper: middle + width,
        middle,
        lower: middle - width,
    })
}
