/// Stochastic oscillator %K / %D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

/// Stochastic oscillator over `window` bars with %D = SMA(`smooth`) of %K.
///
/// A bar window with zero high-low range yields %K = 50.
/// Needs `window + smooth - 1` bars.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    window: usize,
    smooth: usize,
) -> Option<Stochastic> {
    let n = closes.len();
    if window == 0 || smooth == 0 || highs.len() != n || lows.len() != n {
        return None;
    }
    if n < window + smooth - 1 {
        return None;
    }

    let percent_k = |end: usize| -> f64 {
        let start = end + 1 - window;
        let hh = highs[start..=end].iter().copied().fold(f64::MIN, f64::max);
        let ll = lows[start..=end].iter().copied().fold(f64::MAX, f64::min);
        let range = hh - ll;
        if range <= 0.0 {
            50.0
        } else {
            100.0 * (closes[end] - ll) / range
        }
    };

    let ks: Vec<f64> = (n - smooth..n).map(percent_k).collect();
    let k = *ks.last()?;
    let d = ks.iter().sum::<f64>() / smooth as f64;
    Some(Stochastic { k, d })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_at_high_is_100() {
        let highs: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let lows: Vec<f64> = highs.iter().map(|h| h - 2.0).collect();
        let closes = highs.clone();
        let s = stochastic(&highs, &lows, &closes, 14, 3).unwrap();
        assert!((s.k - 100.0).abs() < 1e-9);
        assert!((s.d - 100.0).abs() < 1e-9);
    }

    #[test]
    fn flat_window_is_neutral() {
        let flat = vec![1.0; 20];
        let s = stochastic(&flat, &flat, &flat, 14, 3).unwrap();
        assert_eq!(s.k, 50.0);
        assert_eq!(s.d, 50.0);
    }

    #[test]
    fn insufficient_bars() {
        let v = vec![1.0; 15];
        assert!(stochastic(&v, &v, &v, 14, 3).is_none());
        assert!(stochastic(&v, &v, &v[..14], 14, 1).is_none());
    }
}
