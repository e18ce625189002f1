//! Pure indicator functions over oldest-first series.
//!
//! Every indicator returns `None` when its window is not yet filled; callers
//! treat that as "cannot compute this cycle".

pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;
pub mod volatility;

pub use macd::{Macd, MacdIndicator};
pub use moving_average::{ema, ema_series, sma};
pub use rsi::RsiIndicator;
pub use stochastic::{stochastic, Stochastic};
pub use volatility::{atr, bollinger, Bollinger};

/// Fractional change of the last close against the close `lag` bars back.
/// Zero when the history is too short or the base is zero.
pub fn pct_change(closes: &[f64], lag: usize) -> f64 {
    let n = closes.len();
    if lag == 0 || n <= lag {
        return 0.0;
    }
    let base = closes[n - 1 - lag];
    if base == 0.0 {
        return 0.0;
    }
    (closes[n - 1] - base) / base
}
