use common::{Bar, BarSeries, Tick};

/// Not enough non-empty buckets to compute features. A precondition, not an
/// error: the cycle is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientBars {
    pub available: usize,
    pub required: usize,
}

impl std::fmt::Display for InsufficientBars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "insufficient data: {} bars, need {}",
            self.available, self.required
        )
    }
}

/// Resamples raw ticks into fixed-interval OHLC bars.
///
/// The bid is the trade price proxy. Buckets without ticks are dropped, never
/// forward-filled. The spread of the last tick of each bucket is kept next to
/// the bar for spread features.
#[derive(Debug, Clone)]
pub struct BarAggregator {
    interval_secs: i64,
    min_bars: usize,
}

impl BarAggregator {
    pub fn new(interval_secs: u64, min_bars: usize) -> Self {
        assert!(interval_secs > 0, "bar interval must be > 0");
        Self {
            interval_secs: interval_secs as i64,
            min_bars,
        }
    }

    /// Aggregate ticks in any order. Ticks with a non-finite timestamp, bid
    /// or volume are ignored.
    pub fn aggregate(&self, ticks: &[Tick]) -> Result<BarSeries, InsufficientBars> {
        let series = self.resample(ticks);
        if series.len() < self.min_bars {
            return Err(InsufficientBars {
                available: series.len(),
                required: self.min_bars,
            });
        }
        Ok(series)
    }

    /// Resample without the minimum-length check.
    pub fn resample(&self, ticks: &[Tick]) -> BarSeries {
        let mut sorted: Vec<&Tick> = ticks
            .iter()
            .filter(|t| t.timestamp.is_finite() && t.bid.is_finite() && t.volume.is_finite())
            .collect();
        // Stable: ticks sharing a timestamp keep their arrival order.
        sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let mut series = BarSeries::default();
        for tick in sorted {
            let bucket = self.bucket_of(tick.timestamp);
            let price = tick.bid;
            match series.bars.last_mut() {
                Some(bar) if bar.bucket_start == bucket => {
                    bar.high = bar.high.max(price);
                    bar.low = bar.low.min(price);
                    bar.close = price;
                    bar.volume += tick.volume;
                    if let Some(spread) = series.spreads.last_mut() {
                        *spread = tick.spread;
                    }
                }
                _ => {
                    series.bars.push(Bar {
                        bucket_start: bucket,
                        open: price,
                        high: price,
                        low: price,
                        close: price,
                        volume: tick.volume,
                    });
                    series.spreads.push(tick.spread);
                }
            }
        }
        series
    }

    fn bucket_of(&self, timestamp: f64) -> i64 {
        let secs = timestamp.floor() as i64;
        secs.div_euclid(self.interval_secs) * self.interval_secs
    }
}
