use crate::models::CandleSeries;

/// Most recent swing high: a candle whose high strictly exceeds every
/// other high within `window` candles on both sides. Scans newest-first.
pub fn last_swing_high(candles: &CandleSeries, window: usize) -> Option<(f64, usize)> {
    let highs = candles.highs();
    scan_swings(&highs, window, |center, other| center > other)
}

/// Most recent swing low, symmetric to `last_swing_high`.
pub fn last_swing_low(candles: &CandleSeries, window: usize) -> Option<(f64, usize)> {
    let lows = candles.lows();
    scan_swings(&lows, window, |center, other| center < other)
}

fn scan_swings(
    values: &[f64],
    window: usize,
    is_extreme: fn(f64, f64) -> bool,
) -> Option<(f64, usize)> {
    let n = values.len();
    if n < window * 2 + 1 {
        return None;
    }

    for i in (window..=(n - window - 1)).rev() {
        let center = values[i];
        let mut qualifies = true;
        for j in (i - window)..=(i + window) {
            if j != i && !is_extreme(center, values[j]) {
                qualifies = false;
                break;
            }
        }
        if qualifies {
            return Some((center, i));
        }
    }

    None
}
