use serde::{Deserialize, Serialize};

use crate::models::{CandleSeries, GapKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fvg {
    #[serde(rename = "type")]
    pub kind: GapKind,
    pub top: f64,
    pub bottom: f64,
}

/// Detect all fair value gaps in the recent candle history, newest first.
///
/// A bullish FVG exists at candle i when the high of i-1 sits below the
/// low of i+1; bearish when the low of i-1 sits above the high of i+1.
pub fn detect_all_fvgs(candles: &CandleSeries, lookback: usize) -> Vec<Fvg> {
    let len = candles.len();
    if len < 3 {
        return Vec::new();
    }

    let mut fvgs = Vec::new();
    let stop = len.saturating_sub(lookback).max(1);

    let mut i = len - 2;
    while i >= stop {
        let prev = &candles[i - 1];
        let next = &candles[i + 1];

        if prev.high < next.low {
            fvgs.push(Fvg {
                kind: GapKind::Bullish,
                top: next.low,
                bottom: prev.high,
            });
        }
        if prev.low > next.high {
            fvgs.push(Fvg {
                kind: GapKind::Bearish,
                top: prev.low,
                bottom: next.high,
            });
        }

        i -= 1;
    }

    fvgs
}
