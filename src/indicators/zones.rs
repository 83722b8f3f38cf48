use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::indicators::fvg::{detect_all_fvgs, Fvg};
use crate::indicators::structure::{last_swing_high, last_swing_low};
use crate::market::MarketData;
use crate::models::{CandleSeries, Timeframe};

/// Timeframes aggregated for the prompt, highest first.
pub const ZONE_TIMEFRAMES: &[Timeframe] = &[Timeframe::H4, Timeframe::H1, Timeframe::M15];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrZones {
    pub local_high: f64,
    pub local_low: f64,
    pub swing_high: Option<f64>,
    pub swing_low: Option<f64>,
    pub last_close: f64,
    pub fvgs: Vec<Fvg>,
}

/// Key support/resistance and liquidity zones over the recent candles.
pub fn find_sr_zones(candles: &CandleSeries, lookback: usize, swing_window: usize) -> Option<SrZones> {
    let recent = candles.tail(lookback);
    let last = recent.last()?;

    Some(SrZones {
        local_high: recent.highs_max(),
        local_low: recent.lows_min(),
        swing_high: last_swing_high(&recent, swing_window).map(|(p, _)| p),
        swing_low: last_swing_low(&recent, swing_window).map(|(p, _)| p),
        last_close: last.close,
        fvgs: detect_all_fvgs(&recent, lookback),
    })
}

/// Aggregate S/R zones across the standard prompt timeframes.
pub async fn multi_timeframe_zones(
    market: &mut dyn MarketData,
    candle_limit: usize,
) -> Result<BTreeMap<String, SrZones>> {
    let mut results = BTreeMap::new();
    for &tf in ZONE_TIMEFRAMES {
        let candles = market.fetch_candles(tf, candle_limit).await?;
        if let Some(zones) = find_sr_zones(&candles, 50, 3) {
            results.insert(tf.as_str().to_string(), zones);
        }
    }
    Ok(results)
}
