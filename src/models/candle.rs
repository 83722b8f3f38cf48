use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn total_range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Wraps Vec<Candle> with the handful of series operations the
/// indicator layer needs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn tail(&self, n: usize) -> CandleSeries {
        let start = self.candles.len().saturating_sub(n);
        CandleSeries::new(self.candles[start..].to_vec())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn highs_max(&self) -> f64 {
        self.candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn lows_min(&self) -> f64 {
        self.candles
            .iter()
            .map(|c| c.low)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    /// Get candles at or after a given timestamp
    pub fn since(&self, ts: DateTime<Utc>) -> CandleSeries {
        let candles: Vec<Candle> = self
            .candles
            .iter()
            .filter(|c| c.timestamp >= ts)
            .cloned()
            .collect();
        CandleSeries::new(candles)
    }

    /// Get candles strictly before a given timestamp
    pub fn before(&self, ts: DateTime<Utc>) -> CandleSeries {
        let candles: Vec<Candle> = self
            .candles
            .iter()
            .filter(|c| c.timestamp < ts)
            .cloned()
            .collect();
        CandleSeries::new(candles)
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl IntoIterator for CandleSeries {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_candles;

    fn bullish_candle() -> Candle {
        Candle {
            timestamp: Utc::now(),
            open: 190.0,
            high: 191.5,
            low: 189.5,
            close: 191.0,
            volume: 50.0,
        }
    }

    #[test]
    fn candle_body_and_range() {
        let c = bullish_candle();
        assert!((c.body() - 1.0).abs() < 1e-9);
        assert!((c.total_range() - 2.0).abs() < 1e-9);
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
    }

    #[test]
    fn series_len_tail() {
        let s = make_candles(&[
            (190.0, 190.5, 189.5, 190.2),
            (190.2, 190.8, 190.0, 190.6),
            (190.6, 191.2, 190.4, 191.0),
        ]);
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());

        let tail = s.tail(2);
        assert_eq!(tail.len(), 2);
        assert!((tail[0].open - 190.2).abs() < 1e-9);
    }

    #[test]
    fn series_highs_max_lows_min() {
        let s = make_candles(&[
            (190.0, 192.0, 188.5, 191.0),
            (191.0, 193.0, 189.8, 192.5),
            (192.5, 192.8, 188.0, 192.7),
        ]);
        assert!((s.highs_max() - 193.0).abs() < 1e-9);
        assert!((s.lows_min() - 188.0).abs() < 1e-9);
    }

    #[test]
    fn series_since_and_before_split() {
        let s = make_candles(&[
            (190.0, 190.5, 189.5, 190.2),
            (190.2, 190.8, 190.0, 190.6),
            (190.6, 191.2, 190.4, 191.0),
            (191.0, 191.4, 190.8, 191.2),
        ]);
        // make_candles spaces candles 1 minute apart
        let cut = s[2].timestamp;
        let after = s.since(cut);
        let prior = s.before(cut);
        assert_eq!(after.len(), 2);
        assert_eq!(prior.len(), 2);
        assert!((after[0].open - 190.6).abs() < 1e-9);
    }
}
