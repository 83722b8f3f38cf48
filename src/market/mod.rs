pub mod oanda;

pub use oanda::OandaClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{CandleSeries, Timeframe};

/// Order book snapshot: (price, liquidity) pairs, best levels first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceBook {
    pub bids: Vec<(f64, f64)>,
    pub asks: Vec<(f64, f64)>,
}

impl PriceBook {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|(p, _)| *p)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|(p, _)| *p)
    }

    /// Midpoint of best bid/ask.
    pub fn mid(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some((b + a) / 2.0),
            _ => None,
        }
    }
}

#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_candles(&mut self, tf: Timeframe, count: usize) -> Result<CandleSeries>;
    async fn fetch_pricing(&mut self) -> Result<PriceBook>;
    async fn current_price(&mut self) -> Result<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_book_best_and_mid() {
        let book = PriceBook {
            bids: vec![(190.10, 1_000_000.0), (190.08, 2_000_000.0)],
            asks: vec![(190.14, 1_000_000.0), (190.16, 500_000.0)],
        };
        assert_eq!(book.best_bid(), Some(190.10));
        assert_eq!(book.best_ask(), Some(190.14));
        assert!((book.mid().unwrap() - 190.12).abs() < 1e-9);
    }

    #[test]
    fn empty_book_has_no_mid() {
        let book = PriceBook::default();
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.mid(), None);
    }
}
