use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::market::{MarketData, PriceBook};
use crate::models::{Candle, CandleSeries, Timeframe};

const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct CandleResponse {
    candles: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    time: String,
    volume: f64,
    mid: RawMid,
    #[serde(default)]
    complete: bool,
}

#[derive(Debug, Deserialize)]
struct RawMid {
    o: String,
    h: String,
    l: String,
    c: String,
}

#[derive(Debug, Deserialize)]
struct PricingResponse {
    prices: Vec<RawPrice>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    #[serde(default)]
    bids: Vec<RawQuote>,
    #[serde(default)]
    asks: Vec<RawQuote>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    price: String,
    liquidity: f64,
}

pub struct OandaClient {
    client: Client,
    base_url: String,
    account_id: String,
    api_key: String,
    symbol: String,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, CandleSeries)>,
    cache_ttl: Duration,
}

impl OandaClient {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: cfg.oanda_url().to_string(),
            account_id: cfg.oanda_account_id.clone(),
            api_key: cfg.oanda_key.clone(),
            symbol: cfg.symbol.clone(),
            last_request: None,
            cache: HashMap::new(),
            cache_ttl: Duration::from_secs(5),
        }
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    pub async fn fetch_candles(
        &mut self,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandleSeries> {
        let cache_key = format!("{}_{}_{}", self.symbol, timeframe, count);
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < self.cache_ttl {
                return Ok(series.clone());
            }
        }

        self.rate_limit().await;

        let url = format!(
            "{}/instruments/{}/candles",
            self.base_url, self.symbol
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("count", count.to_string()),
                ("granularity", timeframe.oanda_granularity().to_string()),
                ("price", "M".to_string()),
            ])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .context("Failed to fetch OANDA candles")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OANDA candles error {}: {}", status, body);
        }

        let data: CandleResponse = resp
            .json()
            .await
            .context("Failed to parse candle response")?;

        let mut candles: Vec<Candle> = data
            .candles
            .into_iter()
            .filter(|rc| rc.complete)
            .filter_map(|rc| {
                let timestamp = DateTime::parse_from_rfc3339(&rc.time)
                    .ok()?
                    .to_utc();
                Some(Candle {
                    timestamp,
                    open: rc.mid.o.parse().ok()?,
                    high: rc.mid.h.parse().ok()?,
                    low: rc.mid.l.parse().ok()?,
                    close: rc.mid.c.parse().ok()?,
                    volume: rc.volume,
                })
            })
            .collect();

        candles.sort_by_key(|c| c.timestamp);

        let series = CandleSeries::new(candles);
        self.cache
            .insert(cache_key, (Instant::now(), series.clone()));

        Ok(series)
    }

    pub async fn fetch_pricing(&mut self) -> Result<PriceBook> {
        self.rate_limit().await;

        let url = format!("{}/accounts/{}/pricing", self.base_url, self.account_id);

        let resp = self
            .client
            .get(&url)
            .query(&[("instruments", self.symbol.as_str())])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .context("Failed to fetch OANDA pricing")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OANDA pricing error {}: {}", status, body);
        }

        let data: PricingResponse = resp
            .json()
            .await
            .context("Failed to parse pricing response")?;

        let price = data
            .prices
            .into_iter()
            .next()
            .context("No prices in OANDA pricing response")?;

        let parse_quotes = |quotes: Vec<RawQuote>| -> Vec<(f64, f64)> {
            quotes
                .into_iter()
                .filter_map(|q| Some((q.price.parse().ok()?, q.liquidity)))
                .collect()
        };

        Ok(PriceBook {
            bids: parse_quotes(price.bids),
            asks: parse_quotes(price.asks),
        })
    }

    pub async fn current_price(&mut self) -> Result<f64> {
        let book = self.fetch_pricing().await?;
        book.mid().context("No bid/ask in OANDA pricing response")
    }
}

#[async_trait]
impl MarketData for OandaClient {
    async fn fetch_candles(&mut self, tf: Timeframe, count: usize) -> Result<CandleSeries> {
        self.fetch_candles(tf, count).await
    }

    async fn fetch_pricing(&mut self) -> Result<PriceBook> {
        self.fetch_pricing().await
    }

    async fn current_price(&mut self) -> Result<f64> {
        self.current_price().await
    }
}
