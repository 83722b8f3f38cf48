//! Shared builders for unit and integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::config::Config;
use crate::models::{Candle, CandleSeries};

/// Build a series from (open, high, low, close) tuples, spaced one
/// minute apart starting at 2024-01-15 12:00 UTC.
pub fn make_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
    make_candles_every(start, 1, data)
}

/// Build a series with a custom start time and candle spacing in minutes.
pub fn make_candles_every(
    start: DateTime<Utc>,
    minutes: i64,
    data: &[(f64, f64, f64, f64)],
) -> CandleSeries {
    let candles = data
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            timestamp: start + Duration::minutes(minutes * i as i64),
            open,
            high,
            low,
            close,
            volume: 100.0,
        })
        .collect();
    CandleSeries::new(candles)
}

/// A config with no credentials and the default risk numbers; tests
/// that touch the filesystem should point data_dir at a temp dir.
pub fn default_test_config() -> Config {
    Config {
        symbol: "GBP_JPY".to_string(),
        oanda_account_id: String::new(),
        oanda_key: String::new(),
        oanda_env: "practice".to_string(),
        xai_api_key: String::new(),
        model_name: "grok-4-latest".to_string(),
        llm_base_url: "https://api.x.ai".to_string(),
        temperature: 0.7,
        max_llm_retries: 3,
        prompt_path: "prompt.json".to_string(),
        news_path: "news.json".to_string(),
        decision_timeframe: "1h".to_string(),
        candle_limit: 100,
        orb_minutes: 15,
        initial_balance: 10_000.0,
        max_daily_loss: 0.03,
        risk_per_trade: 0.01,
        min_risk_reward: 1.5,
        min_confidence: 0.6,
        max_stop_distance_pct: 0.02,
        max_price_drift_pct: 0.005,
        closed_trades_in_prompt: 10,
        max_memory_notes: 50,
        decision_interval: 3600,
        position_check_interval: 10,
        data_dir: std::env::temp_dir()
            .join("llm-forex-bot-tests")
            .to_string_lossy()
            .to_string(),
        log_level: "INFO".to_string(),
    }
}
