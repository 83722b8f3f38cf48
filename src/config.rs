use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedConfig = Arc<RwLock<Config>>;

#[derive(Debug, Clone)]
pub struct Config {
    // Instrument
    pub symbol: String,

    // OANDA
    pub oanda_account_id: String,
    pub oanda_key: String,
    pub oanda_env: String,

    // LLM
    pub xai_api_key: String,
    pub model_name: String,
    pub llm_base_url: String,
    pub temperature: f64,
    pub max_llm_retries: usize,

    // Prompt & news
    pub prompt_path: String,
    pub news_path: String,
    pub decision_timeframe: String,

    // Data
    pub candle_limit: usize,
    pub orb_minutes: i64,

    // Paper trading
    pub initial_balance: f64,
    pub max_daily_loss: f64,

    // Risk
    pub risk_per_trade: f64,
    pub min_risk_reward: f64,
    pub min_confidence: f64,
    pub max_stop_distance_pct: f64,
    pub max_price_drift_pct: f64,

    // Memory
    pub closed_trades_in_prompt: usize,
    pub max_memory_notes: usize,

    // Loop intervals (seconds)
    pub decision_interval: u64,
    pub position_check_interval: u64,

    // Logging & state
    pub data_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Config {
            symbol: env("SYMBOL", "GBP_JPY"),
            oanda_account_id: env("OANDA_ACCOUNT_ID", ""),
            oanda_key: env("OANDA_KEY", ""),
            oanda_env: env("OANDA_ENV", "practice"),
            xai_api_key: env("XAI_API_KEY", ""),
            model_name: env("MODEL_NAME", "grok-4-latest"),
            llm_base_url: env("LLM_BASE_URL", "https://api.x.ai"),
            temperature: env("LLM_TEMPERATURE", "0.7").parse().unwrap_or(0.7),
            max_llm_retries: env("MAX_LLM_RETRIES", "3").parse().unwrap_or(3),
            prompt_path: env("PROMPT_PATH", "prompt.json"),
            news_path: env("NEWS_PATH", "news.json"),
            decision_timeframe: env("DECISION_TIMEFRAME", "1h"),
            candle_limit: env("CANDLE_LIMIT", "100").parse().unwrap_or(100),
            orb_minutes: env("ORB_MINUTES", "15").parse().unwrap_or(15),
            initial_balance: env("INITIAL_BALANCE", "10000").parse().unwrap_or(10000.0),
            max_daily_loss: env("MAX_DAILY_LOSS", "0.03").parse().unwrap_or(0.03),
            risk_per_trade: env("RISK_PER_TRADE", "0.01").parse().unwrap_or(0.01),
            min_risk_reward: env("MIN_RISK_REWARD", "1.5").parse().unwrap_or(1.5),
            min_confidence: env("MIN_CONFIDENCE", "0.6").parse().unwrap_or(0.6),
            max_stop_distance_pct: env("MAX_STOP_DISTANCE_PCT", "0.02")
                .parse()
                .unwrap_or(0.02),
            max_price_drift_pct: env("MAX_PRICE_DRIFT_PCT", "0.005")
                .parse()
                .unwrap_or(0.005),
            closed_trades_in_prompt: env("CLOSED_TRADES_IN_PROMPT", "10").parse().unwrap_or(10),
            max_memory_notes: env("MAX_MEMORY_NOTES", "50").parse().unwrap_or(50),
            decision_interval: env("DECISION_INTERVAL", "3600").parse().unwrap_or(3600),
            position_check_interval: env("POSITION_CHECK_INTERVAL", "10")
                .parse()
                .unwrap_or(10),
            data_dir: env("DATA_DIR", "data"),
            log_level: env("LOG_LEVEL", "INFO"),
        }
    }

    /// OANDA REST base URL for the configured environment.
    pub fn oanda_url(&self) -> &'static str {
        if self.oanda_env == "practice" {
            "https://api-fxpractice.oanda.com/v3"
        } else {
            "https://api-fxtrade.oanda.com/v3"
        }
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn practice_env_selects_practice_url() {
        let mut cfg = Config::from_env();
        cfg.oanda_env = "practice".to_string();
        assert!(cfg.oanda_url().contains("fxpractice"));
        cfg.oanda_env = "live".to_string();
        assert!(cfg.oanda_url().contains("fxtrade"));
    }
}
