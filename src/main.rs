use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use llm_forex_bot::bot::DecisionBot;
use llm_forex_bot::config::Config;
use llm_forex_bot::llm::GrokClient;
use llm_forex_bot::market::OandaClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let market = Box::new(OandaClient::new(&cfg));
    let llm = Box::new(GrokClient::new(&cfg));
    let shared_config = cfg.shared();

    let mut bot = DecisionBot::new(shared_config, market, llm).await?;
    bot.run().await?;

    Ok(())
}
