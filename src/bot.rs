use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::SharedConfig;
use crate::indicators::orb::session_orb_report;
use crate::indicators::sessions::active_or_recent;
use crate::indicators::zones::multi_timeframe_zones;
use crate::llm::{analyze, Action, LlmClient, PromptContext, PromptTemplate, TradeDecision};
use crate::market::MarketData;
use crate::models::Timeframe;
use crate::trading::{
    DecisionJournal, MemoryStore, NewsFeed, PaperTrader, RiskManager,
};

pub struct DecisionBot {
    config: SharedConfig,
    market: Box<dyn MarketData>,
    llm: Box<dyn LlmClient>,
    paper_trader: PaperTrader,
    prompt: PromptTemplate,
    memory: MemoryStore,
    news: NewsFeed,
    journal: DecisionJournal,
    risk: RiskManager,

    decision_timeframe: Timeframe,
    last_position_check: Instant,
    last_decision: Option<Instant>,
}

impl DecisionBot {
    pub async fn new(
        config: SharedConfig,
        market: Box<dyn MarketData>,
        llm: Box<dyn LlmClient>,
    ) -> Result<Self> {
        let cfg = config.read().await;

        info!("{}", "=".repeat(60));
        info!("LLM forex bot starting up (paper trading)");
        info!("Symbol: {}", cfg.symbol);
        info!("OANDA env: {}", cfg.oanda_env);
        info!("Model: {} @ {}", cfg.model_name, cfg.llm_base_url);
        info!(
            "Decision every {}s on {} candles, position check every {}s",
            cfg.decision_interval, cfg.decision_timeframe, cfg.position_check_interval
        );
        info!("{}", "=".repeat(60));

        let decision_timeframe = Timeframe::from_str_loose(&cfg.decision_timeframe)
            .with_context(|| format!("Unknown DECISION_TIMEFRAME: {}", cfg.decision_timeframe))?;
        let prompt = PromptTemplate::load(&cfg.prompt_path)?;
        let memory = MemoryStore::open(&cfg.data_dir, cfg.max_memory_notes)?;
        let news = NewsFeed::load(&cfg.news_path)?;
        let journal = DecisionJournal::open(&cfg.data_dir);
        let paper_trader = PaperTrader::new(&cfg);
        let risk = RiskManager::new(&cfg);

        drop(cfg);

        Ok(Self {
            config,
            market,
            llm,
            paper_trader,
            prompt,
            memory,
            news,
            journal,
            risk,
            decision_timeframe,
            last_position_check: Instant::now(),
            last_decision: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Bot is now running. Press Ctrl+C to stop.");
        self.print_status().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.shutdown().await;
                    return Ok(());
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&mut self) {
        let cfg = self.config.read().await.clone();

        if self.last_position_check.elapsed().as_secs() >= cfg.position_check_interval {
            self.check_position().await;
            self.last_position_check = Instant::now();
        }

        let decision_due = match self.last_decision {
            None => true,
            Some(last) => last.elapsed().as_secs() >= cfg.decision_interval,
        };
        if decision_due {
            if let Err(e) = self.decision_cycle().await {
                error!("Decision cycle failed: {:#}", e);
            }
            self.last_decision = Some(Instant::now());
        }

        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    }

    pub fn has_open_trade(&self) -> bool {
        self.paper_trader.has_open_trade()
    }

    pub async fn check_position(&mut self) {
        if !self.paper_trader.has_open_trade() {
            return;
        }

        let current_price = match self.market.current_price().await {
            Ok(p) => p,
            Err(e) => {
                error!("Position check error: {}", e);
                return;
            }
        };

        if let Some(closed) = self.paper_trader.check_position(current_price) {
            let result = if closed.pnl > 0.0 { "WIN" } else { "LOSS" };
            info!(
                "Position #{} CLOSED {} ({}): PnL {:+.2} | {} -> {}",
                closed.id,
                closed.status,
                result,
                closed.pnl,
                closed.entry_price,
                closed.exit_price.unwrap_or(0.0),
            );
            info!("Balance: {:.2}", self.paper_trader.balance);
        }
    }

    /// One full decision pass: skipped while a trade is open, otherwise
    /// gather context, prompt the model, vet and apply the decision.
    pub async fn decision_cycle(&mut self) -> Result<()> {
        let cfg = self.config.read().await.clone();

        if self.paper_trader.has_open_trade() {
            info!("Trade already open. Skipping new AI prompt.");
            return Ok(());
        }

        if !self.paper_trader.can_open(&cfg) {
            warn!(
                "Daily loss limit reached ({:+.2} today). No new trades until tomorrow.",
                self.paper_trader.daily_pnl
            );
            return Ok(());
        }

        let now = Utc::now();
        let book = self.market.fetch_pricing().await?;
        let current_price = match book.mid() {
            Some(p) => p,
            None => self.market.current_price().await?,
        };

        let session = active_or_recent(now);
        let session_candles = self
            .market
            .fetch_candles(Timeframe::M15, cfg.candle_limit)
            .await?;
        let orb_lines = session_orb_report(&session_candles, Timeframe::M15, &session, cfg.orb_minutes);
        for line in &orb_lines {
            info!("{}", line);
        }

        let zones = multi_timeframe_zones(self.market.as_mut(), cfg.candle_limit).await?;

        let ctx = PromptContext {
            current_trade_json: "null".to_string(),
            last_closed_trades_json: serde_json::to_string(
                &self.paper_trader.last_closed_trades(cfg.closed_trades_in_prompt),
            )?,
            timeframe: self.decision_timeframe.as_str().to_string(),
            todays_news: self.news.render_today(now),
            current_price: format!("{:.3}", current_price),
            zones: serde_json::to_string(&zones)?,
            session_info: orb_lines.join("\n"),
            bid: book
                .best_bid()
                .map(|p| format!("{:.3}", p))
                .unwrap_or_else(|| "n/a".to_string()),
            ask: book
                .best_ask()
                .map(|p| format!("{:.3}", p))
                .unwrap_or_else(|| "n/a".to_string()),
            memories: self.memory.render(),
        };

        let rendered = self.prompt.render(&ctx)?;
        let decision = analyze(self.llm.as_ref(), &rendered, cfg.max_llm_retries).await?;

        if let Err(e) = self.journal.record(&decision) {
            warn!("Failed to record decision: {}", e);
        }
        if let Some(ref note) = decision.save_memory {
            if let Err(e) = self.memory.remember(note.clone()) {
                warn!("Failed to save memory note: {}", e);
            }
        }

        self.act_on(&decision, current_price);
        Ok(())
    }

    fn act_on(&mut self, decision: &TradeDecision, current_price: f64) {
        match decision.action {
            Action::Hold => {
                info!(
                    "Decision: HOLD: {}",
                    decision.reason.as_deref().unwrap_or("no reason given")
                );
            }
            Action::Close => {
                // Flat by construction: the model is only prompted when no
                // trade is open, so a close decision has nothing to act on.
                warn!(
                    "Decision: CLOSE with no open position, ignored ({})",
                    decision.reason.as_deref().unwrap_or("no reason given")
                );
            }
            Action::Open => match self.risk.vet(decision, current_price, self.paper_trader.balance)
            {
                Ok(order) => {
                    if let Some(pos) = self.paper_trader.open_trade(&order) {
                        info!("{}", "=".repeat(60));
                        info!("Position #{} opened: {} {:.1} units", pos.id, pos.direction, pos.units);
                        info!("  Entry: {:.3}", pos.entry_price);
                        info!("  Stop Loss: {:.3}", pos.stop_loss);
                        info!("  Take Profit: {:.3} (R:R {:.2})", pos.take_profit, order.risk_reward);
                        info!("  Confidence: {:.0}%", pos.confidence * 100.0);
                        info!("  {}", pos.reason);
                        info!("{}", "=".repeat(60));
                    }
                }
                Err(rejection) => {
                    warn!("Decision: OPEN rejected by risk checks: {}", rejection);
                }
            },
        }
    }

    async fn print_status(&mut self) {
        let stats = self.paper_trader.get_stats();
        let session = active_or_recent(Utc::now());

        info!("Session: {}", session.message);
        info!("Balance: {:.2}", stats.balance);
        info!(
            "Trades: {} | Win Rate: {}% | PnL: {:+.2}",
            stats.total_trades, stats.win_rate, stats.total_pnl
        );
        info!("Open position: {}", if stats.open { "yes" } else { "no" });
        info!("Memory notes: {}", self.memory.len());
    }

    async fn shutdown(&mut self) {
        info!("Shutting down...");
        self.print_status().await;
        info!("Bot stopped.");
    }
}
