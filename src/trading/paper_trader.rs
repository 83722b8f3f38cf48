use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::models::{Direction, PositionStatus};
use crate::trading::risk::VettedOrder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub direction: Direction,
    pub entry_price: f64,
    pub units: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_time: String,
    #[serde(default)]
    pub strategy: String,
    pub reason: String,
    #[serde(default)]
    pub confidence: f64,
    pub status: PositionStatus,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub pnl: f64,
}

/// Closed-trade summary fed back into the prompt as trading memory.
/// Field names match what the model is told to expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTradeSummary {
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit_loss: f64,
    pub entry_time: String,
    pub exit_time: String,
    pub ai_reason: String,
}

/// Paper trading engine. Holds at most one open position at a time;
/// the decision loop only prompts the model when flat.
pub struct PaperTrader {
    pub balance: f64,
    pub position: Option<Position>,
    pub trade_history: Vec<Position>,
    pub trade_counter: u64,
    pub daily_pnl: f64,
    pub daily_pnl_date: String,
    trades_file: String,
    /// When set, used instead of Utc::now() for timestamps (tests)
    pub sim_time: Option<DateTime<Utc>>,
}

impl PaperTrader {
    pub fn new(cfg: &Config) -> Self {
        let mut trader = Self {
            balance: cfg.initial_balance,
            position: None,
            trade_history: Vec::new(),
            trade_counter: 0,
            daily_pnl: 0.0,
            daily_pnl_date: String::new(),
            trades_file: format!("{}/paper_trades.json", cfg.data_dir),
            sim_time: None,
        };
        trader.load_state(cfg);
        trader
    }

    fn now(&self) -> DateTime<Utc> {
        self.sim_time.unwrap_or_else(Utc::now)
    }

    pub fn has_open_trade(&self) -> bool {
        self.position
            .as_ref()
            .map(|p| p.status == PositionStatus::Open)
            .unwrap_or(false)
    }

    pub fn can_open(&self, cfg: &Config) -> bool {
        if self.has_open_trade() {
            return false;
        }

        let today = self.now().format("%Y-%m-%d").to_string();
        if self.daily_pnl_date == today && self.daily_pnl <= -(cfg.max_daily_loss * self.balance)
        {
            return false;
        }

        true
    }

    pub fn open_trade(&mut self, order: &VettedOrder) -> Option<&Position> {
        if self.has_open_trade() {
            return None;
        }

        self.trade_counter += 1;
        let today = self.now().format("%Y-%m-%d").to_string();
        if self.daily_pnl_date != today {
            self.daily_pnl_date = today;
            self.daily_pnl = 0.0;
        }

        let pos = Position {
            id: self.trade_counter,
            direction: order.direction,
            entry_price: order.entry_price,
            units: order.units,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            entry_time: self.now().to_rfc3339(),
            strategy: order.strategy.clone(),
            reason: order.reason.clone(),
            confidence: order.confidence,
            status: PositionStatus::Open,
            exit_price: None,
            exit_time: None,
            pnl: 0.0,
        };

        self.position = Some(pos);
        self.save_state();
        self.position.as_ref()
    }

    /// Check the open position against the current price; SL fills at
    /// the stop price (simulating a stop order), TP at the current price.
    pub fn check_position(&mut self, current_price: f64) -> Option<Position> {
        let pos = self.position.as_ref()?;
        if pos.status != PositionStatus::Open {
            return None;
        }

        let hit_sl = match pos.direction {
            Direction::Long => current_price <= pos.stop_loss,
            Direction::Short => current_price >= pos.stop_loss,
        };
        if hit_sl {
            let fill = pos.stop_loss;
            return self.close_at(fill, PositionStatus::ClosedSl);
        }

        let hit_tp = match pos.direction {
            Direction::Long => current_price >= pos.take_profit,
            Direction::Short => current_price <= pos.take_profit,
        };
        if hit_tp {
            return self.close_at(current_price, PositionStatus::ClosedTp);
        }

        None
    }

    pub fn close_manual(&mut self, current_price: f64) -> Option<Position> {
        if !self.has_open_trade() {
            return None;
        }
        self.close_at(current_price, PositionStatus::ClosedManual)
    }

    fn close_at(&mut self, exit_price: f64, status: PositionStatus) -> Option<Position> {
        let now_str = self.now().to_rfc3339();
        let today = self.now().format("%Y-%m-%d").to_string();
        let pos = self.position.as_mut()?;

        let pnl = match pos.direction {
            Direction::Long => (exit_price - pos.entry_price) * pos.units,
            Direction::Short => (pos.entry_price - exit_price) * pos.units,
        };

        pos.exit_price = Some(exit_price);
        pos.exit_time = Some(now_str);
        pos.status = status;
        pos.pnl = round2(pnl);

        self.balance += pos.pnl;
        if self.daily_pnl_date != today {
            self.daily_pnl_date = today;
            self.daily_pnl = 0.0;
        }
        self.daily_pnl += pos.pnl;

        let closed = self.position.take();
        if let Some(ref p) = closed {
            self.trade_history.push(p.clone());
        }
        self.save_state();
        closed
    }

    /// The last n closed trades, newest first, shaped for prompt injection.
    pub fn last_closed_trades(&self, n: usize) -> Vec<ClosedTradeSummary> {
        self.trade_history
            .iter()
            .rev()
            .filter(|p| p.status.is_closed())
            .take(n)
            .map(|p| ClosedTradeSummary {
                direction: p.direction,
                entry_price: p.entry_price,
                exit_price: p.exit_price.unwrap_or(p.entry_price),
                profit_loss: p.pnl,
                entry_time: p.entry_time.clone(),
                exit_time: p.exit_time.clone().unwrap_or_default(),
                ai_reason: p.reason.clone(),
            })
            .collect()
    }

    pub fn get_stats(&self) -> TradingStats {
        if self.trade_history.is_empty() {
            return TradingStats {
                total_trades: 0,
                balance: round2(self.balance),
                win_rate: 0.0,
                total_pnl: 0.0,
                best_trade: 0.0,
                worst_trade: 0.0,
                open: self.has_open_trade(),
            };
        }

        let wins = self.trade_history.iter().filter(|t| t.pnl > 0.0).count();

        TradingStats {
            total_trades: self.trade_history.len(),
            balance: round2(self.balance),
            win_rate: round1(wins as f64 / self.trade_history.len() as f64 * 100.0),
            total_pnl: round2(self.trade_history.iter().map(|t| t.pnl).sum()),
            best_trade: round2(
                self.trade_history
                    .iter()
                    .map(|t| t.pnl)
                    .fold(f64::NEG_INFINITY, f64::max),
            ),
            worst_trade: round2(
                self.trade_history
                    .iter()
                    .map(|t| t.pnl)
                    .fold(f64::INFINITY, f64::min),
            ),
            open: self.has_open_trade(),
        }
    }

    fn save_state(&self) {
        if self.trades_file.is_empty() {
            return;
        }
        let _ = fs::create_dir_all(
            Path::new(&self.trades_file)
                .parent()
                .unwrap_or(Path::new("data")),
        );

        let state = serde_json::json!({
            "balance": self.balance,
            "trade_counter": self.trade_counter,
            "daily_pnl": self.daily_pnl,
            "daily_pnl_date": self.daily_pnl_date,
            "position": self.position,
            "trade_history": self.trade_history,
        });

        if let Ok(json) = serde_json::to_string_pretty(&state) {
            let _ = fs::write(&self.trades_file, json);
        }
    }

    fn load_state(&mut self, cfg: &Config) {
        if let Ok(content) = fs::read_to_string(&self.trades_file) {
            if let Ok(state) = serde_json::from_str::<serde_json::Value>(&content) {
                self.balance = state["balance"].as_f64().unwrap_or(cfg.initial_balance);
                self.trade_counter = state["trade_counter"].as_u64().unwrap_or(0);
                self.daily_pnl = state["daily_pnl"].as_f64().unwrap_or(0.0);
                self.daily_pnl_date = state["daily_pnl_date"]
                    .as_str()
                    .unwrap_or("")
                    .to_string();

                if let Ok(position) =
                    serde_json::from_value::<Option<Position>>(state["position"].clone())
                {
                    self.position = position;
                }
                if let Ok(history) =
                    serde_json::from_value::<Vec<Position>>(state["trade_history"].clone())
                {
                    self.trade_history = history;
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradingStats {
    pub total_trades: usize,
    pub balance: f64,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub open: bool,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
