use thiserror::Error;

use crate::config::Config;
use crate::llm::{Action, TradeDecision};
use crate::models::Direction;

#[derive(Debug, Error, PartialEq)]
pub enum RiskRejection {
    #[error("decision is not an open action")]
    NotAnOpen,
    #[error("open decision missing side")]
    MissingSide,
    #[error("open decision missing price levels")]
    MissingLevels,
    #[error("stop loss on wrong side of entry for {side}: sl={stop_loss} entry={entry}")]
    StopOnWrongSide {
        side: Direction,
        stop_loss: f64,
        entry: f64,
    },
    #[error("take profit on wrong side of entry for {side}: tp={take_profit} entry={entry}")]
    TargetOnWrongSide {
        side: Direction,
        take_profit: f64,
        entry: f64,
    },
    #[error("risk:reward {got:.2} below minimum {min:.2}")]
    RiskRewardTooLow { got: f64, min: f64 },
    #[error("confidence {got:.2} below minimum {min:.2}")]
    ConfidenceTooLow { got: f64, min: f64 },
    #[error("stop distance {got_pct:.4}% of price exceeds cap {max_pct:.4}%")]
    StopTooWide { got_pct: f64, max_pct: f64 },
    #[error("requested entry {entry} drifted {drift_pct:.4}% from market {market}")]
    PriceDrift {
        entry: f64,
        market: f64,
        drift_pct: f64,
    },
}

/// An open decision that passed every risk check, sized and ready to fill.
#[derive(Debug, Clone)]
pub struct VettedOrder {
    pub direction: Direction,
    pub entry_price: f64,
    pub units: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: f64,
    pub confidence: f64,
    pub strategy: String,
    pub reason: String,
}

/// Enforces the risk policy on model decisions. The model proposes,
/// this layer disposes: SL/TP geometry, risk:reward floor, confidence
/// floor, stop-distance cap, entry drift cap, and position sizing.
pub struct RiskManager {
    risk_per_trade: f64,
    min_risk_reward: f64,
    min_confidence: f64,
    max_stop_distance_pct: f64,
    max_price_drift_pct: f64,
}

impl RiskManager {
    pub fn new(cfg: &Config) -> Self {
        Self {
            risk_per_trade: cfg.risk_per_trade,
            min_risk_reward: cfg.min_risk_reward,
            min_confidence: cfg.min_confidence,
            max_stop_distance_pct: cfg.max_stop_distance_pct,
            max_price_drift_pct: cfg.max_price_drift_pct,
        }
    }

    pub fn vet(
        &self,
        decision: &TradeDecision,
        market_price: f64,
        balance: f64,
    ) -> Result<VettedOrder, RiskRejection> {
        if decision.action != Action::Open {
            return Err(RiskRejection::NotAnOpen);
        }

        let side = decision.side.ok_or(RiskRejection::MissingSide)?;
        let (entry, sl, tp) = match (decision.price, decision.stop_loss, decision.take_profit) {
            (Some(p), Some(s), Some(t)) => (p, s, t),
            _ => return Err(RiskRejection::MissingLevels),
        };

        let stop_ok = match side {
            Direction::Long => sl < entry,
            Direction::Short => sl > entry,
        };
        if !stop_ok {
            return Err(RiskRejection::StopOnWrongSide {
                side,
                stop_loss: sl,
                entry,
            });
        }

        let target_ok = match side {
            Direction::Long => tp > entry,
            Direction::Short => tp < entry,
        };
        if !target_ok {
            return Err(RiskRejection::TargetOnWrongSide {
                side,
                take_profit: tp,
                entry,
            });
        }

        // Computed here rather than trusted from the model.
        let stop_distance = (entry - sl).abs();
        let risk_reward = (tp - entry).abs() / stop_distance;
        if risk_reward < self.min_risk_reward {
            return Err(RiskRejection::RiskRewardTooLow {
                got: risk_reward,
                min: self.min_risk_reward,
            });
        }

        let confidence = decision.confidence.unwrap_or(0.0);
        if confidence < self.min_confidence {
            return Err(RiskRejection::ConfidenceTooLow {
                got: confidence,
                min: self.min_confidence,
            });
        }

        let stop_pct = stop_distance / entry;
        if stop_pct > self.max_stop_distance_pct {
            return Err(RiskRejection::StopTooWide {
                got_pct: stop_pct * 100.0,
                max_pct: self.max_stop_distance_pct * 100.0,
            });
        }

        let drift_pct = (entry - market_price).abs() / market_price;
        if drift_pct > self.max_price_drift_pct {
            return Err(RiskRejection::PriceDrift {
                entry,
                market: market_price,
                drift_pct: drift_pct * 100.0,
            });
        }

        let units = (balance * self.risk_per_trade) / stop_distance;

        Ok(VettedOrder {
            direction: side,
            entry_price: entry,
            units,
            stop_loss: sl,
            take_profit: tp,
            risk_reward,
            confidence,
            strategy: decision.strategy.clone().unwrap_or_default(),
            reason: decision.reason.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::default_test_config;

    fn open_decision() -> TradeDecision {
        TradeDecision {
            action: Action::Open,
            side: Some(Direction::Long),
            price: Some(190.00),
            stop_loss: Some(189.50),
            take_profit: Some(191.00),
            risk_reward: Some(2.0),
            confidence: Some(0.75),
            strategy: Some("ORB continuation".to_string()),
            reason: Some("breakout".to_string()),
            save_memory: None,
        }
    }

    fn manager() -> RiskManager {
        RiskManager::new(&default_test_config())
    }

    #[test]
    fn vets_and_sizes_valid_long() {
        let order = manager().vet(&open_decision(), 190.00, 10_000.0).unwrap();
        assert_eq!(order.direction, Direction::Long);
        // 1% of 10k = 100 risked over a 0.5 stop distance = 200 units
        assert!((order.units - 200.0).abs() < 1e-9);
        assert!((order.risk_reward - 2.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_hold_action() {
        let mut d = open_decision();
        d.action = Action::Hold;
        assert_eq!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::NotAnOpen
        );
    }

    #[test]
    fn rejects_missing_levels() {
        let mut d = open_decision();
        d.take_profit = None;
        assert_eq!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::MissingLevels
        );
    }

    #[test]
    fn rejects_stop_above_long_entry() {
        let mut d = open_decision();
        d.stop_loss = Some(190.50);
        d.take_profit = Some(192.0);
        assert!(matches!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::StopOnWrongSide { .. }
        ));
    }

    #[test]
    fn rejects_low_risk_reward() {
        let mut d = open_decision();
        d.take_profit = Some(190.25); // rr = 0.5
        assert!(matches!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::RiskRewardTooLow { .. }
        ));
    }

    #[test]
    fn rejects_low_confidence() {
        let mut d = open_decision();
        d.confidence = Some(0.3);
        assert!(matches!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::ConfidenceTooLow { .. }
        ));
    }

    #[test]
    fn missing_confidence_treated_as_zero() {
        let mut d = open_decision();
        d.confidence = None;
        assert!(matches!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::ConfidenceTooLow { .. }
        ));
    }

    #[test]
    fn rejects_oversized_stop() {
        let mut d = open_decision();
        d.stop_loss = Some(180.0); // >2% away
        d.take_profit = Some(210.0);
        assert!(matches!(
            manager().vet(&d, 190.0, 10_000.0).unwrap_err(),
            RiskRejection::StopTooWide { .. }
        ));
    }

    #[test]
    fn rejects_stale_entry_price() {
        // Decision priced at 190 but market has moved to 193
        assert!(matches!(
            manager().vet(&open_decision(), 193.0, 10_000.0).unwrap_err(),
            RiskRejection::PriceDrift { .. }
        ));
    }

    #[test]
    fn vets_valid_short() {
        let d = TradeDecision {
            action: Action::Open,
            side: Some(Direction::Short),
            price: Some(190.00),
            stop_loss: Some(190.40),
            take_profit: Some(189.00),
            risk_reward: None,
            confidence: Some(0.8),
            strategy: None,
            reason: None,
            save_memory: None,
        };
        let order = manager().vet(&d, 190.0, 10_000.0).unwrap();
        assert_eq!(order.direction, Direction::Short);
        assert!(order.risk_reward > 2.0);
    }
}
