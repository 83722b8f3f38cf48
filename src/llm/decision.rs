use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::Direction;

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("malformed JSON: {0}")]
    Malformed(String),
    #[error("schema violation: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Open,
    Hold,
    Close,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Open => write!(f, "open"),
            Action::Hold => write!(f, "hold"),
            Action::Close => write!(f, "close"),
        }
    }
}

/// Canonical trade decision returned by the model.
///
/// `side`, `price`, `stop_loss` and `take_profit` are required when
/// `action` is `open`; the rest are advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDecision {
    pub action: Action,
    #[serde(default)]
    pub side: Option<Direction>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub risk_reward: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub save_memory: Option<String>,
}

/// Parse raw model output into a validated decision.
///
/// Pipeline: trim, strip markdown fences, parse; if that fails, extract
/// the first balanced `{...}` block and parse again (models sometimes
/// wrap the JSON in prose despite the system prompt).
pub fn parse_decision(content: &str) -> Result<TradeDecision, DecisionError> {
    let cleaned = strip_fences(content.trim());

    let decision: TradeDecision = match serde_json::from_str(cleaned) {
        Ok(d) => d,
        Err(first_err) => {
            let block = extract_json_block(cleaned)
                .ok_or_else(|| DecisionError::Malformed(first_err.to_string()))?;
            serde_json::from_str(block).map_err(|e| DecisionError::Malformed(e.to_string()))?
        }
    };

    validate(&decision)?;
    Ok(decision)
}

fn strip_fences(s: &str) -> &str {
    let s = s.trim();
    for prefix in ["```json", "```"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            let rest = rest.strip_suffix("```").unwrap_or(rest);
            return rest.trim();
        }
    }
    s
}

/// First balanced top-level `{...}` block, string-literal aware.
fn extract_json_block(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate(d: &TradeDecision) -> Result<(), DecisionError> {
    if let Some(c) = d.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(DecisionError::Schema(format!(
                "confidence {} outside 0..=1",
                c
            )));
        }
    }

    if d.action != Action::Open {
        return Ok(());
    }

    let side = d
        .side
        .ok_or_else(|| DecisionError::Schema("open decision missing side".to_string()))?;
    let price = d
        .price
        .ok_or_else(|| DecisionError::Schema("open decision missing price".to_string()))?;
    let sl = d
        .stop_loss
        .ok_or_else(|| DecisionError::Schema("open decision missing stop_loss".to_string()))?;
    let tp = d
        .take_profit
        .ok_or_else(|| DecisionError::Schema("open decision missing take_profit".to_string()))?;

    let levels_ok = match side {
        Direction::Long => sl < price && price < tp,
        Direction::Short => tp < price && price < sl,
    };
    if !levels_ok {
        return Err(DecisionError::Schema(format!(
            "levels inconsistent for {}: sl={} price={} tp={}",
            side, sl, price, tp
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN_LONG: &str = r#"{
        "action": "open",
        "side": "long",
        "price": 190.25,
        "stop_loss": 189.80,
        "take_profit": 191.20,
        "risk_reward": 2.1,
        "confidence": 0.72,
        "strategy": "ORB breakout continuation",
        "reason": "London breakout above ORB high with 1h bullish FVG support",
        "save_memory": null
    }"#;

    #[test]
    fn parses_plain_json() {
        let d = parse_decision(OPEN_LONG).unwrap();
        assert_eq!(d.action, Action::Open);
        assert_eq!(d.side, Some(Direction::Long));
        assert!((d.price.unwrap() - 190.25).abs() < 1e-9);
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{}\n```", OPEN_LONG);
        let d = parse_decision(&fenced).unwrap();
        assert_eq!(d.action, Action::Open);

        let fenced_bare = format!("```\n{}\n```", OPEN_LONG);
        assert!(parse_decision(&fenced_bare).is_ok());
    }

    #[test]
    fn repairs_prose_wrapped_json() {
        let wrapped = format!(
            "Here is my analysis of the market:\n{}\nLet me know if you need more.",
            OPEN_LONG
        );
        let d = parse_decision(&wrapped).unwrap();
        assert_eq!(d.action, Action::Open);
    }

    #[test]
    fn hold_without_levels_is_valid() {
        let d = parse_decision(r#"{"action": "hold", "reason": "no setup"}"#).unwrap();
        assert_eq!(d.action, Action::Hold);
        assert!(d.side.is_none());
    }

    #[test]
    fn malformed_json_is_typed_error() {
        let err = parse_decision("not json at all").unwrap_err();
        assert!(matches!(err, DecisionError::Malformed(_)));
    }

    #[test]
    fn truncated_json_is_malformed() {
        let err = parse_decision(r#"{"action": "open", "side":"#).unwrap_err();
        assert!(matches!(err, DecisionError::Malformed(_)));
    }

    #[test]
    fn open_without_side_rejected() {
        let err =
            parse_decision(r#"{"action": "open", "price": 190.0, "stop_loss": 189.5, "take_profit": 191.0}"#)
                .unwrap_err();
        assert!(matches!(err, DecisionError::Schema(_)));
    }

    #[test]
    fn stop_on_wrong_side_rejected() {
        let bad = r#"{
            "action": "open", "side": "long",
            "price": 190.0, "stop_loss": 190.5, "take_profit": 191.0
        }"#;
        let err = parse_decision(bad).unwrap_err();
        assert!(matches!(err, DecisionError::Schema(_)));
    }

    #[test]
    fn short_levels_validated() {
        let good = r#"{
            "action": "open", "side": "short",
            "price": 190.0, "stop_loss": 190.5, "take_profit": 189.0
        }"#;
        assert!(parse_decision(good).is_ok());

        let bad = r#"{
            "action": "open", "side": "short",
            "price": 190.0, "stop_loss": 189.5, "take_profit": 189.0
        }"#;
        assert!(parse_decision(bad).is_err());
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        let bad = r#"{"action": "hold", "confidence": 1.4}"#;
        let err = parse_decision(bad).unwrap_err();
        assert!(matches!(err, DecisionError::Schema(_)));
    }

    #[test]
    fn extract_block_ignores_braces_in_strings() {
        let tricky = r#"noise {"action": "hold", "reason": "watch {ORB} zone"} trailing"#;
        let d = parse_decision(tricky).unwrap();
        assert_eq!(d.reason.as_deref(), Some("watch {ORB} zone"));
    }
}
