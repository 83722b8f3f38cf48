use chrono::Duration;

use crate::indicators::sessions::SessionStatus;
use crate::models::{CandleSeries, Timeframe};

/// Minutes after the session open during which chop/fakeout risk is flagged.
const EARLY_SESSION_MINUTES: i64 = 30;

/// Opening-range-breakout report for the current session, as prompt lines.
///
/// `candles` should span at least the current session; only candles at or
/// after the session open are considered.
pub fn session_orb_report(
    candles: &CandleSeries,
    tf: Timeframe,
    status: &SessionStatus,
    orb_minutes: i64,
) -> Vec<String> {
    let mut messages = Vec::new();

    messages.push(format!(
        "[{}] {}",
        status.name.as_deref().unwrap_or("N/A"),
        status.message
    ));

    let session_open = match status.opened_at {
        Some(dt) if status.is_major => dt,
        _ => return messages,
    };

    if let Some(mins) = status.minutes_since_open {
        if mins < EARLY_SESSION_MINUTES {
            messages.push(format!(
                "Caution: First {}m of {}. High risk of chop/fakeout.",
                mins,
                status.name.as_deref().unwrap_or("session")
            ));
        }
    }

    let session_candles = candles.since(session_open);
    if session_candles.is_empty() {
        messages.push(format!("No {} candles found since session open.", tf));
        return messages;
    }

    let orb_end = session_open + Duration::minutes(orb_minutes);
    let orb_candles = session_candles.before(orb_end);
    if orb_candles.is_empty() {
        messages.push(format!(
            "No candles found within the {}-min ORB window.",
            orb_minutes
        ));
        return messages;
    }

    let orb_high = orb_candles.highs_max();
    let orb_low = orb_candles.lows_min();
    messages.push(format!("ORB High={}, Low={}", orb_high, orb_low));

    let after_orb = session_candles.since(orb_end);
    if let Some(first) = after_orb.first() {
        if first.high > orb_high {
            messages.push(format!("Breakout UP occurred at {}.", first.timestamp));
        } else if first.low < orb_low {
            messages.push(format!("Breakout DOWN occurred at {}.", first.timestamp));
        }
    }

    messages
}
