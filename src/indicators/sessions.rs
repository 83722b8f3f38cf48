use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

/// The three major forex sessions, UTC. Declaration order matters:
/// overlapping windows resolve to the first match (Tokyo before London,
/// London before New York).
const SESSIONS: &[(&str, (u32, u32), (u32, u32))] = &[
    ("Tokyo", (0, 0), (8, 0)),
    ("London", (7, 0), (15, 0)),
    ("New York", (12, 0), (21, 0)),
];

#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub name: Option<String>,
    pub opened_at: Option<DateTime<Utc>>,
    pub message: String,
    pub is_major: bool,
    pub minutes_since_open: Option<i64>,
}

impl SessionStatus {
    fn inactive() -> Self {
        Self {
            name: None,
            opened_at: None,
            message: "No major session active".to_string(),
            is_major: false,
            minutes_since_open: None,
        }
    }
}

/// Human-readable duration: "42s", "13m", "2h 13m".
pub fn format_duration(delta: Duration) -> String {
    let seconds = delta.num_seconds();
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    format!("{}h {}m", hours, minutes % 60)
}

/// Determine the currently active major session, if any.
pub fn active_or_recent(now_utc: DateTime<Utc>) -> SessionStatus {
    for &(name, (start_h, start_m), (end_h, end_m)) in SESSIONS {
        let mut start_dt = now_utc
            .with_hour(start_h)
            .and_then(|d| d.with_minute(start_m))
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(now_utc);

        let start_time = NaiveTime::from_hms_opt(start_h, start_m, 0).unwrap_or_default();
        if now_utc.time() < start_time {
            start_dt -= Duration::days(1);
        }

        let span_hours = (24 + i64::from(end_h) - i64::from(start_h)) % 24;
        let end_dt = start_dt + Duration::hours(span_hours) + Duration::minutes(i64::from(end_m));

        if start_dt <= now_utc && now_utc < end_dt {
            let since_open = now_utc - start_dt;
            let mins_since_open = since_open.num_minutes();
            let message = format!("{} session opened {} ago", name, format_duration(since_open));
            return SessionStatus {
                name: Some(name.to_string()),
                opened_at: Some(start_dt),
                message,
                is_major: true,
                minutes_since_open: Some(mins_since_open),
            };
        }
    }

    SessionStatus::inactive()
}
