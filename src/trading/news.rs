use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// A manually curated news item from `news.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// What the prompt actually sees for each item.
#[derive(Debug, Clone, Serialize)]
pub struct NewsForPrompt {
    pub title: String,
    pub sentiment: Option<String>,
    pub hours_ago: f64,
}

/// Loads curated news from a JSON file and filters it to the current
/// UTC day. A missing file just means no news.
pub struct NewsFeed {
    items: Vec<NewsItem>,
}

impl NewsFeed {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let items = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("News file {} is not valid JSON", path.display()))?,
            Err(_) => {
                warn!("No news file at {}; continuing without news", path.display());
                Vec::new()
            }
        };
        Ok(Self { items })
    }

    pub fn from_items(items: Vec<NewsItem>) -> Self {
        Self { items }
    }

    /// Items dated today (UTC), with recency rounded to one decimal hour.
    pub fn todays_items(&self, now: DateTime<Utc>) -> Vec<NewsForPrompt> {
        self.items
            .iter()
            .filter(|item| {
                item.date.year() == now.year() && item.date.ordinal() == now.ordinal()
            })
            .map(|item| NewsForPrompt {
                title: item.title.clone(),
                sentiment: item.sentiment.clone(),
                hours_ago: round1((now - item.date).num_minutes() as f64 / 60.0),
            })
            .collect()
    }

    /// JSON array for the `{todays_news}` placeholder.
    pub fn render_today(&self, now: DateTime<Utc>) -> String {
        serde_json::to_string(&self.todays_items(now)).unwrap_or_else(|_| "[]".to_string())
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
