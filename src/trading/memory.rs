use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A note the model asked to remember across decision cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub time: DateTime<Utc>,
    pub note: String,
}

/// File-backed store of model memories, injected back into the prompt
/// as the `{memories}` block. Oldest notes are evicted past the cap.
pub struct MemoryStore {
    path: PathBuf,
    max_notes: usize,
    notes: Vec<MemoryNote>,
}

impl MemoryStore {
    pub fn open(data_dir: &str, max_notes: usize) -> Result<Self> {
        let path = Path::new(data_dir).join("memories.json");
        let notes = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt memory file {}", path.display()))?,
            Err(_) => Vec::new(),
        };
        Ok(Self {
            path,
            max_notes,
            notes,
        })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn remember(&mut self, note: impl Into<String>) -> Result<()> {
        let note = note.into();
        if note.trim().is_empty() {
            return Ok(());
        }
        debug!("Saving memory note: {}", note);
        self.notes.push(MemoryNote {
            time: Utc::now(),
            note,
        });
        if self.notes.len() > self.max_notes {
            let overflow = self.notes.len() - self.max_notes;
            self.notes.drain(..overflow);
        }
        self.save()
    }

    /// JSON array of notes for prompt injection.
    pub fn render(&self) -> String {
        serde_json::to_string(&self.notes).unwrap_or_else(|_| "[]".to_string())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.notes)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Append-only log of every decision the model produced, for later review.
pub struct DecisionJournal {
    path: PathBuf,
}

impl DecisionJournal {
    pub fn open(data_dir: &str) -> Self {
        Self {
            path: Path::new(data_dir).join("decisions.json"),
        }
    }

    pub fn record(&self, decision: &crate::llm::TradeDecision) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // A journal that fails to parse is left untouched rather than
        // overwritten; the caller decides whether losing the entry matters.
        let mut entries: Vec<serde_json::Value> = match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt decision journal {}", self.path.display()))?,
            Err(_) => Vec::new(),
        };

        entries.push(serde_json::json!({
            "time": Utc::now().to_rfc3339(),
            "decision": decision,
        }));

        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
