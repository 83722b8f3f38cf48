use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PromptFile {
    prompt: String,
}

/// Placeholder names the renderer knows how to fill.
const PLACEHOLDERS: [&str; 10] = [
    "current_trade_json",
    "last_closed_trades_json",
    "timeframe",
    "todays_news",
    "current_price",
    "zones",
    "session_info",
    "bid",
    "ask",
    "memories",
];

/// Data injected into the prompt template each decision cycle.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub current_trade_json: String,
    pub last_closed_trades_json: String,
    pub timeframe: String,
    pub todays_news: String,
    pub current_price: String,
    pub zones: String,
    pub session_info: String,
    pub bid: String,
    pub ask: String,
    pub memories: String,
}

impl PromptContext {
    fn pairs(&self) -> [(&'static str, &str); 10] {
        [
            ("current_trade_json", &self.current_trade_json),
            ("last_closed_trades_json", &self.last_closed_trades_json),
            ("timeframe", &self.timeframe),
            ("todays_news", &self.todays_news),
            ("current_price", &self.current_price),
            ("zones", &self.zones),
            ("session_info", &self.session_info),
            ("bid", &self.bid),
            ("ask", &self.ask),
            ("memories", &self.memories),
        ]
    }
}

/// A `{placeholder}`-style template loaded from a `{"prompt": "..."}` JSON file.
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        let file: PromptFile = serde_json::from_str(&raw)
            .with_context(|| format!("Prompt file {} is not valid JSON", path.display()))?;
        Ok(Self {
            template: file.prompt,
        })
    }

    pub fn from_string(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, ctx: &PromptContext) -> Result<String> {
        // Validate against the raw template, never the rendered output:
        // injected values (memory notes, trade reasons) may legitimately
        // contain {braced} text of their own.
        if let Some(unknown) = find_unknown_placeholder(&self.template) {
            anyhow::bail!("Unresolved prompt placeholder: {{{}}}", unknown);
        }

        let mut rendered = self.template.clone();
        for (name, value) in ctx.pairs() {
            rendered = rendered.replace(&format!("{{{}}}", name), value);
        }

        Ok(rendered)
    }
}

/// Find the first `{identifier}` token in the template that the
/// renderer does not know how to fill. JSON examples embedded in the
/// template never trigger this: JSON object keys are always quoted, so
/// `{` is followed by `"`.
fn find_unknown_placeholder(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let rest = &s[i + 1..];
            if let Some(end) = rest.find('}') {
                let inner = &rest[..end];
                if !inner.is_empty()
                    && inner
                        .bytes()
                        .all(|b| b.is_ascii_lowercase() || b == b'_')
                    && !PLACEHOLDERS.contains(&inner)
                {
                    return Some(inner);
                }
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context() -> PromptContext {
        PromptContext {
            current_trade_json: "null".to_string(),
            last_closed_trades_json: "[]".to_string(),
            timeframe: "1h".to_string(),
            todays_news: "[]".to_string(),
            current_price: "190.25".to_string(),
            zones: r#"{"1h":{"local_high":191.0}}"#.to_string(),
            session_info: "[London] London session opened 2h ago".to_string(),
            bid: "190.24".to_string(),
            ask: "190.26".to_string(),
            memories: "[]".to_string(),
        }
    }

    #[test]
    fn renders_all_placeholders() {
        let t = PromptTemplate::from_string(
            "Price {current_price} bid {bid} ask {ask} in {timeframe}. Zones: {zones}. \
             {session_info}. News: {todays_news}. Open: {current_trade_json}. \
             History: {last_closed_trades_json}. Memories: {memories}.",
        );
        let out = t.render(&full_context()).unwrap();
        assert!(out.contains("Price 190.25 bid 190.24 ask 190.26 in 1h"));
        assert!(!out.contains('{') || out.contains("{\"1h\""));
    }

    #[test]
    fn unresolved_placeholder_errors() {
        let t = PromptTemplate::from_string("Price {current_price} and {unknown_field}");
        let err = t.render(&full_context()).unwrap_err();
        assert!(err.to_string().contains("unknown_field"));
    }

    #[test]
    fn injected_json_does_not_trip_placeholder_check() {
        let t = PromptTemplate::from_string("Zones: {zones}");
        assert!(t.render(&full_context()).is_ok());
    }

    #[test]
    fn braced_text_in_injected_values_is_passed_through() {
        // A saved memory note (or trade reason fed back through the
        // history) may contain {braced} words of its own; only the
        // template is checked for placeholders.
        let t = PromptTemplate::from_string("Notes: {memories}");
        let mut ctx = full_context();
        ctx.memories = r#"[{"note": "avoid the {orb} chop window"}]"#.to_string();
        let out = t.render(&ctx).unwrap();
        assert!(out.contains("avoid the {orb} chop window"));
    }

    #[test]
    fn load_rejects_non_json_file() {
        let dir = std::env::temp_dir().join(format!("prompt_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_prompt.json");
        std::fs::write(&path, "this is not json").unwrap();
        assert!(PromptTemplate::load(&path).is_err());
    }

    #[test]
    fn load_reads_prompt_field() {
        let dir = std::env::temp_dir().join(format!("prompt_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prompt.json");
        std::fs::write(&path, r#"{"prompt": "Trade {timeframe} now"}"#).unwrap();
        let t = PromptTemplate::load(&path).unwrap();
        let out = t.render(&full_context()).unwrap();
        assert_eq!(out, "Trade 1h now");
    }
}
