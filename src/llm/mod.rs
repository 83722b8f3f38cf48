pub mod decision;
pub mod grok;
pub mod prompt;

pub use decision::{parse_decision, Action, DecisionError, TradeDecision};
pub use grok::GrokClient;
pub use prompt::{PromptContext, PromptTemplate};

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

pub const SYSTEM_PROMPT: &str =
    "You are a disciplined, data-driven forex trading AI. Respond ONLY in JSON.";

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Run the model against a rendered prompt, with bounded retry.
///
/// On a parse failure the next attempt carries the parse error and the
/// offending content back to the model as corrective feedback.
pub async fn analyze(
    client: &dyn LlmClient,
    prompt: &str,
    max_retries: usize,
) -> Result<TradeDecision> {
    let mut user = prompt.to_string();
    let mut last_err: Option<DecisionError> = None;

    for attempt in 0..max_retries.max(1) {
        let content = client.complete(SYSTEM_PROMPT, &user).await?;

        match parse_decision(&content) {
            Ok(decision) => return Ok(decision),
            Err(e) => {
                warn!(
                    "Attempt {}: failed to parse decision: {} (content: {})",
                    attempt + 1,
                    e,
                    content.chars().take(300).collect::<String>()
                );
                user = format!(
                    "{}\n\nYour previous response could not be used ({}).\n\
                     Previous response:\n{}\n\n\
                     Respond again with ONLY a single valid JSON object matching the \
                     required schema.",
                    prompt, e, content
                );
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(anyhow::anyhow!(e).context("Model kept returning unusable decisions")),
        None => anyhow::bail!("Model returned no usable decision"),
    }
}
