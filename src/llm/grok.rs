use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::llm::LlmClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// OpenAI-compatible chat-completions client for the xAI API.
pub struct GrokClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl GrokClient {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: cfg.llm_base_url.clone(),
            api_key: cfg.xai_api_key.clone(),
            model: cfg.model_name.clone(),
            temperature: cfg.temperature,
        }
    }
}

#[async_trait]
impl LlmClient for GrokClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("XAI_API_KEY not set");
        }

        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("Failed to reach chat completions API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Chat completions error {}: {}", status, body);
        }

        let data: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        let content = data
            .choices
            .into_iter()
            .next()
            .context("No choices in chat completions response")?
            .message
            .content;

        Ok(content)
    }
}
