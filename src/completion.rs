//! Chat completion capability and implementations.
//!
//! Defines the [`CompletionProvider`] trait and two concrete backends:
//!
//! - **[`OpenAIChat`]** — calls `POST /v1/chat/completions` with
//!   temperature 0 for reproducible grounded answers.
//! - **[`OllamaChat`]** — calls a local Ollama instance's `/api/chat`
//!   endpoint with streaming disabled.
//!
//! Both share the embedding backends' retry policy: 429/5xx/network errors
//! back off and retry, other client errors fail immediately.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::embedding::backoff;
use crate::models::Message;

/// Produces an assistant reply for an ordered message sequence.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Create the configured [`CompletionProvider`].
///
/// Fails for unknown provider names or missing credentials, so a broken
/// completion setup surfaces at startup.
pub fn create_provider(config: &CompletionConfig) -> Result<Box<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAIChat::new(config)?)),
        "ollama" => Ok(Box::new(OllamaChat::new(config))),
        other => bail!("Unknown completion provider: {}", other),
    }
}

fn messages_json(messages: &[Message]) -> serde_json::Value {
    serde_json::Value::Array(
        messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect(),
    )
}

// ============ OpenAI ============

/// Chat completion provider using the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAIChat {
    api_key: String,
    model: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAIChat {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAIChat {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages_json(messages),
            "temperature": 0,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                backoff(attempt).await;
            }

            let resp = client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_openai_chat_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("OpenAI API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Completion failed after retries")))
    }
}

fn parse_openai_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))
}

// ============ Ollama ============

/// Chat completion provider using a local Ollama instance.
///
/// Calls `POST /api/chat` on the configured URL
/// (default `http://localhost:11434`) with `stream: false`.
pub struct OllamaChat {
    model: String,
    url: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OllamaChat {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaChat {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages_json(messages),
            "stream": false,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                backoff(attempt).await;
            }

            let resp = client
                .post(format!("{}/api/chat", self.url))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_ollama_chat_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Ollama API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Ollama API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Ollama completion failed after retries")))
    }
}

fn parse_ollama_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message content"))
}
