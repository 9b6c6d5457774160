//! Ollama responder
//!
//! Ollama exposes an OpenAI-compatible API at localhost:11434/v1. Each
//! handler id maps to a model (see `LlmConfig::models`) and a short role
//! prompt; the handler's answer is the first choice's message content.

use crate::api_types::HandlerResponse;
use crate::collaborators::Responder;
use crate::retry::{with_retry, RetryPolicy};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use solace_core::{HandlerIds, HandlerRole, LlmConfig};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OllamaResponder {
    client: Client,
    base_url: String,
    config: LlmConfig,
    handlers: HandlerIds,
    retry: RetryPolicy,
}

impl OllamaResponder {
    pub fn new(config: &LlmConfig, handlers: &HandlerIds) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
            handlers: handlers.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn role_prompt(role: HandlerRole) -> &'static str {
    match role {
        HandlerRole::Technical => "You are the technical voice of a caring companion. Answer precisely and practically.",
        HandlerRole::Emotional => "You are the emotional voice of a caring companion. Respond with warmth and validation.",
        HandlerRole::Creative => "You are the creative voice of a caring companion. Offer playful, imaginative ideas.",
        HandlerRole::Conductor => "You are the conductor of a caring companion. Reply briefly and kindly, keeping the conversation grounded.",
    }
}

fn build_payload(
    config: &LlmConfig,
    handlers: &HandlerIds,
    message: &str,
    handler_id: &str,
) -> Value {
    json!({
        "model": config.model_for(handler_id),
        "messages": [
            {"role": "system", "content": role_prompt(handlers.role_of(handler_id))},
            {"role": "user", "content": message},
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    })
}

/// Turn an OpenAI-compatible completion into a handler response. The API
/// reports no confidence, so it is inferred from the finish reason.
pub(crate) fn parse_completion(resp_json: &Value) -> Result<HandlerResponse> {
    let choice = &resp_json["choices"][0];
    let text = choice["message"]["content"]
        .as_str()
        .filter(|t| !t.trim().is_empty())
        .context("Completion has no message content")?
        .trim()
        .to_string();

    let confidence = match choice["finish_reason"].as_str() {
        Some("stop") => 0.8,
        Some("length") => 0.5,
        _ => 0.6,
    };
    let complexity = (text.split_whitespace().count() as f32 / 200.0).min(1.0);

    Ok(HandlerResponse {
        response: text,
        confidence,
        complexity,
    })
}

#[async_trait::async_trait]
impl Responder for OllamaResponder {
    async fn respond(&self, message: &str, handler_id: &str) -> Result<HandlerResponse> {
        let payload = build_payload(&self.config, &self.handlers, message, handler_id);
        let url = format!("{}/chat/completions", self.base_url);
        let label = format!("Ollama[{}]", handler_id);

        let response = with_retry(&self.retry, &label, || {
            self.client.post(&url).json(&payload).send()
        })
        .await?;

        let resp_json: Value = response
            .json()
            .await
            .with_context(|| format!("{} returned invalid JSON", label))?;
        parse_completion(&resp_json)
    }
}
