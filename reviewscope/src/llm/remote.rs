use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{post_json, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};

/// OpenAI-compatible `chat/completions` provider (OpenAI, OpenRouter, local gateways)
pub struct RemoteLlmProvider {
    api_url: String,
    api_key: String,
    model: String,
    default_timeout: Duration,
    default_max_tokens: usize,
    default_temperature: f32,
    client: reqwest::Client,
}

impl RemoteLlmProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 2048,
            default_temperature: 0.7,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_defaults(mut self, timeout_secs: u64, max_tokens: usize, temperature: f32) -> Self {
        self.default_timeout = Duration::from_secs(timeout_secs);
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    /// Single user turn carrying the whole prompt
    fn completion_body(&self, request: LlmRequest) -> CompletionBody {
        CompletionBody {
            model: self.model.clone(),
            messages: vec![ChatTurn::user(request.prompt)],
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            temperature: request.temperature.unwrap_or(self.default_temperature),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for RemoteLlmProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let timeout = request
            .timeout_seconds
            .map_or(self.default_timeout, Duration::from_secs);
        let body = self.completion_body(request);

        let completion: Completion = post_json(
            self.client.post(&self.api_url).bearer_auth(&self.api_key),
            &body,
            timeout,
            "LLM",
        )
        .await?;

        completion.into_response(&self.model)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody {
    model: String,
    messages: Vec<ChatTurn>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatTurn {
    role: String,
    content: String,
}

impl ChatTurn {
    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatTurn,
}

/// Gateways differ in which counters they report; missing ones read as 0
#[derive(Debug, Default, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

impl Completion {
    fn into_response(self, configured_model: &str) -> Result<LlmResponse> {
        let turn = self
            .choices
            .into_iter()
            .map(|choice| choice.message)
            .next()
            .context("LLM response has no choices")?;
        let usage = self.usage.unwrap_or_default();

        Ok(LlmResponse {
            content: turn.content,
            usage: UsageMetadata {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            model: self.model.unwrap_or_else(|| configured_model.to_string()),
        })
    }
}
