use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Core trait for hosted text-generation providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Human-readable model label used in report headers
    fn model_name(&self) -> &str;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    /// Prompt with provider defaults for every knob
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Result of asking a provider for narrative text, as seen by the report formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success(String),
    Failure(String),
}

impl From<Result<LlmResponse>> for GenerationOutcome {
    fn from(result: Result<LlmResponse>) -> Self {
        match result {
            Ok(response) if response.content.trim().is_empty() => {
                GenerationOutcome::Failure("provider returned empty text".to_string())
            }
            Ok(response) => GenerationOutcome::Success(response.content),
            // {:#} keeps the context chain on one line
            Err(e) => GenerationOutcome::Failure(format!("{:#}", e)),
        }
    }
}

pub mod gemini;
pub mod remote;

/// Send `request` with a JSON `body` and decode the JSON reply.
///
/// The deadline covers the whole exchange: a server that sends headers and
/// then stalls on the body still times out. `api` prefixes error messages.
pub(crate) async fn post_json<B, R>(
    request: reqwest::RequestBuilder,
    body: &B,
    timeout: Duration,
    api: &str,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let exchange = async {
        let response = request
            .json(body)
            .send()
            .await
            .with_context(|| format!("{} HTTP request failed", api))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response body", api))?;
        if !status.is_success() {
            anyhow::bail!("{} API error {}: {}", api, status, text);
        }
        serde_json::from_str::<R>(&text).with_context(|| format!("Failed to parse {} response", api))
    };

    tokio::time::timeout(timeout, exchange)
        .await
        .with_context(|| format!("{} request timed out after {}s", api, timeout.as_secs()))?
}

/// Create the provider selected by `llm.adapter`.
///
/// Returns `Ok(None)` for the "none" adapter; a missing API key is an error
/// the caller may downgrade to the rule-based path.
pub fn create_llm_provider(llm_config: &common::LlmConfig) -> Result<Option<Box<dyn LlmProvider>>> {
    let adapter = llm_config.adapter.as_deref().unwrap_or("none");
    match adapter {
        "gemini" => {
            let cfg = llm_config.gemini.clone().unwrap_or_default();
            let api_key = read_api_key(cfg.api_key_env.as_deref().unwrap_or("GEMINI_API_KEY"))?;
            let provider = gemini::GeminiProvider::new(
                cfg.api_url.unwrap_or_else(|| gemini::DEFAULT_GEMINI_URL.to_string()),
                api_key,
                cfg.model.unwrap_or_else(|| gemini::DEFAULT_GEMINI_MODEL.to_string()),
            )
            .with_defaults(
                cfg.timeout_seconds.unwrap_or(30),
                cfg.max_tokens.unwrap_or(2048),
                cfg.temperature.unwrap_or(0.7),
            );
            Ok(Some(Box::new(provider)))
        }
        "remote" => {
            let cfg = llm_config
                .remote
                .as_ref()
                .context("Remote adapter selected but no [llm.remote] config found")?;
            let api_key_env = cfg
                .api_key_env
                .as_deref()
                .context("Missing api_key_env in remote config")?;
            let api_key = read_api_key(api_key_env)?;
            let provider = remote::RemoteLlmProvider::new(
                cfg.api_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string()),
                api_key,
                cfg.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string()),
            )
            .with_defaults(
                cfg.timeout_seconds.unwrap_or(30),
                cfg.max_tokens.unwrap_or(2048),
                cfg.temperature.unwrap_or(0.7),
            );
            Ok(Some(Box::new(provider)))
        }
        "none" => Ok(None),
        _ => anyhow::bail!("Unknown LLM adapter type: {}", adapter),
    }
}

fn read_api_key(env_name: &str) -> Result<String> {
    let key = std::env::var(env_name)
        .with_context(|| format!("LLM API key env var '{}' not set", env_name))?;
    if key.trim().is_empty() {
        anyhow::bail!("LLM API key env var '{}' is empty", env_name);
    }
    Ok(key)
}
