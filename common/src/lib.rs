/*!
common/src/lib.rs

Shared configuration types and helpers for reviewscope.

This file provides:
- Config data structures (deserialized from TOML)
- A layered loader (defaults file + override file, deep-merged)
- Small helpers shared by the binaries
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// The business whose blog reviews are collected and reported on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    /// Display name used in report headers and prompts
    pub name: String,
    /// Kind of business (e.g. "무인 키즈카페")
    pub category: Option<String>,
    /// Location label
    pub region: Option<String>,
    /// Free-text description of the review window, shown in the rule-based report
    pub analysis_period: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Search engine scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Search endpoint, without query string
    pub search_url: Option<String>,
    /// Search queries; results are merged and de-duplicated by link
    #[serde(default)]
    pub keywords: Vec<String>,
    pub max_pages: Option<u32>,
    pub items_per_page: Option<usize>,
    /// Only result links containing this substring are followed
    pub link_filter: Option<String>,
    /// A post is kept only when its date mentions one of these years
    pub accepted_years: Option<Vec<String>>,
    pub content_max_chars: Option<usize>,
    /// Date assigned to posts without a detectable date (defaults to the crawl day)
    pub fallback_date: Option<String>,
}

/// Politeness / fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolitenessConfig {
    pub fetch_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub item_delay_min_ms: Option<u64>,
    pub item_delay_max_ms: Option<u64>,
    pub page_delay_min_ms: Option<u64>,
    pub page_delay_max_ms: Option<u64>,
}

/// Endpoint config shared by the Gemini and OpenAI-compatible adapters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// LLM top-level config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "gemini", "remote", "none"
    pub gemini: Option<RemoteLlmConfig>,
    pub remote: Option<RemoteLlmConfig>,
}

/// Optional replacement keyword tables for the classifier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub positive_keywords: Option<Vec<String>>,
    pub negative_keywords: Option<Vec<String>>,
}

/// Where generated files are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub reviews_dir: Option<String>,
    pub strategies_dir: Option<String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub business: BusinessConfig,
    pub scraper: Option<ScraperConfig>,
    pub politeness: Option<PolitenessConfig>,
    pub llm: Option<LlmConfig>,
    pub sentiment: Option<SentimentConfig>,
    pub output: Option<OutputConfig>,
}

pub const DEFAULT_REVIEWS_DIR: &str = "data/reviews";
pub const DEFAULT_STRATEGIES_DIR: &str = "data/strategies";

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Directory for scraped and annotated review JSON files
    pub fn reviews_dir(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.reviews_dir.clone())
            .unwrap_or_else(|| DEFAULT_REVIEWS_DIR.to_string())
    }

    /// Directory for generated strategy reports
    pub fn strategies_dir(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.strategies_dir.clone())
            .unwrap_or_else(|| DEFAULT_STRATEGIES_DIR.to_string())
    }

    /// Selected LLM adapter name, "none" when unset
    pub fn llm_adapter(&self) -> &str {
        self.llm
            .as_ref()
            .and_then(|l| l.adapter.as_deref())
            .unwrap_or("none")
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Convenience: sleep helper used for politeness delays (kept public for tests)
pub async fn sleep_millis(ms: u64) {
    if ms == 0 {
        return;
    }
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
