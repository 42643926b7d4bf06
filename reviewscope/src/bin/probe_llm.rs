use common::Config;
use std::path::PathBuf;

use reviewscope::llm::{create_llm_provider, LlmProvider, LlmRequest};

/// Sends a short prompt to the provider selected in config and prints the reply.
///
/// Usage: probe_llm [config.toml]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    dotenv::dotenv().ok();

    let default_path = PathBuf::from("config.default.toml");
    let override_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config =
        Config::load_with_defaults(Some(default_path.as_path()), Some(override_path.as_path()))
            .await?;
    let llm_config = config
        .llm
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no [llm] section in configuration"))?;

    let Some(provider) = create_llm_provider(llm_config)? else {
        println!("LLM adapter is \"none\", nothing to probe");
        return Ok(());
    };

    println!("\n{}", "=".repeat(60));
    println!("Probing LLM provider");
    println!("Adapter: {}", config.llm_adapter());
    println!("Model: {}", provider.model_name());
    println!("{}", "=".repeat(60));

    let prompt = format!(
        "{}에 대한 한 줄 홍보 문구를 작성해주세요.",
        config.business.name
    );
    let request = LlmRequest {
        max_tokens: Some(200),
        ..LlmRequest::new(prompt)
    };

    match provider.generate(request).await {
        Ok(response) => {
            println!("✓ Success!");
            println!("  Model: {}", response.model);
            println!("  Reply: {}", response.content.trim());
            println!(
                "  Usage: {} tokens (prompt: {}, completion: {})",
                response.usage.total_tokens,
                response.usage.prompt_tokens,
                response.usage.completion_tokens
            );
        }
        Err(e) => {
            eprintln!("✗ Failed: {:#}", e);
        }
    }

    Ok(())
}
