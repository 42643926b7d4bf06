/*
reviewscope - CLI entry point
Crawls blog reviews, tags their sentiment and writes a marketing strategy report.
*/

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use reviewscope::llm::{create_llm_provider, LlmProvider};
use reviewscope::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "reviewscope", about = "Blog review sentiment and marketing strategy reports")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape blog posts into the reviews directory
    Crawl {
        /// Day the files are named after (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Tag sentiment on a review file and print the summary
    Analyze {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Review file to use instead of the one found for --date
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Generate the marketing strategy report from a review file
    Strategy {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Crawl, analyze and report in one go
    Run {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // API keys may live in a local .env file
    if dotenv::dotenv().is_ok() {
        info!(".env loaded");
    }

    let config = load_config(args.config).await?;
    let provider = build_provider(&config);
    let pipeline = Pipeline::new(config, provider);

    let today = Local::now().date_naive();

    match args.command {
        Command::Crawl { date } => {
            let (reviews, path) = pipeline.crawl(date.unwrap_or(today)).await?;
            println!("✅ Saved {} reviews to {}", reviews.len(), path.display());
            for (i, review) in reviews.iter().take(3).enumerate() {
                println!("\n--- Review {} ---", i + 1);
                println!("Title: {}", review.title);
                println!("Date: {}", review.date);
                println!("Link: {}", review.link);
                println!("Content: {}...", review.content.chars().take(100).collect::<String>());
            }
        }
        Command::Analyze { date, input } => {
            let (_, summary, summary_path) = pipeline.analyze(date.unwrap_or(today), input).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("✅ Summary saved to {}", summary_path.display());
        }
        Command::Strategy { date, input } => {
            let path = pipeline.strategy(date.unwrap_or(today), input).await?;
            preview_report(&path).await;
        }
        Command::Run { date } => {
            let output = pipeline.run(date.unwrap_or(today)).await?;
            println!(
                "📊 {} reviews: {} positive / {} negative / {} neutral",
                output.summary.total_reviews,
                output.summary.positive_count,
                output.summary.negative_count,
                output.summary.neutral_count
            );
            println!("✅ Reviews: {}", output.reviews_path.display());
            println!("✅ Summary: {}", output.summary_path.display());
            preview_report(&output.strategy_path).await;
        }
    }

    Ok(())
}

async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    .map_err(|e| {
        error!("failed to load configuration: {:#}", e);
        e
    })?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

/// A provider that cannot be built is not fatal: reports fall back to the rule-based template.
fn build_provider(config: &Config) -> Option<Arc<dyn LlmProvider>> {
    let llm_config = config.llm.as_ref()?;
    match create_llm_provider(llm_config) {
        Ok(Some(provider)) => {
            info!(adapter = config.llm_adapter(), model = provider.model_name(), "LLM provider initialized");
            Some(Arc::from(provider))
        }
        Ok(None) => {
            info!("LLM disabled, reports use the rule-based strategy");
            None
        }
        Err(e) => {
            warn!("LLM provider unavailable ({:#}), reports use the rule-based strategy", e);
            None
        }
    }
}

async fn preview_report(path: &std::path::Path) {
    println!("\n{}", "=".repeat(60));
    println!("📊 Marketing strategy preview");
    println!("{}", "=".repeat(60));
    match tokio::fs::read_to_string(path).await {
        Ok(report) => println!("{}...", report.chars().take(1000).collect::<String>()),
        Err(e) => error!(%e, "failed to read report back"),
    }
    println!("\n✅ Strategy file: {}", path.display());
}
