use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::review::Review;
use crate::summary::SentimentSummary;

/// Review file name variants written by the different crawlers, most preferred first
const REVIEW_FILE_SUFFIXES: &[&str] = &["_iframe.json", "_simple.json", ".json"];

pub fn reviews_path(dir: impl AsRef<Path>, date: &str) -> PathBuf {
    dir.as_ref().join(format!("{}.json", date))
}

pub fn strategy_path(dir: impl AsRef<Path>, date: &str) -> PathBuf {
    dir.as_ref().join(format!("{}_marketing_strategy.md", date))
}

pub fn summary_path(dir: impl AsRef<Path>, date: &str) -> PathBuf {
    dir.as_ref().join(format!("{}_summary.json", date))
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    write_file(path, json.as_bytes()).await
}

/// Write reviews as pretty JSON to `{dir}/{date}.json`
pub async fn save_reviews(dir: impl AsRef<Path>, date: &str, reviews: &[Review]) -> Result<PathBuf> {
    let path = reviews_path(dir, date);
    write_reviews(&path, reviews).await?;
    Ok(path)
}

/// Write reviews to an explicit path, replacing its contents
pub async fn write_reviews(path: &Path, reviews: &[Review]) -> Result<()> {
    write_json(path, reviews).await?;
    info!(path = %path.display(), count = reviews.len(), "reviews saved");
    Ok(())
}

pub async fn load_reviews(path: impl AsRef<Path>) -> Result<Vec<Review>> {
    let path = path.as_ref();
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read reviews file: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse reviews file: {}", path.display()))
}

/// First existing review file for `date`, probing crawler variants in order
pub async fn find_reviews_file(dir: impl AsRef<Path>, date: &str) -> Option<PathBuf> {
    for suffix in REVIEW_FILE_SUFFIXES {
        let candidate = dir.as_ref().join(format!("{}{}", date, suffix));
        if tokio::fs::metadata(&candidate).await.is_ok() {
            return Some(candidate);
        }
    }
    None
}

/// Write the report to `{dir}/{date}_marketing_strategy.md`
pub async fn save_strategy(dir: impl AsRef<Path>, date: &str, strategy: &str) -> Result<PathBuf> {
    let path = strategy_path(dir, date);
    write_file(&path, strategy.as_bytes()).await?;
    info!(path = %path.display(), "marketing strategy saved");
    Ok(path)
}

pub async fn save_summary(
    dir: impl AsRef<Path>,
    date: &str,
    summary: &SentimentSummary,
) -> Result<PathBuf> {
    let path = summary_path(dir, date);
    write_json(&path, summary).await?;
    info!(path = %path.display(), "sentiment summary saved");
    Ok(path)
}
