use anyhow::{Context, Result};
use chrono::NaiveDate;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::keywords::KeywordTables;
use crate::llm::LlmProvider;
use crate::review::{annotate_reviews, Review};
use crate::scraping::{crawl_keywords, BlogScraper, ScrapeSettings};
use crate::sentiment::SentimentClassifier;
use crate::storage;
use crate::strategy::{BusinessProfile, StrategyGenerator};
use crate::summary::{summarize, SentimentSummary};

/// Files written by a full run
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub reviews_path: PathBuf,
    pub summary_path: PathBuf,
    pub strategy_path: PathBuf,
    pub summary: SentimentSummary,
}

/// Crawl → classify → summarize → report, wired from configuration
pub struct Pipeline {
    config: Config,
    classifier: SentimentClassifier,
    generator: StrategyGenerator,
}

impl Pipeline {
    pub fn new(config: Config, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let classifier = SentimentClassifier::new(KeywordTables::from_config(config.sentiment.as_ref()));
        let generator = StrategyGenerator::new(BusinessProfile::from(&config.business), provider);
        Self {
            config,
            classifier,
            generator,
        }
    }

    /// Search keywords from config, or the business name alone
    fn search_keywords(&self) -> Vec<String> {
        self.config
            .scraper
            .as_ref()
            .map(|s| s.keywords.clone())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| vec![self.config.business.name.clone()])
    }

    async fn scrape(&self, date: NaiveDate) -> Result<Vec<Review>> {
        let settings = ScrapeSettings::from_config(
            self.config.scraper.as_ref(),
            self.config.politeness.as_ref(),
            date,
        );
        let scraper = BlogScraper::new(settings)?;
        let keywords = self.search_keywords();
        info!(keywords = ?keywords, "starting crawl");

        let reviews = crawl_keywords(&scraper, &keywords).await;
        info!(count = reviews.len(), "crawl finished");
        if reviews.is_empty() {
            warn!("crawl returned no reviews");
        }
        Ok(reviews)
    }

    /// Scrape reviews for `date` and store them un-annotated
    pub async fn crawl(&self, date: NaiveDate) -> Result<(Vec<Review>, PathBuf)> {
        let reviews = self.scrape(date).await?;
        let path = storage::save_reviews(self.config.reviews_dir(), &day(date), &reviews).await?;
        Ok((reviews, path))
    }

    /// Load the review file for `date` (or `input`), annotate it in place and
    /// write the summary next to it.
    pub async fn analyze(
        &self,
        date: NaiveDate,
        input: Option<PathBuf>,
    ) -> Result<(Vec<Review>, SentimentSummary, PathBuf)> {
        let path = self.resolve_reviews_file(date, input).await?;
        let reviews = storage::load_reviews(&path).await?;
        info!(path = %path.display(), count = reviews.len(), "annotating reviews");

        let annotated = annotate_reviews(&self.classifier, &reviews);
        let summary = summarize(&annotated);
        if summary.is_empty() {
            warn!(path = %path.display(), "review file holds no reviews");
        }

        storage::write_reviews(&path, &annotated).await?;
        let summary_path =
            storage::save_summary(self.config.reviews_dir(), &day(date), &summary).await?;

        Ok((annotated, summary, summary_path))
    }

    /// Generate and store the marketing strategy for the reviews of `date`
    pub async fn strategy(&self, date: NaiveDate, input: Option<PathBuf>) -> Result<PathBuf> {
        let path = self.resolve_reviews_file(date, input).await?;
        let mut reviews = storage::load_reviews(&path).await?;

        if reviews.iter().any(|r| r.sentiment.is_none()) {
            info!("reviews are not annotated yet, classifying before report generation");
            reviews = annotate_reviews(&self.classifier, &reviews);
        }

        self.write_strategy(&reviews, date).await
    }

    async fn write_strategy(&self, reviews: &[Review], date: NaiveDate) -> Result<PathBuf> {
        let report = self.generator.generate(reviews, date).await;
        storage::save_strategy(self.config.strategies_dir(), &day(date), &report).await
    }

    /// Full run: crawl, annotate, summarize, write report
    pub async fn run(&self, date: NaiveDate) -> Result<RunOutput> {
        let reviews = self.scrape(date).await?;
        let annotated = annotate_reviews(&self.classifier, &reviews);
        let summary = summarize(&annotated);
        let reviews_path =
            storage::save_reviews(self.config.reviews_dir(), &day(date), &annotated).await?;
        let summary_path =
            storage::save_summary(self.config.reviews_dir(), &day(date), &summary).await?;
        let strategy_path = self.write_strategy(&annotated, date).await?;

        Ok(RunOutput {
            reviews_path,
            summary_path,
            strategy_path,
            summary,
        })
    }

    async fn resolve_reviews_file(&self, date: NaiveDate, input: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = input {
            return Ok(path);
        }
        let dir = self.config.reviews_dir();
        storage::find_reviews_file(&dir, &day(date))
            .await
            .with_context(|| format!("No review file for {} in {} (run `crawl` first)", day(date), dir))
    }
}

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
