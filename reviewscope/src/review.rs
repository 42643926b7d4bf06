use serde::{Deserialize, Serialize};

use crate::sentiment::{Polarity, SentimentClassifier, SentimentResult};

/// One scraped blog post, optionally carrying sentiment annotations.
///
/// Confidence and reasoning are persisted as `sentiment_confidence` and
/// `sentiment_reasoning` (what the dashboard reads); the bare names are
/// accepted when loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub link: String,
    /// YYYY-MM-DD
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Polarity>,
    #[serde(
        default,
        rename = "sentiment_confidence",
        alias = "confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    #[serde(
        default,
        rename = "sentiment_reasoning",
        alias = "reasoning",
        skip_serializing_if = "Option::is_none"
    )]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_keywords: Option<Vec<String>>,
}

impl Review {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        link: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            link: link.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    /// Title and content joined by a single space
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// Overwrite all sentiment fields with `result`
    pub fn apply(&mut self, result: SentimentResult) {
        self.sentiment = Some(result.sentiment);
        self.confidence = Some(result.confidence);
        self.reasoning = Some(result.reasoning);
        self.positive_keywords = Some(result.positive_keywords);
        self.negative_keywords = Some(result.negative_keywords);
    }

    /// Label used for aggregation; unannotated reviews count as neutral
    pub fn polarity(&self) -> Polarity {
        self.sentiment.unwrap_or_default()
    }
}

/// Classify every review, returning annotated copies in input order.
pub fn annotate_reviews(classifier: &SentimentClassifier, reviews: &[Review]) -> Vec<Review> {
    reviews
        .iter()
        .map(|review| {
            let mut annotated = review.clone();
            annotated.apply(classifier.analyze(&review.classification_text()));
            annotated
        })
        .collect()
}
