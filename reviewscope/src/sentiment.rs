use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keywords::KeywordTables;

/// Confidence never reaches certainty.
pub const MAX_CONFIDENCE: f64 = 0.95;
pub const BASE_CONFIDENCE: f64 = 0.6;
pub const CONFIDENCE_STEP: f64 = 0.1;
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Number of matched keywords quoted in the rationale
const RATIONALE_KEYWORDS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Polarity,
    pub confidence: f64,
    pub reasoning: String,
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
}

/// Keyword-count sentiment classifier.
///
/// A keyword matches when it occurs anywhere in the lowercased text, including
/// inside a longer word: "불친절" also yields the positive "친절", and "화" fires
/// on "화장실". Outputs depend on this, so it is kept as is.
#[derive(Debug, Clone, Default)]
pub struct SentimentClassifier {
    tables: KeywordTables,
}

impl SentimentClassifier {
    pub fn new(tables: KeywordTables) -> Self {
        Self { tables }
    }

    pub fn analyze(&self, text: &str) -> SentimentResult {
        let normalized = text.to_lowercase();

        let found_positive = matches_in(&normalized, self.tables.positive());
        let found_negative = matches_in(&normalized, self.tables.negative());

        let p = found_positive.len();
        let n = found_negative.len();

        let (sentiment, confidence, reasoning) = if p > n {
            (
                Polarity::Positive,
                margin_confidence(p - n),
                format!("긍정 키워드 {}개 발견: {}", p, quote(&found_positive)),
            )
        } else if n > p {
            (
                Polarity::Negative,
                margin_confidence(n - p),
                format!("부정 키워드 {}개 발견: {}", n, quote(&found_negative)),
            )
        } else {
            (
                Polarity::Neutral,
                NEUTRAL_CONFIDENCE,
                format!("긍정({})과 부정({}) 키워드 균형", p, n),
            )
        };

        SentimentResult {
            sentiment,
            confidence: round_to(confidence, 2),
            reasoning,
            positive_keywords: found_positive,
            negative_keywords: found_negative,
        }
    }

    /// Label only
    pub fn analyze_simple(&self, text: &str) -> Polarity {
        self.analyze(text).sentiment
    }
}

fn matches_in(text: &str, table: &[String]) -> Vec<String> {
    table
        .iter()
        .filter(|kw| text.contains(kw.as_str()))
        .cloned()
        .collect()
}

fn margin_confidence(margin: usize) -> f64 {
    (BASE_CONFIDENCE + CONFIDENCE_STEP * margin as f64).min(MAX_CONFIDENCE)
}

fn quote(keywords: &[String]) -> String {
    keywords
        .iter()
        .take(RATIONALE_KEYWORDS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Round to `places` decimals on the exact binary value, ties to even
/// (`6.25` -> `6.2`, `0.35` -> `0.3` since 0.35 is stored just below).
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}
