use serde::{Deserialize, Serialize};

use crate::review::Review;
use crate::sentiment::{round_to, Polarity};

/// How many keywords per polarity the summary keeps
pub const TOP_KEYWORDS: usize = 5;

/// A keyword and how many reviews mentioned it.
/// Serialized as a `[keyword, count]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, usize)", into = "(String, usize)")]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

impl KeywordCount {
    pub fn new(keyword: impl Into<String>, count: usize) -> Self {
        Self {
            keyword: keyword.into(),
            count,
        }
    }
}

impl From<(String, usize)> for KeywordCount {
    fn from((keyword, count): (String, usize)) -> Self {
        Self { keyword, count }
    }
}

impl From<KeywordCount> for (String, usize) {
    fn from(kc: KeywordCount) -> Self {
        (kc.keyword, kc.count)
    }
}

/// Aggregate sentiment statistics over a set of reviews
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub total_reviews: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    /// Percentages with one decimal
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    pub neutral_ratio: f64,
    pub top_positive_keywords: Vec<KeywordCount>,
    pub top_negative_keywords: Vec<KeywordCount>,
}

/// Banner shown in reports, derived from the positive ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatisfactionLevel {
    High,
    Adequate,
    NeedsImprovement,
}

impl SatisfactionLevel {
    pub fn from_ratio(positive_ratio: f64) -> Self {
        if positive_ratio >= 70.0 {
            SatisfactionLevel::High
        } else if positive_ratio >= 50.0 {
            SatisfactionLevel::Adequate
        } else {
            SatisfactionLevel::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SatisfactionLevel::High => "매우 높음",
            SatisfactionLevel::Adequate => "양호",
            SatisfactionLevel::NeedsImprovement => "개선 필요",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SatisfactionLevel::High => "🟢",
            SatisfactionLevel::Adequate => "🟡",
            SatisfactionLevel::NeedsImprovement => "🔴",
        }
    }
}

impl SentimentSummary {
    pub fn satisfaction(&self) -> SatisfactionLevel {
        SatisfactionLevel::from_ratio(self.positive_ratio)
    }

    pub fn is_empty(&self) -> bool {
        self.total_reviews == 0
    }
}

/// Reduce annotated reviews to counts, ratios and top keywords.
///
/// An empty slice yields the all-zero summary.
pub fn summarize(reviews: &[Review]) -> SentimentSummary {
    if reviews.is_empty() {
        return SentimentSummary::default();
    }

    let total = reviews.len();
    let mut positive_count = 0;
    let mut negative_count = 0;
    let mut neutral_count = 0;
    for review in reviews {
        match review.polarity() {
            Polarity::Positive => positive_count += 1,
            Polarity::Negative => negative_count += 1,
            Polarity::Neutral => neutral_count += 1,
        }
    }

    let ratio = |count: usize| round_to(count as f64 / total as f64 * 100.0, 1);

    let positive_mentions = reviews
        .iter()
        .flat_map(|r| r.positive_keywords.iter().flatten());
    let negative_mentions = reviews
        .iter()
        .flat_map(|r| r.negative_keywords.iter().flatten());

    SentimentSummary {
        total_reviews: total,
        positive_count,
        negative_count,
        neutral_count,
        positive_ratio: ratio(positive_count),
        negative_ratio: ratio(negative_count),
        neutral_ratio: ratio(neutral_count),
        top_positive_keywords: top_keywords(positive_mentions, TOP_KEYWORDS),
        top_negative_keywords: top_keywords(negative_mentions, TOP_KEYWORDS),
    }
}

/// The `n` most frequent items, most frequent first. Equal counts keep the
/// order in which each distinct keyword was first seen.
pub fn top_keywords<I, S>(mentions: I, n: usize) -> Vec<KeywordCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: Vec<KeywordCount> = Vec::new();
    for mention in mentions {
        let mention = mention.as_ref();
        match counts.iter_mut().find(|kc| kc.keyword == mention) {
            Some(kc) => kc.count += 1,
            None => counts.push(KeywordCount::new(mention, 1)),
        }
    }
    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}
