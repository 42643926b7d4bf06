use common::SentimentConfig;

/// Built-in positive markers. Order matters: matches are reported in table order.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "좋다", "좋아요", "좋았어요", "추천", "깨끗", "친절", "만족", "훌륭",
    "최고", "완벽", "재미있", "즐거", "행복", "사랑", "감동", "대박",
    "멋지", "신나", "괜찮", "나쁘지않", "편리", "안전", "넓", "다양",
    "시설", "굿", "짱", "웃음", "기쁘", "좋네", "맘에들", "예쁘",
];

/// Built-in negative markers.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "별로", "나쁘", "불편", "아쉽", "실망", "더럽", "불친절", "비싸",
    "작다", "좁", "시끄럽", "위험", "냄새", "짜증", "화", "엉망",
    "최악", "문제", "고장", "망했", "불만", "개선", "아니다", "싫",
    "힘들", "어려", "복잡", "지저분", "관리안됨", "별점낮", "추천안함",
];

/// Positive and negative substring tables used by the classifier.
///
/// Tables are fixed once built; pass a different instance to classify with
/// substitute vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTables {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl KeywordTables {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            positive: positive.into_iter().map(Into::into).collect(),
            negative: negative.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in tables with any configured replacements applied.
    pub fn from_config(config: Option<&SentimentConfig>) -> Self {
        let mut tables = Self::default();
        if let Some(cfg) = config {
            if let Some(positive) = &cfg.positive_keywords {
                tables.positive = positive.clone();
            }
            if let Some(negative) = &cfg.negative_keywords {
                tables.negative = negative.clone();
            }
        }
        tables
    }

    pub fn positive(&self) -> &[String] {
        &self.positive
    }

    pub fn negative(&self) -> &[String] {
        &self.negative
    }
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self::new(
            POSITIVE_KEYWORDS.iter().copied(),
            NEGATIVE_KEYWORDS.iter().copied(),
        )
    }
}
