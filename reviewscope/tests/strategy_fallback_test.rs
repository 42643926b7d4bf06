use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use reviewscope::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use reviewscope::review::{annotate_reviews, Review};
use reviewscope::sentiment::SentimentClassifier;
use reviewscope::strategy::{BusinessProfile, StrategyGenerator, NO_REVIEWS_MESSAGE};

/// Provider returning a canned reply, or an error when `reply` is None
struct CannedProvider {
    reply: Option<String>,
}

#[async_trait::async_trait]
impl LlmProvider for CannedProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        assert!(request.prompt.contains("우리끼리 키즈카페"));
        match &self.reply {
            Some(text) => Ok(LlmResponse {
                content: text.clone(),
                usage: UsageMetadata::default(),
                model: "canned".to_string(),
            }),
            None => anyhow::bail!("LLM API error 500 Internal Server Error: boom"),
        }
    }

    fn model_name(&self) -> &str {
        "canned-model"
    }
}

fn generator(reply: Option<&str>) -> StrategyGenerator {
    let provider: Arc<dyn LlmProvider> = Arc::new(CannedProvider {
        reply: reply.map(str::to_string),
    });
    StrategyGenerator::new(BusinessProfile::new("우리끼리 키즈카페"), Some(provider))
}

fn reviews() -> Vec<Review> {
    let raw = vec![
        Review::new("최고의 키즈카페", "깨끗하고 넓어요 추천", "https://blog.naver.com/a/1", "2025-06-01"),
        Review::new("재방문", "아이가 좋아해요 만족", "https://blog.naver.com/a/2", "2025-06-02"),
        Review::new("아쉬움", "조금 비싸고 시끄러워요", "https://blog.naver.com/a/3", "2025-06-03"),
    ];
    annotate_reviews(&SentimentClassifier::default(), &raw)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()
}

#[tokio::test]
async fn successful_generation_produces_ai_report() {
    let report = generator(Some("## 핵심 전략\n주말 프로모션")).generate(&reviews(), date()).await;

    assert!(report.starts_with("# 🤖 AI 생성 마케팅 전략 보고서"));
    assert!(report.contains("**생성 모델**: canned-model"));
    assert!(report.contains("## 핵심 전략\n주말 프로모션"));
    assert!(report.contains("2025년 06월 12일"));
}

#[tokio::test]
async fn failing_provider_falls_back_to_rule_based_report() {
    let report = generator(None).generate(&reviews(), date()).await;

    assert!(report.starts_with("# 📊 우리끼리 키즈카페 마케팅 전략 보고서"));
    assert!(report.contains("**분석 방식**: 기본 규칙 기반 분석"));
    assert!(report.contains("**총 리뷰 수**: 3개"));
    assert!(!report.contains("boom"));
}

#[tokio::test]
async fn blank_generation_falls_back_to_rule_based_report() {
    let report = generator(Some("   \n")).generate(&reviews(), date()).await;
    assert!(report.contains("기본 규칙 기반 분석"));
}

#[tokio::test]
async fn no_reviews_yields_notice_without_calling_provider() {
    let report = generator(Some("unused")).generate(&[], date()).await;
    assert_eq!(report, NO_REVIEWS_MESSAGE);
}
