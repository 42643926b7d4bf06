use chrono::NaiveDate;
use common::BusinessConfig;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{GenerationOutcome, LlmProvider, LlmRequest};
use crate::review::Review;
use crate::summary::{summarize, KeywordCount, SentimentSummary};

pub const NO_REVIEWS_MESSAGE: &str = "리뷰가 없어서 마케팅 전략을 생성할 수 없습니다.";

/// Number of reviews quoted verbatim in the AI prompt
const KEY_REVIEWS: usize = 3;
const KEY_REVIEW_TITLE_CHARS: usize = 100;
const KEY_REVIEW_CONTENT_CHARS: usize = 200;
/// Negative keywords turned into priority improvement items
const PRIORITY_ITEMS: usize = 3;

/// Who the report is about
#[derive(Debug, Clone)]
pub struct BusinessProfile {
    pub name: String,
    pub category: String,
    pub region: Option<String>,
    pub analysis_period: Option<String>,
    pub hashtags: Vec<String>,
}

impl BusinessProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: "매장".to_string(),
            region: None,
            analysis_period: None,
            hashtags: Vec::new(),
        }
    }

    /// Configured hashtags, or one built from the business name
    pub fn hashtags(&self) -> Vec<String> {
        if self.hashtags.is_empty() {
            vec![format!("#{}", self.name.replace(' ', ""))]
        } else {
            self.hashtags.clone()
        }
    }
}

impl From<&BusinessConfig> for BusinessProfile {
    fn from(cfg: &BusinessConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            category: cfg.category.clone().unwrap_or_else(|| "매장".to_string()),
            region: cfg.region.clone(),
            analysis_period: cfg.analysis_period.clone(),
            hashtags: cfg.hashtags.clone(),
        }
    }
}

/// Produces the marketing strategy report, preferring AI-written narrative
/// and falling back to the rule-based template.
pub struct StrategyGenerator {
    profile: BusinessProfile,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl StrategyGenerator {
    pub fn new(profile: BusinessProfile, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { profile, provider }
    }

    /// Build the report for already annotated reviews. Provider failures never
    /// surface here; they select the rule-based report instead.
    pub async fn generate(&self, reviews: &[Review], date: NaiveDate) -> String {
        if reviews.is_empty() {
            return NO_REVIEWS_MESSAGE.to_string();
        }

        let summary = summarize(reviews);

        let Some(provider) = &self.provider else {
            info!("no LLM provider configured, using rule-based strategy");
            return render_rule_based_report(&self.profile, &summary, date);
        };

        let prompt = build_strategy_prompt(&self.profile, &summary, reviews);
        let outcome: GenerationOutcome = provider.generate(LlmRequest::new(prompt)).await.into();

        match outcome {
            GenerationOutcome::Success(narrative) => {
                info!(
                    model = provider.model_name(),
                    chars = narrative.chars().count(),
                    "AI strategy generated"
                );
                render_ai_report(&self.profile, provider.model_name(), &narrative, date)
            }
            GenerationOutcome::Failure(reason) => {
                warn!(%reason, "AI strategy generation failed, falling back to rule-based strategy");
                render_rule_based_report(&self.profile, &summary, date)
            }
        }
    }
}

pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%Y년 %m월 %d일").to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn keyword_list(keywords: &[KeywordCount]) -> String {
    keywords
        .iter()
        .map(|kc| format!("{}({}회)", kc.keyword, kc.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prompt sent to the generation provider
pub fn build_strategy_prompt(
    profile: &BusinessProfile,
    summary: &SentimentSummary,
    reviews: &[Review],
) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "당신은 {} 마케팅 전문가입니다. 다음 리뷰 분석 데이터를 바탕으로 구체적이고 실용적인 마케팅 전략을 제안해주세요.\n\n",
        profile.category
    ));

    prompt.push_str("## 업체 정보\n");
    prompt.push_str(&format!("- 업체명: {}\n", profile.name));
    prompt.push_str(&format!("- 업종: {}\n", profile.category));
    if let Some(region) = &profile.region {
        prompt.push_str(&format!("- 지역: {}\n", region));
    }

    prompt.push_str("\n## 리뷰 분석 데이터\n");
    prompt.push_str(&format!("- 총 리뷰 수: {}개\n", summary.total_reviews));
    prompt.push_str(&format!(
        "- 긍정적 리뷰: {}개 ({:.1}%)\n",
        summary.positive_count, summary.positive_ratio
    ));
    prompt.push_str(&format!(
        "- 부정적 리뷰: {}개 ({:.1}%)\n",
        summary.negative_count, summary.negative_ratio
    ));
    prompt.push_str(&format!("- 중립적 리뷰: {}개\n", summary.neutral_count));

    prompt.push_str("\n### 고객들이 좋아하는 점\n");
    prompt.push_str(&keyword_list(&summary.top_positive_keywords));
    prompt.push_str("\n\n### 개선이 필요한 점\n");
    prompt.push_str(&keyword_list(&summary.top_negative_keywords));
    prompt.push_str("\n\n### 주요 리뷰 내용\n");

    for (i, review) in reviews.iter().take(KEY_REVIEWS).enumerate() {
        prompt.push_str(&format!(
            "\n{}. [{}] {}\n   \"{}\"\n",
            i + 1,
            review.polarity(),
            truncate_chars(&review.title, KEY_REVIEW_TITLE_CHARS),
            truncate_chars(&review.content, KEY_REVIEW_CONTENT_CHARS)
        ));
    }

    prompt.push_str(
        r#"

## 요청사항
다음 형식으로 구체적인 마케팅 전략을 제안해주세요:

1. **현재 상황 분석** (2-3줄)
2. **핵심 전략 방향** (3가지)
3. **즉시 실행 가능한 액션 플랜** (구체적인 실행 방법 5가지)
4. **SNS 마케팅 전략** (플랫폼별 구체적 방안)
5. **고객 관리 전략** (리텐션 및 신규 유치)
6. **개선 우선순위** (가장 시급한 3가지)
7. **성과 측정 방법** (KPI 및 목표 수치)

"#,
    );
    prompt.push_str(&format!(
        "마케팅 전략은 실제로 {} 운영자가 바로 적용할 수 있도록 구체적이고 실용적으로 작성해주세요.\n",
        profile.category
    ));
    prompt
}

/// Wrap generated narrative in the report header and footer
pub fn render_ai_report(
    profile: &BusinessProfile,
    model: &str,
    narrative: &str,
    date: NaiveDate,
) -> String {
    format!(
        r#"# 🤖 AI 생성 마케팅 전략 보고서

**생성일**: {date}
**분석 대상**: {name}
**생성 모델**: {model}

---

{narrative}

---

> 💡 **AI 생성 전략**: 이 전략은 AI가 실제 고객 리뷰를 분석하여 생성한 맞춤형 마케팅 전략입니다.
"#,
        date = format_report_date(date),
        name = profile.name,
        model = model,
        narrative = narrative.trim(),
    )
}

/// Improvement line for one of the most frequent negative keywords
fn improvement_item(kc: &KeywordCount) -> String {
    let keyword = kc.keyword.as_str();
    match keyword {
        "더럽" | "청소" | "냄새" => {
            format!("- **청결 관리**: {} 관련 불만 해결을 위한 청소 횟수 증가\n", keyword)
        }
        "불친절" | "직원" => {
            format!("- **서비스 교육**: {} 관련 직원 교육 프로그램 강화\n", keyword)
        }
        "비싸" | "가격" => {
            format!("- **가격 정책**: {} 관련 합리적 요금제 검토\n", keyword)
        }
        _ => format!("- **{} 개선**: 고객 불만 사항 즉시 해결\n", keyword),
    }
}

/// Deterministic report built from the summary alone
pub fn render_rule_based_report(
    profile: &BusinessProfile,
    summary: &SentimentSummary,
    date: NaiveDate,
) -> String {
    let mut report = String::new();

    report.push_str(&format!("# 📊 {} 마케팅 전략 보고서\n\n", profile.name));
    report.push_str(&format!("**생성일**: {}\n", format_report_date(date)));
    if let Some(period) = &profile.analysis_period {
        report.push_str(&format!("**분석 기간**: {}\n", period));
    }
    report.push_str(&format!("**총 리뷰 수**: {}개\n", summary.total_reviews));
    report.push_str("**분석 방식**: 기본 규칙 기반 분석\n\n");

    report.push_str("## 🎯 리뷰 감정 분석 결과\n\n");
    report.push_str("### 전체 감정 분포\n");
    report.push_str(&format!(
        "- **긍정적 리뷰**: {}개 ({:.1}%)\n",
        summary.positive_count, summary.positive_ratio
    ));
    report.push_str(&format!(
        "- **부정적 리뷰**: {}개 ({:.1}%)\n",
        summary.negative_count, summary.negative_ratio
    ));
    report.push_str(&format!(
        "- **중립적 리뷰**: {}개 ({:.1}%)\n\n",
        summary.neutral_count, summary.neutral_ratio
    ));

    let level = summary.satisfaction();
    report.push_str("### 고객 만족도 지표\n");
    report.push_str(&format!(
        "**고객 만족도**: {} {} ({:.1}%)\n\n",
        level.emoji(),
        level.label(),
        summary.positive_ratio
    ));

    if !summary.top_positive_keywords.is_empty() {
        report.push_str("### 🔥 고객들이 가장 좋아하는 점\n");
        for kc in &summary.top_positive_keywords {
            report.push_str(&format!("- **{}**: {}회 언급\n", kc.keyword, kc.count));
        }
        report.push('\n');
    }

    if !summary.top_negative_keywords.is_empty() {
        report.push_str("### ⚠️ 개선이 필요한 점\n");
        for kc in &summary.top_negative_keywords {
            report.push_str(&format!("- **{}**: {}회 언급\n", kc.keyword, kc.count));
        }
        report.push('\n');
    }

    report.push_str("## 🚀 마케팅 전략 제안\n\n### 1. 즉시 실행 가능한 전략\n");

    if summary.positive_ratio > summary.negative_ratio {
        report.push_str(
            r#"
#### 🎯 강점 극대화 전략
- **긍정 리뷰 활용**: 고객 후기를 SNS 및 매장 내 적극 게시
- **입소문 마케팅**: 만족한 고객들의 추천 이벤트 진행
- **리뷰 인센티브**: 네이버/구글 리뷰 작성 고객 대상 할인 혜택
"#,
        );
    } else {
        report.push_str(
            r#"
#### 🔧 개선 우선 전략
- **즉시 개선**: 부정적 피드백 사항 우선 해결
- **고객 소통**: 불만 고객 직접 연락하여 관계 회복
- **서비스 교육**: 직원 친절 서비스 교육 강화
"#,
        );
    }

    report.push_str(
        r#"
### 2. 콘텐츠 마케팅 전략

#### 📱 SNS 활용 방안
- **인스타그램**: 매장 이용 모습 릴스 제작
- **네이버 블로그**: 이용 팁 포스팅
- **유튜브**: 시설 투어 및 이용 가이드 영상

#### 🏷️ 해시태그 전략
"#,
    );
    for tag in profile.hashtags() {
        report.push_str(&format!("- {}\n", tag));
    }

    report.push_str(
        r#"
### 3. 고객 관리 전략

#### 🎁 프로모션 아이디어
- **신규 고객**: 첫 방문 할인 쿠폰
- **단골 고객**: VIP 멤버십 프로그램
- **생일 이벤트**: 생일 기념 무료 이용권
- **리뷰 이벤트**: 포토 리뷰 작성시 다음 방문 할인

#### 📊 고객 피드백 시스템
- **정기 설문**: 월 1회 고객 만족도 조사
- **즉시 대응**: 부정적 리뷰 24시간 내 답변
- **개선 공지**: 고객 건의사항 반영 결과 공유

### 4. 시설 및 서비스 개선 방안
"#,
    );

    if !summary.top_negative_keywords.is_empty() {
        report.push_str("\n#### 🔧 우선 개선 항목\n");
        for kc in summary.top_negative_keywords.iter().take(PRIORITY_ITEMS) {
            report.push_str(&improvement_item(kc));
        }
    }

    report.push_str(
        r#"
### 5. 성과 측정 및 모니터링

#### 📈 KPI 지표
- **리뷰 평점**: 월평균 4.0점 이상 목표
- **긍정 리뷰 비율**: 70% 이상 유지
- **신규 고객 비율**: 월 20% 이상
- **재방문율**: 60% 이상

#### 🔍 모니터링 계획
- **일간**: 새로운 리뷰 확인 및 대응
- **주간**: 고객 만족도 트렌드 분석
- **월간**: 마케팅 성과 평가 및 전략 수정

---

> ⚠️ **참고**: 이 전략은 기본 분석으로 생성되었습니다.
> 더 정교한 AI 전략을 원하시면 LLM API 키를 설정해주세요.
"#,
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Polarity;

    fn profile() -> BusinessProfile {
        BusinessProfile {
            name: "우리끼리 키즈카페 대전문화점".to_string(),
            category: "키즈카페".to_string(),
            region: Some("대전 서구 문화점".to_string()),
            analysis_period: Some("2025년 6월 이후 작성된 리뷰".to_string()),
            hashtags: vec!["#대전키즈카페".to_string(), "#무인키즈카페".to_string()],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()
    }

    fn summary(positive_ratio: f64, negative_ratio: f64) -> SentimentSummary {
        SentimentSummary {
            total_reviews: 10,
            positive_count: (positive_ratio / 10.0) as usize,
            negative_count: (negative_ratio / 10.0) as usize,
            neutral_count: 10 - (positive_ratio / 10.0) as usize - (negative_ratio / 10.0) as usize,
            positive_ratio,
            negative_ratio,
            neutral_ratio: 100.0 - positive_ratio - negative_ratio,
            top_positive_keywords: vec![KeywordCount::new("깨끗", 4), KeywordCount::new("친절", 2)],
            top_negative_keywords: vec![
                KeywordCount::new("더럽", 3),
                KeywordCount::new("비싸", 2),
                KeywordCount::new("불친절", 2),
                KeywordCount::new("좁", 1),
            ],
        }
    }

    #[test]
    fn date_is_formatted_in_korean() {
        assert_eq!(format_report_date(date()), "2025년 06월 12일");
    }

    #[test]
    fn rule_based_report_high_satisfaction() {
        let report = render_rule_based_report(&profile(), &summary(70.0, 20.0), date());
        assert!(report.starts_with("# 📊 우리끼리 키즈카페 대전문화점 마케팅 전략 보고서"));
        assert!(report.contains("**생성일**: 2025년 06월 12일"));
        assert!(report.contains("**분석 기간**: 2025년 6월 이후 작성된 리뷰"));
        assert!(report.contains("**고객 만족도**: 🟢 매우 높음 (70.0%)"));
        assert!(report.contains("강점 극대화 전략"));
        assert!(!report.contains("개선 우선 전략"));
        assert!(report.contains("- **깨끗**: 4회 언급"));
        assert!(report.contains("- #무인키즈카페"));
    }

    #[test]
    fn rule_based_report_low_satisfaction_lists_priorities() {
        let report = render_rule_based_report(&profile(), &summary(30.0, 50.0), date());
        assert!(report.contains("🔴 개선 필요"));
        assert!(report.contains("개선 우선 전략"));
        assert!(report.contains("- **청결 관리**: 더럽 관련"));
        assert!(report.contains("- **가격 정책**: 비싸 관련"));
        assert!(report.contains("- **서비스 교육**: 불친절 관련"));
        // only the top three negatives become priority items
        assert!(!report.contains("**좁 개선**"));
    }

    #[test]
    fn improvement_items_by_category() {
        assert!(improvement_item(&KeywordCount::new("냄새", 2)).starts_with("- **청결 관리**: 냄새"));
        assert!(improvement_item(&KeywordCount::new("직원", 1)).starts_with("- **서비스 교육**: 직원"));
        assert!(improvement_item(&KeywordCount::new("가격", 1)).starts_with("- **가격 정책**: 가격"));
        // outside the three categories, including near-synonyms of the cleanliness words
        assert_eq!(
            improvement_item(&KeywordCount::new("지저분", 1)),
            "- **지저분 개선**: 고객 불만 사항 즉시 해결\n"
        );
    }

    #[test]
    fn rule_based_report_handles_zero_summary() {
        let report =
            render_rule_based_report(&BusinessProfile::new("테스트 카페"), &SentimentSummary::default(), date());
        assert!(report.contains("**총 리뷰 수**: 0개"));
        assert!(report.contains("🔴 개선 필요 (0.0%)"));
        assert!(!report.contains("가장 좋아하는 점"));
        assert!(!report.contains("우선 개선 항목"));
        assert!(report.contains("- #테스트카페"));
    }

    #[test]
    fn prompt_quotes_first_three_reviews_truncated() {
        let mut reviews: Vec<Review> = (0..5)
            .map(|i| Review::new(format!("제목{}", i), "가".repeat(300), format!("l{}", i), ""))
            .collect();
        reviews[0].sentiment = Some(Polarity::Positive);

        let prompt = build_strategy_prompt(&profile(), &summary(60.0, 20.0), &reviews);
        assert!(prompt.contains("- 업체명: 우리끼리 키즈카페 대전문화점"));
        assert!(prompt.contains("- 지역: 대전 서구 문화점"));
        assert!(prompt.contains("깨끗(4회), 친절(2회)"));
        assert!(prompt.contains("1. [positive] 제목0"));
        assert!(prompt.contains("3. [neutral] 제목2"));
        assert!(!prompt.contains("제목3"));
        assert!(prompt.contains(&format!("\"{}\"", "가".repeat(200))));
        assert!(!prompt.contains(&"가".repeat(201)));
    }

    #[test]
    fn ai_report_wraps_narrative() {
        let report = render_ai_report(&profile(), "gemini-1.5-flash", "\n## 전략\n내용\n", date());
        assert!(report.starts_with("# 🤖 AI 생성 마케팅 전략 보고서"));
        assert!(report.contains("**분석 대상**: 우리끼리 키즈카페 대전문화점"));
        assert!(report.contains("**생성 모델**: gemini-1.5-flash"));
        assert!(report.contains("---\n\n## 전략\n내용\n\n---"));
    }

    #[tokio::test]
    async fn generator_without_provider_uses_rules() {
        let generator = StrategyGenerator::new(profile(), None);
        assert_eq!(generator.generate(&[], date()).await, NO_REVIEWS_MESSAGE);

        let mut review = Review::new("좋아요", "", "l", "2025-06-12");
        review.sentiment = Some(Polarity::Positive);
        let report = generator.generate(&[review], date()).await;
        assert!(report.contains("기본 규칙 기반 분석"));
        assert!(report.contains("**긍정적 리뷰**: 1개 (100.0%)"));
    }
}
