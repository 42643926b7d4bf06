use chrono::NaiveDate;
use common::Config;
use mockito::{Matcher, ServerGuard};
use std::path::Path;

use reviewscope::pipeline::Pipeline;
use reviewscope::sentiment::Polarity;
use reviewscope::storage;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()
}

fn search_page(base: &str) -> String {
    format!(
        r#"<html><body>
          <div class="total_tit"><a class="link_tit" href="{base}/blog/1" title="대전 키즈카페 첫 방문">x</a></div>
          <div class="total_tit"><a class="link_tit" href="{base}/cafe/9">카페 글</a></div>
          <div class="total_tit"><a class="link_tit" href="{base}/blog/2">아쉬운 방문</a></div>
          <div class="total_tit"><a class="link_tit" href="{base}/blog/3">삭제된 글</a></div>
        </body></html>"#
    )
}

fn post_page(date: Option<&str>, body: &str) -> String {
    let date = date
        .map(|d| format!(r#"<span class="se_publishDate">{}</span>"#, d))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>블로그</title></head><body>{}<div class="se-main-container">{}</div></body></html>"#,
        date, body
    )
}

/// Search endpoint plus three posts: one positive and dated, one negative
/// without a date, one that fails to load.
async fn mock_site(server: &mut ServerGuard) {
    let base = server.url();
    server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("where".into(), "post".into()))
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(search_page(&base))
        .create_async()
        .await;
    server
        .mock("GET", "/blog/1")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(post_page(
            Some("2025. 6. 12. 14:30"),
            &"시설이 깨끗하고 넓어요. 아이들이 좋아요. 추천합니다. ".repeat(5),
        ))
        .create_async()
        .await;
    server
        .mock("GET", "/blog/2")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(post_page(None, &"가격이 비싸고 별로였어요. 실망입니다. ".repeat(6)))
        .create_async()
        .await;
    server
        .mock("GET", "/blog/3")
        .with_status(500)
        .create_async()
        .await;
}

async fn load_config(server_url: &str, out: &Path) -> Config {
    let path = out.join("config.toml");
    let toml = format!(
        r#"
        [business]
        name = "우리끼리 키즈카페 대전문화점"
        category = "무인 키즈카페"

        [scraper]
        search_url = "{server_url}/search"
        keywords = ["우리끼리 키즈카페", "우리끼리 대전"]
        max_pages = 1
        link_filter = "/blog/"
        accepted_years = ["2025"]
        fallback_date = "2025-06-10"

        [politeness]
        fetch_timeout_seconds = 5
        item_delay_min_ms = 0
        item_delay_max_ms = 0
        page_delay_min_ms = 0
        page_delay_max_ms = 0

        [llm]
        adapter = "none"

        [output]
        reviews_dir = '{reviews}'
        strategies_dir = '{strategies}'
        "#,
        reviews = out.join("reviews").display(),
        strategies = out.join("strategies").display(),
    );
    std::fs::write(&path, toml).expect("write config");
    Config::load_with_defaults(None, Some(path.as_path()))
        .await
        .expect("load config")
}

#[tokio::test]
async fn full_run_writes_reviews_summary_and_strategy() {
    let mut server = mockito::Server::new_async().await;
    mock_site(&mut server).await;
    let out = tempfile::tempdir().expect("tempdir");
    let config = load_config(&server.url(), out.path()).await;

    let pipeline = Pipeline::new(config, None);
    let output = pipeline.run(date()).await.expect("run");

    // both keywords return the same links; each post is kept once
    assert_eq!(output.summary.total_reviews, 2);
    assert_eq!(output.summary.positive_count, 1);
    assert_eq!(output.summary.negative_count, 1);
    assert_eq!(output.summary.positive_ratio, 50.0);

    let reviews = storage::load_reviews(&output.reviews_path).await.expect("load");
    assert_eq!(output.reviews_path, out.path().join("reviews").join("2025-06-12.json"));
    assert_eq!(reviews[0].title, "대전 키즈카페 첫 방문");
    assert_eq!(reviews[0].date, "2025-06-12");
    assert_eq!(reviews[0].sentiment, Some(Polarity::Positive));
    assert_eq!(reviews[1].title, "아쉬운 방문");
    assert_eq!(reviews[1].date, "2025-06-10");
    assert_eq!(reviews[1].sentiment, Some(Polarity::Negative));
    assert!(reviews.iter().all(|r| r.content.chars().count() <= 500));

    let summary_json = std::fs::read_to_string(&output.summary_path).expect("summary");
    assert!(summary_json.contains("\"total_reviews\": 2"));

    assert!(output.strategy_path.ends_with("2025-06-12_marketing_strategy.md"));
    let report = std::fs::read_to_string(&output.strategy_path).expect("report");
    assert!(report.starts_with("# 📊 우리끼리 키즈카페 대전문화점 마케팅 전략 보고서"));
    assert!(report.contains("**총 리뷰 수**: 2개"));
}

#[tokio::test]
async fn crawl_then_analyze_then_strategy() {
    let mut server = mockito::Server::new_async().await;
    mock_site(&mut server).await;
    let out = tempfile::tempdir().expect("tempdir");
    let config = load_config(&server.url(), out.path()).await;
    let pipeline = Pipeline::new(config, None);

    let (crawled, path) = pipeline.crawl(date()).await.expect("crawl");
    assert_eq!(crawled.len(), 2);
    let raw = std::fs::read_to_string(&path).expect("read crawled");
    assert!(!raw.contains("sentiment"));

    let (annotated, summary, summary_path) = pipeline.analyze(date(), None).await.expect("analyze");
    assert_eq!(annotated.len(), 2);
    assert_eq!(summary.negative_count, 1);
    assert!(summary_path.ends_with("2025-06-12_summary.json"));

    // annotations are written back into the crawled file
    let raw = std::fs::read_to_string(&path).expect("read annotated");
    assert!(raw.contains("\"sentiment\": \"positive\""));
    assert!(raw.contains("\"sentiment_reasoning\""));

    let report_path = pipeline.strategy(date(), None).await.expect("strategy");
    let report = std::fs::read_to_string(report_path).expect("report");
    assert!(report.contains("기본 규칙 기반 분석"));
}

#[tokio::test]
async fn strategy_without_review_file_is_an_error() {
    let out = tempfile::tempdir().expect("tempdir");
    let config = load_config("http://127.0.0.1:9", out.path()).await;
    let pipeline = Pipeline::new(config, None);

    let err = pipeline.strategy(date(), None).await.unwrap_err();
    assert!(err.to_string().contains("run `crawl` first"));
}
