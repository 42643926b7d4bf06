use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use common::{sleep_millis, PolitenessConfig, ScraperConfig};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::review::Review;

pub const DEFAULT_SEARCH_URL: &str = "https://search.naver.com/search.naver";
pub const DEFAULT_LINK_FILTER: &str = "blog.naver.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const SEARCH_REFERER: &str = "https://www.naver.com";

const SEARCH_RESULT_SELECTOR: &str = ".total_tit a.link_tit";

/// Tried in order; the first element mentioning an accepted year wins
const DATE_SELECTORS: &[&str] = &[
    "span.se_publishDate",
    "span.se_publish_time",
    "span.date",
    ".post_date",
    ".blog_date",
    ".date",
    ".time",
    "[class*=\"date\"]",
    "[class*=\"time\"]",
    ".post-date",
];

/// Tried in order; the first element with enough text wins
const CONTENT_SELECTORS: &[&str] = &[
    "div.se-main-container",
    "div#postViewArea",
    "div.se_component_wrap",
    ".post_content",
    ".blog_content",
    ".content",
    "article",
    "[class*=\"content\"]",
    "[class*=\"post\"]",
];

const TITLE_SELECTOR: &str = "title, h1, .title";
const MIN_CONTENT_CHARS: usize = 100;
pub const NO_CONTENT: &str = "No content available";

/// One result link on a search page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
}

/// What could be read from a blog post page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    pub date: Option<String>,
    pub content: String,
}

/// Resolved scraper knobs (config values with defaults applied)
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub search_url: String,
    pub max_pages: u32,
    pub items_per_page: usize,
    pub link_filter: String,
    pub accepted_years: Vec<String>,
    pub content_max_chars: usize,
    pub fallback_date: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub item_delay_ms: (u64, u64),
    pub page_delay_ms: (u64, u64),
}

impl ScrapeSettings {
    /// Defaults accept posts from the current and previous year, and date
    /// undated posts to `today`.
    pub fn from_config(
        scraper: Option<&ScraperConfig>,
        politeness: Option<&PolitenessConfig>,
        today: NaiveDate,
    ) -> Self {
        let accepted_years = scraper
            .and_then(|s| s.accepted_years.clone())
            .unwrap_or_else(|| vec![(today.year() - 1).to_string(), today.year().to_string()]);

        let item_delay_ms = (
            politeness.and_then(|p| p.item_delay_min_ms).unwrap_or(1000),
            politeness.and_then(|p| p.item_delay_max_ms).unwrap_or(2000),
        );
        let page_delay_ms = (
            politeness.and_then(|p| p.page_delay_min_ms).unwrap_or(2000),
            politeness.and_then(|p| p.page_delay_max_ms).unwrap_or(3000),
        );

        Self {
            search_url: scraper
                .and_then(|s| s.search_url.clone())
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            max_pages: scraper.and_then(|s| s.max_pages).unwrap_or(2),
            items_per_page: scraper.and_then(|s| s.items_per_page).unwrap_or(5),
            link_filter: scraper
                .and_then(|s| s.link_filter.clone())
                .unwrap_or_else(|| DEFAULT_LINK_FILTER.to_string()),
            accepted_years,
            content_max_chars: scraper.and_then(|s| s.content_max_chars).unwrap_or(500),
            fallback_date: scraper
                .and_then(|s| s.fallback_date.clone())
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            timeout: Duration::from_secs(
                politeness.and_then(|p| p.fetch_timeout_seconds).unwrap_or(10),
            ),
            user_agent: politeness
                .and_then(|p| p.user_agent.clone())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            item_delay_ms,
            page_delay_ms,
        }
    }
}

/// Search-engine blog scraper
pub struct BlogScraper {
    client: Client,
    settings: ScrapeSettings,
}

impl BlogScraper {
    pub fn new(settings: ScrapeSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.8,en-US;q=0.5,en;q=0.3"),
        );

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { client, settings })
    }

    /// Search URL for a 1-based result page (10 results per page)
    pub fn search_page_url(&self, keyword: &str, page: u32) -> Result<url::Url> {
        let start = (page.saturating_sub(1)) * 10 + 1;
        url::Url::parse_with_params(
            &self.settings.search_url,
            &[
                ("where", "post"),
                ("sm", "tab_jum"),
                ("query", keyword),
                ("start", &start.to_string()),
            ],
        )
        .with_context(|| format!("invalid search url: {}", self.settings.search_url))
    }

    async fn fetch_html(&self, url: &str, referer: Option<&str>) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await.context("failed to fetch page")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("fetch of {} failed with status: {}", url, status);
        }
        response.text().await.context("failed to read response body")
    }

    /// Fetch one blog post and extract its date and text
    pub async fn fetch_post(&self, link: &str) -> Result<BlogPost> {
        let html = self.fetch_html(link, None).await?;
        Ok(extract_post(&html, &self.settings.accepted_years))
    }

    /// Crawl every configured result page for one search keyword.
    /// Page and post failures are logged and skipped.
    pub async fn crawl_keyword(&self, keyword: &str) -> Vec<Review> {
        let mut reviews = Vec::new();

        for page in 1..=self.settings.max_pages {
            info!(keyword, page, "crawling search page");

            match self.crawl_page(keyword, page).await {
                Ok(mut found) => reviews.append(&mut found),
                Err(e) => warn!(keyword, page, "search page failed: {:#}", e),
            }

            if page < self.settings.max_pages {
                sleep_millis(jitter(self.settings.page_delay_ms)).await;
            }
        }

        reviews
    }

    async fn crawl_page(&self, keyword: &str, page: u32) -> Result<Vec<Review>> {
        let url = self.search_page_url(keyword, page)?;
        let html = self.fetch_html(url.as_str(), Some(SEARCH_REFERER)).await?;
        let hits = parse_search_results(
            &html,
            self.settings.items_per_page,
            &self.settings.link_filter,
        );
        info!(keyword, page, hits = hits.len(), "parsed search results");

        let mut reviews = Vec::new();
        for (i, hit) in hits.iter().enumerate() {
            if i > 0 {
                sleep_millis(jitter(self.settings.item_delay_ms)).await;
            }

            match self.fetch_post(&hit.link).await {
                Ok(post) => match build_review(hit, post, &self.settings) {
                    Some(review) => {
                        debug!(link = %review.link, date = %review.date, "added review");
                        reviews.push(review);
                    }
                    None => debug!(link = %hit.link, "post date outside accepted years"),
                },
                Err(e) => warn!(link = %hit.link, "failed to read post: {:#}", e),
            }
        }
        Ok(reviews)
    }
}

/// Crawl several keywords, keeping the first review seen for each link.
pub async fn crawl_keywords<S: AsRef<str>>(scraper: &BlogScraper, keywords: &[S]) -> Vec<Review> {
    let mut seen = HashSet::new();
    let mut all = Vec::new();

    for keyword in keywords {
        let keyword = keyword.as_ref();
        let found = scraper.crawl_keyword(keyword).await;
        let before = all.len();
        for review in found {
            if seen.insert(review.link.clone()) {
                all.push(review);
            }
        }
        info!(keyword, added = all.len() - before, total = all.len(), "keyword crawled");
    }

    all
}

fn jitter((min, max): (u64, u64)) -> u64 {
    let (lo, hi) = (min.min(max), min.max(max));
    if lo == hi {
        return lo;
    }
    rand::thread_rng().gen_range(lo..=hi)
}

fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Result links from a search page. Only the first `limit` anchors are
/// considered; anchors without title or link, or whose link lacks
/// `link_filter`, are dropped.
pub fn parse_search_results(html: &str, limit: usize, link_filter: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(SEARCH_RESULT_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .take(limit)
        .filter_map(|anchor| {
            let title = anchor
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| element_text(&anchor));
            let link = anchor.value().attr("href").unwrap_or("").trim().to_string();

            if title.is_empty() || link.is_empty() {
                debug!("search hit without title or link skipped");
                return None;
            }
            if !link.contains(link_filter) {
                debug!(%link, "search hit outside link filter skipped");
                return None;
            }
            Some(SearchHit { title, link })
        })
        .collect()
}

/// Date and main text of a blog post page
pub fn extract_post(html: &str, accepted_years: &[String]) -> BlogPost {
    let document = Html::parse_document(html);

    let date = first_text(&document, DATE_SELECTORS, |text| {
        accepted_years.iter().any(|year| text.contains(year.as_str()))
    });

    let content = first_text(&document, CONTENT_SELECTORS, |text| {
        text.chars().count() > MIN_CONTENT_CHARS
    })
    .or_else(|| first_text(&document, &[TITLE_SELECTOR], |text| !text.is_empty()))
    .unwrap_or_else(|| NO_CONTENT.to_string());

    BlogPost { date, content }
}

fn first_text<F>(document: &Html, selectors: &[&str], accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            warn!(selector = raw, "invalid selector");
            continue;
        };
        for element in document.select(&selector) {
            let text = element_text(&element);
            if !text.is_empty() && accept(&text) {
                return Some(text);
            }
        }
    }
    None
}

/// Normalize blog date strings such as `2025.06.12`, `2025. 6. 12. 14:30`
/// or `2025/06/12` to `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> String {
    let groups: Vec<&str> = raw
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .collect();

    for window in groups.windows(3) {
        if window[0].len() != 4 {
            continue;
        }
        if let (Ok(y), Ok(m), Ok(d)) = (
            window[0].parse::<i32>(),
            window[1].parse::<u32>(),
            window[2].parse::<u32>(),
        ) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }

    raw.replace(['.', '/'], "-")
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

/// Turn a fetched post into a review, or `None` when its date is out of range.
fn build_review(hit: &SearchHit, post: BlogPost, settings: &ScrapeSettings) -> Option<Review> {
    let date = post
        .date
        .as_deref()
        .map(normalize_date)
        .unwrap_or_else(|| settings.fallback_date.clone());

    if !settings
        .accepted_years
        .iter()
        .any(|year| date.contains(year.as_str()))
    {
        return None;
    }

    let content: String = post.content.chars().take(settings.content_max_chars).collect();
    Some(Review::new(hit.title.clone(), content, hit.link.clone(), date))
}
