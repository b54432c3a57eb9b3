use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulse_core::NewsItem;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::batch::{fetch_in_batches, group_top_ranked, BatchPolicy};
use crate::error::{NewsError, NewsResult};

const BASE_URL: &str = "https://stocknewsapi.com/api/v1";
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// One article as returned by StockNewsAPI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockNewsArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub news_url: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type", default)]
    pub news_type: Option<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Populated by the category endpoint.
    #[serde(default)]
    pub rank_score: Option<Value>,
    /// Populated by the ticker endpoint.
    #[serde(default)]
    pub rankscore: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    data: Option<Vec<StockNewsArticle>>,
}

/// The API sends scores either as numbers or numeric strings.
fn score_value(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn parse_news_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

impl StockNewsArticle {
    pub fn headline_rank(&self) -> f64 {
        score_value(self.rank_score.as_ref())
    }

    pub fn ticker_rank(&self) -> f64 {
        score_value(self.rankscore.as_ref())
    }

    /// Trending headline: always carries a rank score, 0 when the API omits it.
    pub fn into_headline(self) -> NewsItem {
        let rankscore = Some(self.headline_rank());
        NewsItem {
            headline: self.title.unwrap_or_else(|| "No headline available".to_string()),
            description: self.text.unwrap_or_else(|| "No description available".to_string()),
            source: self.source_name.unwrap_or_else(|| "Unknown".to_string()),
            url: self.news_url,
            published: self.date.as_deref().and_then(parse_news_date),
            rankscore,
            news_type: Some(self.news_type.unwrap_or_else(|| "General".to_string())),
            tickers: self.tickers,
        }
    }

    /// Per-ticker article. `None` when the publish date cannot be parsed.
    pub fn into_ticker_item(self) -> Option<NewsItem> {
        let published = match self.date.as_deref().and_then(parse_news_date) {
            Some(d) => d,
            None => {
                tracing::warn!(
                    "Invalid date format for {:?}: {:?}, skipping article",
                    self.title,
                    self.date
                );
                return None;
            }
        };
        Some(NewsItem {
            headline: self.title.unwrap_or_else(|| "No title".to_string()).trim().to_string(),
            description: self.text.unwrap_or_else(|| "No description".to_string()).trim().to_string(),
            source: self.source_name.unwrap_or_else(|| "Unknown".to_string()),
            url: self.news_url,
            published: Some(published),
            rankscore: None,
            news_type: self.news_type,
            tickers: self.tickers,
        })
    }
}

pub(crate) fn top_headlines_url(limit: usize, days: Option<u32>) -> String {
    let days = days.map(|d| format!("&days={}", d)).unwrap_or_default();
    format!(
        "{}/category?section=general&items={}&sortby=rank{}&extra-fields=id,eventid,rankscore&page=1",
        BASE_URL, limit, days
    )
}

pub(crate) fn ticker_news_url(tickers: &[String], items: usize) -> String {
    format!("{}?tickers={}&items={}&page=1", BASE_URL, tickers.join(","), items)
}

#[derive(Clone)]
pub struct StockNewsClient {
    api_key: String,
    client: Client,
    policy: BatchPolicy,
}

impl StockNewsClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key,
            client,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn get_articles(&self, url: &str) -> NewsResult<Vec<StockNewsArticle>> {
        let resp = self
            .client
            .get(url)
            .query(&[("token", &self.api_key)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(NewsError::Status(resp.status().as_u16()));
        }

        let body: NewsResponse = resp.json().await?;
        body.data.ok_or(NewsError::MissingData)
    }

    /// Top-ranked general market headlines, optionally over the last `days`.
    pub async fn fetch_top_headlines(&self, limit: usize, days: Option<u32>) -> NewsResult<Vec<NewsItem>> {
        let articles = self.get_articles(&top_headlines_url(limit, days)).await?;
        tracing::info!("Fetched {} top headlines", articles.len());
        Ok(articles.into_iter().map(StockNewsArticle::into_headline).collect())
    }

    /// Best-ranked articles per requested ticker, fetched in shrinking batches.
    pub async fn fetch_ticker_news(
        &self,
        tickers: &[String],
        items: usize,
    ) -> NewsResult<BTreeMap<String, Vec<NewsItem>>> {
        let wanted: HashSet<String> = tickers.iter().cloned().collect();
        let articles = fetch_in_batches(tickers, &self.policy, |batch| async move {
            self.get_articles(&ticker_news_url(&batch, items)).await
        })
        .await?;
        Ok(group_top_ranked(articles, &wanted))
    }
}
