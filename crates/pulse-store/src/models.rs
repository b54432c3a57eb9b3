use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strategy_engine::ScoredSetup;

pub const CATEGORY_STRATEGY: &str = "strategy";
pub const CATEGORY_TOP_TRADED: &str = "top_traded";
pub const CATEGORY_BREAKOUT: &str = "breakout";
pub const CATEGORY_GAINER: &str = "gainer";
pub const CATEGORY_LOSER: &str = "loser";
pub const CATEGORY_NEUTRAL: &str = "neutral";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockRow {
    pub id: i64,
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    pub change_amount: Option<f64>,
    pub volume: Option<f64>,
    pub rsi: Option<f64>,
    pub category: Option<String>,
    pub summary_text: Option<String>,
    pub summary_last_updated: Option<DateTime<Utc>>,
    pub strategy_tags: Option<String>,
    pub strategy_score: Option<i64>,
    pub strategy_label: Option<String>,
    pub sentiment: Option<String>,
    pub confidence_score: Option<i64>,
    pub days_in_a_row: Option<i64>,
    /// Last date a scan stored a setup for this row. Only the strategy upsert writes it.
    pub strategy_last_seen: Option<NaiveDate>,
    pub last_updated: Option<DateTime<Utc>>,
    pub date_fetched: Option<DateTime<Utc>>,
}

impl StockRow {
    pub fn categories(&self) -> BTreeSet<String> {
        parse_categories(self.category.as_deref())
    }

    pub fn has_strategy_tags(&self) -> bool {
        self.strategy_tags.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NewsRow {
    pub id: i64,
    pub symbol: Option<String>,
    pub headline: String,
    pub description: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub rankscore: Option<f64>,
    pub news_type: Option<String>,
    pub date_published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketSummary {
    pub id: i64,
    pub summary_date: NaiveDate,
    pub key_points: String,
}

/// A scored setup as persisted, with the streak and confidence it was
/// stored with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSetup {
    pub setup: ScoredSetup,
    pub days_in_a_row: u32,
    pub confidence_score: i32,
}

pub fn parse_categories(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_categories(categories: &BTreeSet<String>) -> String {
    categories.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}
