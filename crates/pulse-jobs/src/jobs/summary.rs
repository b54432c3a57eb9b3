use anyhow::Result;
use chrono::{Duration, Utc};
use chrono_tz::US::Eastern;
use news_client::format_market_analysis;
use polygon_client::{format_index_snapshot, IndexSnapshot, PolygonClient};
use pulse_core::{MacdReading, MarketTicker, TechnicalSnapshot};
use pulse_store::StoreDb;
use strategy_engine::{fetch_snapshot, PrequalifiedStock};
use summarizer::{
    daily_recap, extract_key_points, summarize_stock, weekly_recap, LlmClient, StockSummaryInput,
    SUMMARY_MAX_AGE_HOURS,
};

use crate::context::JobContext;
use crate::jobs::news::ticker_news;

const SUMMARY_HEADLINES: usize = 3;
const SUMMARY_NEWS_DAYS: i64 = 1;
const RECAP_HEADLINES: usize = 20;
const WEEKLY_LOOKBACK_DAYS: i64 = 7;
const WEEKEND_NEWS_DAYS: u32 = 2;

/// Refresh saved stocks and write a model summary for each one whose
/// summary is missing or older than the freshness window.
pub async fn summarize(ctx: &JobContext) -> Result<usize> {
    let polygon = ctx.polygon()?;
    let llm = ctx.llm()?;

    if let Err(e) = ticker_news(ctx).await {
        tracing::warn!("Ticker news refresh failed: {}", e);
    }

    let symbols = ctx.db.tracked_symbols().await?;
    let mut written = 0;

    for symbol in &symbols {
        match summarize_one(&ctx.db, &polygon, llm, symbol).await {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to summarize {}: {}", symbol, e),
        }
    }

    tracing::info!("Wrote {} summaries for {} saved stocks", written, symbols.len());
    Ok(written)
}

async fn summarize_one(db: &StoreDb, polygon: &PolygonClient, llm: &LlmClient, symbol: &str) -> Result<bool> {
    let now = Utc::now();
    let ticker = polygon.get_snapshot(symbol).await?;
    db.upsert_ticker_snapshot(&ticker, now).await?;

    if db.summary_is_fresh(symbol, now, Duration::hours(SUMMARY_MAX_AGE_HOURS)).await? {
        tracing::debug!("Summary for {} is fresh", symbol);
        return Ok(false);
    }

    let technicals = match fetch_snapshot(polygon, &PrequalifiedStock::from(&ticker)).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Technicals unavailable for {}: {}", symbol, e);
            TechnicalSnapshot::new(symbol, ticker.price)
        }
    };
    let (sma50, sma200) = polygon.get_moving_averages(symbol).await.unwrap_or_else(|e| {
        tracing::warn!("Moving averages unavailable for {}: {}", symbol, e);
        (None, None)
    });

    let headlines = db
        .recent_news_for(symbol, now - Duration::days(SUMMARY_NEWS_DAYS))
        .await?
        .into_iter()
        .take(SUMMARY_HEADLINES)
        .map(|n| format!("{}: {}", n.headline, n.description.unwrap_or_default()))
        .collect();

    let input = summary_input(&ticker, &technicals, sma50, sma200, headlines);
    let text = summarize_stock(llm, &input).await?;
    db.save_summary(symbol, &text, now).await?;
    Ok(true)
}

fn summary_input(
    ticker: &MarketTicker,
    technicals: &TechnicalSnapshot,
    sma50: Option<f64>,
    sma200: Option<f64>,
    headlines: Vec<String>,
) -> StockSummaryInput {
    StockSummaryInput {
        symbol: ticker.symbol.clone(),
        price: ticker.price,
        change_percent: ticker.change_pct_or_flat(),
        volume: ticker.volume,
        headlines,
        rsi: technicals.rsi,
        sma50,
        sma200,
        macd: MacdReading {
            macd: technicals.macd,
            signal: technicals.signal,
            histogram: technicals.histogram,
        },
        rvol: technicals.rvol,
        support: technicals.support,
        resistance: technicals.resistance,
    }
}

/// Split ETF rows into (broad indices, sector funds), each formatted for the prompt.
pub fn index_sections(rows: &[IndexSnapshot]) -> (String, String) {
    let (sectors, indices): (Vec<IndexSnapshot>, Vec<IndexSnapshot>) =
        rows.iter().cloned().partition(IndexSnapshot::is_sector_fund);
    (format_index_snapshot(&indices), format_index_snapshot(&sectors))
}

/// Daily recap from trending headlines and the ETF snapshot. Key points are
/// stored under today's US/Eastern date.
pub async fn recap(ctx: &JobContext) -> Result<String> {
    let polygon = ctx.polygon()?;
    let llm = ctx.llm()?;
    let news = ctx.news()?;

    let headlines = news.fetch_top_headlines(RECAP_HEADLINES, None).await?;
    let analysis = format_market_analysis(&headlines);

    let rows = polygon.get_index_snapshot().await;
    let (indices, sectors) = index_sections(&rows);

    let text = daily_recap(llm, &analysis, &indices, &sectors).await?;
    let key_points = extract_key_points(&text);

    let today = Utc::now().with_timezone(&Eastern).date_naive();
    ctx.db.store_market_summary(today, &key_points).await?;
    tracing::info!("Stored market key points for {}", today);

    Ok(text)
}

/// Weekend look-ahead built from the past week's key points.
pub async fn weekly(ctx: &JobContext) -> Result<String> {
    let llm = ctx.llm()?;
    let news = ctx.news()?;

    let headlines = news.fetch_top_headlines(RECAP_HEADLINES, Some(WEEKEND_NEWS_DAYS)).await?;
    let analysis = format_market_analysis(&headlines);

    let today = Utc::now().with_timezone(&Eastern).date_naive();
    let past = ctx.db.recent_key_points(today, WEEKLY_LOOKBACK_DAYS).await?;
    tracing::info!("Weekly recap from {} stored summaries", past.len());

    Ok(weekly_recap(llm, &past, &analysis).await?)
}
