use anyhow::Result;
use chrono::Utc;
use news_client::match_tickers;

use crate::context::JobContext;

const TOP_HEADLINES_LIMIT: usize = 100;
const TICKER_NEWS_ITEMS: usize = 50;

/// Replace the trending headlines, tagging each with the first known symbol it mentions.
pub async fn top_news(ctx: &JobContext) -> Result<usize> {
    let news = ctx.news()?;

    let removed = ctx.db.delete_trending_news().await?;
    tracing::info!("Removed {} old trending articles", removed);

    let headlines = news.fetch_top_headlines(TOP_HEADLINES_LIMIT, None).await?;
    let known = ctx.db.all_symbols().await?;

    let mut stored = 0;
    for item in &headlines {
        let matched = match_tickers(item, &known);
        let symbol = matched.first().map(String::as_str);
        if ctx.db.insert_news(item, symbol).await? {
            stored += 1;
        }
    }

    tracing::info!("Stored {}/{} top headlines", stored, headlines.len());
    Ok(stored)
}

/// Bulk ticker news for every saved symbol.
pub async fn ticker_news(ctx: &JobContext) -> Result<usize> {
    let news = ctx.news()?;
    let symbols = ctx.db.tracked_symbols().await?;
    if symbols.is_empty() {
        tracing::warn!("No saved stocks, skipping ticker news");
        return Ok(0);
    }

    let grouped = news.fetch_ticker_news(&symbols, TICKER_NEWS_ITEMS).await?;

    let mut stored = 0;
    for (symbol, items) in &grouped {
        match ctx.db.insert_news_batch(items, Some(symbol)).await {
            Ok(n) => stored += n,
            Err(e) => tracing::warn!("Failed to store news for {}: {}", symbol, e),
        }
    }

    tracing::info!("Stored {} ticker articles for {} symbols", stored, grouped.len());
    Ok(stored)
}

pub async fn prune_news(ctx: &JobContext, days: i64) -> Result<u64> {
    ctx.db.delete_news_older_than(days, Utc::now()).await
}
