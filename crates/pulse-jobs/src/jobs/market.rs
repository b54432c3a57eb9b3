use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use polygon_client::{MoverDirection, PolygonClient};
use pulse_core::{MarketTicker, TechnicalSnapshot};
use pulse_store::{StoreDb, StoredSetup, CATEGORY_GAINER, CATEGORY_LOSER};
use std::sync::Arc;
use strategy_engine::{
    breakout_prefilter, collect_technicals, get_prequalified_stocks, score_strategy_matches, top_movers, top_traded,
    PrequalifiedStock, PrescreenCriteria, Screen, BREAKOUT_LIMIT, MOVERS_LIMIT, TOP_TRADED_LIMIT,
};

use crate::context::JobContext;

/// Articles and look-back used when attaching polygon news to a ticker.
const TICKER_NEWS_LIMIT: u32 = 5;
const TICKER_NEWS_DAYS: i64 = 10;
/// Saved stocks refetch news at most this often.
const NEWS_REFRESH_HOURS: i64 = 5;

/// Output of the strategy scan: what each screen kept, and what was stored.
pub struct ScanOutcome {
    pub screens: Vec<(Screen, Vec<TechnicalSnapshot>)>,
    pub stored: Vec<StoredSetup>,
}

pub async fn scan(ctx: &JobContext, max_workers: usize) -> Result<ScanOutcome> {
    let polygon = ctx.polygon()?;
    let snapshot = polygon.get_snapshot_all().await?;

    let prequalified = get_prequalified_stocks(&snapshot, &PrescreenCriteria::scan());
    tracing::info!("{} of {} tickers prequalified", prequalified.len(), snapshot.len());

    let technicals = collect_technicals(polygon, &prequalified, max_workers).await;

    let screens = Screen::ALL
        .iter()
        .map(|screen| {
            let hits = screen.run(&technicals).into_iter().cloned().collect();
            (*screen, hits)
        })
        .collect();

    let scored = score_strategy_matches(&technicals);
    let stored = ctx.db.upsert_strategy_setups(&scored, Utc::now()).await?;
    tracing::info!("Stored {} strategy setups", stored.len());

    Ok(ScanOutcome { screens, stored })
}

pub async fn movers(ctx: &JobContext) -> Result<usize> {
    let polygon = ctx.polygon()?;
    let now = Utc::now();
    let mut stored = 0;

    for (direction, category) in [
        (MoverDirection::Gainers, CATEGORY_GAINER),
        (MoverDirection::Losers, CATEGORY_LOSER),
    ] {
        let listed = match polygon.get_gainers_losers(direction).await {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", direction.as_str(), e);
                continue;
            }
        };
        let top = top_movers(&listed, direction, MOVERS_LIMIT);
        stored += ctx.db.upsert_movers(&top, category, now).await?;
    }

    tracing::info!("Stored {} gainers/losers", stored);
    Ok(stored)
}

/// Most-traded names from `snapshot` (fetched when not supplied), stored with news.
pub async fn top_traded_stocks(ctx: &JobContext, snapshot: Option<&[MarketTicker]>) -> Result<Vec<MarketTicker>> {
    let polygon = ctx.polygon()?;
    let fetched;
    let snapshot = match snapshot {
        Some(s) => s,
        None => {
            fetched = polygon.get_snapshot_all().await?;
            &fetched
        }
    };

    let top = top_traded(snapshot, TOP_TRADED_LIMIT);
    ctx.db.refresh_top_traded(&top, Utc::now()).await?;

    let symbols: Vec<&str> = top.iter().map(|t| t.symbol.as_str()).collect();
    attach_polygon_news(&ctx.db, &polygon, &symbols).await;

    tracing::info!("Stored {} top traded stocks", top.len());
    Ok(top)
}

pub async fn breakouts(ctx: &JobContext, snapshot: Option<&[MarketTicker]>) -> Result<Vec<TechnicalSnapshot>> {
    let polygon = ctx.polygon()?;
    let fetched;
    let snapshot = match snapshot {
        Some(s) => s,
        None => {
            fetched = polygon.get_snapshot_all().await?;
            &fetched
        }
    };

    let candidates: Vec<PrequalifiedStock> = breakout_prefilter(snapshot)
        .into_iter()
        .map(PrequalifiedStock::from)
        .collect();
    tracing::info!("{} breakout candidates after prefilter", candidates.len());

    let technicals = collect_technicals(Arc::clone(&polygon), &candidates, ctx.config.scan_max_workers).await;
    let found: Vec<TechnicalSnapshot> = Screen::Breakout
        .run(&technicals)
        .into_iter()
        .take(BREAKOUT_LIMIT)
        .cloned()
        .collect();

    ctx.db.refresh_breakouts(&found, Utc::now()).await?;

    let symbols: Vec<&str> = found.iter().map(|s| s.symbol.as_str()).collect();
    attach_polygon_news(&ctx.db, &polygon, &symbols).await;

    tracing::info!("Stored {} breakouts", found.len());
    Ok(found)
}

/// Refresh every saved stock's quote, and its news when last fetched over an hour ago.
pub async fn refresh_saved(ctx: &JobContext) -> Result<usize> {
    let polygon = ctx.polygon()?;
    let symbols = ctx.db.tracked_symbols().await?;
    let mut refreshed = 0;

    for symbol in &symbols {
        match refresh_one(&ctx.db, &polygon, symbol).await {
            Ok(()) => refreshed += 1,
            Err(e) => tracing::warn!("Failed to refresh {}: {}", symbol, e),
        }
    }

    tracing::info!("Refreshed {}/{} saved stocks", refreshed, symbols.len());
    Ok(refreshed)
}

/// News fetched after this instant is fresh enough to skip.
pub fn news_refresh_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(NEWS_REFRESH_HOURS)
}

async fn refresh_one(db: &StoreDb, polygon: &PolygonClient, symbol: &str) -> Result<()> {
    let now = Utc::now();
    let ticker = polygon.get_snapshot(symbol).await?;
    db.upsert_ticker_snapshot(&ticker, now).await?;

    if db.news_fetched_since(symbol, news_refresh_cutoff(now)).await? {
        tracing::debug!("News for {} is recent, skipping", symbol);
        return Ok(());
    }

    let news = polygon.get_news_for_ticker(symbol, TICKER_NEWS_LIMIT, TICKER_NEWS_DAYS).await?;
    if !news.is_empty() {
        let added = db.insert_news_batch(&news, Some(symbol)).await?;
        db.mark_news_fetched(symbol, now).await?;
        tracing::debug!("Added {} articles for {}", added, symbol);
    }
    Ok(())
}

async fn attach_polygon_news(db: &StoreDb, polygon: &PolygonClient, symbols: &[&str]) {
    for symbol in symbols {
        let news = match polygon.get_news_for_ticker(symbol, TICKER_NEWS_LIMIT, TICKER_NEWS_DAYS).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Failed to fetch news for {}: {}", symbol, e);
                continue;
            }
        };
        if let Err(e) = db.insert_news_batch(&news, Some(symbol)).await {
            tracing::warn!("Failed to store news for {}: {}", symbol, e);
        }
    }
}
