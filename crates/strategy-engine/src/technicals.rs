use std::sync::Arc;

use chrono::{Duration, Utc};
use pulse_core::{MarketDataSource, PulseError, TechnicalSnapshot};
use tokio::sync::Semaphore;

use crate::indicators::{relative_volume, support_resistance, LEVELS_LOOKBACK_DAYS, RVOL_LOOKBACK_DAYS};
use crate::prescreen::PrequalifiedStock;

pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Fetch indicators for every pre-qualified stock with at most `max_workers`
/// requests in flight. Failed symbols are logged and left out; the rest keep
/// input order.
pub async fn collect_technicals<S>(
    source: Arc<S>,
    stocks: &[PrequalifiedStock],
    max_workers: usize,
) -> Vec<TechnicalSnapshot>
where
    S: MarketDataSource + ?Sized + 'static,
{
    let total = stocks.len();
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut handles = Vec::with_capacity(total);

    for stock in stocks.iter().cloned() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };
            match fetch_snapshot(source.as_ref(), &stock).await {
                Ok(snap) => Some(snap),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", stock.symbol, e);
                    None
                }
            }
        });
        handles.push(handle);
    }

    let mut snapshots = Vec::with_capacity(total);
    for handle in handles {
        match handle.await {
            Ok(Some(snap)) => snapshots.push(snap),
            Ok(None) => {}
            Err(e) => tracing::warn!("Technicals task failed: {}", e),
        }
    }

    tracing::info!("Collected technicals for {}/{} stocks", snapshots.len(), total);
    snapshots
}

/// All indicators for one symbol. Any failed fetch fails the symbol.
pub async fn fetch_snapshot<S>(source: &S, stock: &PrequalifiedStock) -> Result<TechnicalSnapshot, PulseError>
where
    S: MarketDataSource + ?Sized,
{
    let symbol = stock.symbol.as_str();
    let rsi = source.rsi(symbol).await?;
    let macd = source.macd(symbol).await?;
    let prev_volume = source.previous_volume(symbol).await?;
    let bars = source.daily_bars(symbol, RVOL_LOOKBACK_DAYS).await?;

    let rvol = prev_volume.and_then(|v| relative_volume(v, &bars));

    // Bars are oldest first; levels use the most recent window only
    let cutoff = Utc::now() - Duration::days(LEVELS_LOOKBACK_DAYS);
    let start = bars.partition_point(|b| b.timestamp < cutoff);
    let levels = support_resistance(&bars[start..]);

    tracing::debug!(
        "{}: rsi={:?} macd={:?} rvol={:?} levels={:?}",
        symbol, rsi, macd, rvol, levels
    );

    Ok(TechnicalSnapshot {
        symbol: stock.symbol.clone(),
        price: stock.price,
        rsi,
        macd: macd.macd,
        signal: macd.signal,
        histogram: macd.histogram,
        rvol,
        support: levels.map(|l| l.support),
        resistance: levels.map(|l| l.resistance),
    })
}
