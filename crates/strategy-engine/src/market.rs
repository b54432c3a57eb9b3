//! Market-wide lists built straight from the snapshot: most traded, top
//! movers and the pre-filter for breakout candidates.

use std::cmp::Ordering;

use pulse_core::{MarketTicker, MoverDirection};

pub const TOP_TRADED_LIMIT: usize = 10;
pub const MOVERS_LIMIT: usize = 5;
pub const BREAKOUT_LIMIT: usize = 10;

const TOP_TRADED_MIN_VOLUME: f64 = 1_000_000.0;
const TOP_TRADED_MIN_PRICE: f64 = 5.0;
const MOVERS_MIN_VOLUME: f64 = 10_000.0;
const BREAKOUT_MIN_PRICE: f64 = 10.0;
const BREAKOUT_MIN_VOLUME: f64 = 2_000_000.0;
const BREAKOUT_MIN_MARKET_CAP: f64 = 100_000_000_000.0;

fn by_volume_desc(a: &MarketTicker, b: &MarketTicker) -> Ordering {
    b.volume.partial_cmp(&a.volume).unwrap_or(Ordering::Equal)
}

/// Highest-volume tickers above $5 trading more than a million shares.
pub fn top_traded(tickers: &[MarketTicker], limit: usize) -> Vec<MarketTicker> {
    let mut liquid: Vec<MarketTicker> = tickers
        .iter()
        .filter(|t| t.volume > TOP_TRADED_MIN_VOLUME && t.price >= TOP_TRADED_MIN_PRICE)
        .cloned()
        .collect();
    liquid.sort_by(by_volume_desc);
    liquid.truncate(limit);
    liquid
}

/// Biggest gainers (descending change) or losers (ascending change).
///
/// Rows with no reported change or too little volume are ignored.
pub fn top_movers(
    tickers: &[MarketTicker],
    direction: MoverDirection,
    limit: usize,
) -> Vec<MarketTicker> {
    let mut movers: Vec<MarketTicker> = tickers
        .iter()
        .filter(|t| t.change_percent.is_some() && t.volume >= MOVERS_MIN_VOLUME)
        .cloned()
        .collect();

    movers.sort_by(|a, b| {
        let (a, b) = (a.change_pct_or_flat(), b.change_pct_or_flat());
        match direction {
            MoverDirection::Gainers => b.partial_cmp(&a),
            MoverDirection::Losers => a.partial_cmp(&b),
        }
        .unwrap_or(Ordering::Equal)
    });
    movers.truncate(limit);
    movers
}

/// Large, liquid names worth checking against the breakout screen.
pub fn breakout_prefilter(tickers: &[MarketTicker]) -> Vec<&MarketTicker> {
    tickers
        .iter()
        .filter(|t| {
            let cap_ok = match t.market_cap {
                Some(cap) if cap != 0.0 => cap >= BREAKOUT_MIN_MARKET_CAP,
                _ => true,
            };
            t.price >= BREAKOUT_MIN_PRICE && t.volume >= BREAKOUT_MIN_VOLUME && cap_ok
        })
        .collect()
}
