use std::collections::HashSet;

use pulse_core::MarketTicker;
use serde::{Deserialize, Serialize};

/// Liquidity and volatility floor applied to the full-market snapshot before
/// any per-ticker indicator is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrescreenCriteria {
    pub min_price: f64,
    pub min_volume: f64,
    pub min_change_pct: f64,
    pub min_market_cap: f64,
    pub min_prev_volume: f64,
    /// Minimum intraday range as a fraction of price.
    pub min_volatility: f64,
}

impl Default for PrescreenCriteria {
    fn default() -> Self {
        Self {
            min_price: 2000.0,
            min_volume: 10_000_000.0,
            min_change_pct: -2.0,
            min_market_cap: 100_000_000_000.0,
            min_prev_volume: 20_000_000.0,
            min_volatility: 0.01,
        }
    }
}

impl PrescreenCriteria {
    /// Thresholds used by the daily strategy scan.
    pub fn scan() -> Self {
        Self {
            min_price: 5.0,
            min_volume: 3_000_000.0,
            min_prev_volume: 1_000_000.0,
            ..Self::default()
        }
    }

    pub fn accepts(&self, t: &MarketTicker) -> bool {
        let cap_ok = match t.market_cap {
            Some(cap) => cap >= self.min_market_cap,
            None => true,
        };
        t.price >= self.min_price
            && t.volume >= self.min_volume
            && t.prev_volume >= self.min_prev_volume
            && (t.high - t.low) >= t.price * self.min_volatility
            && t.change_pct_or_flat() >= self.min_change_pct
            && cap_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrequalifiedStock {
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub change_pct: f64,
    pub market_cap: Option<f64>,
}

impl From<&MarketTicker> for PrequalifiedStock {
    fn from(t: &MarketTicker) -> Self {
        Self {
            symbol: t.symbol.clone(),
            price: t.price,
            volume: t.volume,
            change_pct: t.change_pct_or_flat(),
            market_cap: t.market_cap,
        }
    }
}

/// Tickers passing `criteria`, de-duplicated by symbol (first occurrence wins).
pub fn get_prequalified_stocks(
    tickers: &[MarketTicker],
    criteria: &PrescreenCriteria,
) -> Vec<PrequalifiedStock> {
    let mut seen = HashSet::new();
    let stocks: Vec<PrequalifiedStock> = tickers
        .iter()
        .filter(|t| criteria.accepts(t))
        .filter(|t| seen.insert(t.symbol.clone()))
        .map(PrequalifiedStock::from)
        .collect();

    tracing::info!(
        "{} of {} tickers passed the pre-screen",
        stocks.len(),
        tickers.len()
    );
    stocks
}
