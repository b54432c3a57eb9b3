//! Benchmark and sector ETF snapshot for the daily market recap.

use pulse_core::{Bar, MarketTicker};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::is_weekday_bar;

/// Index proxies first, then the SPDR sector funds.
pub const INDEX_ETFS: [(&str, &str); 15] = [
    ("SPY", "S&P 500 ETF (Represents the S&P 500 Index)"),
    ("DIA", "Dow Jones Industrial Average ETF (Represents the Dow Jones Industrial Average)"),
    ("QQQ", "Nasdaq-100 ETF (Represents the Nasdaq-100 Index)"),
    ("IWM", "Russell 2000 ETF (Represents the Russell 2000 Index)"),
    ("IJH", "S&P MidCap 400 ETF (Represents the S&P MidCap 400 Index)"),
    ("VTI", "Vanguard Total Stock Market ETF"),
    ("VXX", "iPath S&P 500 VIX Short-Term Futures ETF"),
    ("XLK", "Technology Select Sector SPDR Fund"),
    ("XLF", "Financial Select Sector SPDR Fund"),
    ("XLE", "Energy Select Sector SPDR Fund"),
    ("XLV", "Health Care Select Sector SPDR Fund"),
    ("XLY", "Consumer Discretionary Select Sector SPDR Fund"),
    ("XLU", "Utilities Select Sector SPDR Fund"),
    ("XLRE", "Real Estate Select Sector SPDR Fund"),
    ("XLB", "Materials Select Sector SPDR Fund"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub ticker: String,
    pub description: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub previous_close: Option<f64>,
    pub monthly_change_pct: f64,
    pub volume_change_pct: f64,
    pub monthly_avg_volume: f64,
}

impl IndexSnapshot {
    /// Build from today's snapshot and ~90 days of daily bars.
    ///
    /// Monthly change compares against the oldest weekday close in the
    /// history; volume change compares against the last 30 weekday bars.
    pub fn from_history(ticker: &str, description: &str, snap: &MarketTicker, bars: &[Bar]) -> Self {
        let weekdays: Vec<&Bar> = bars.iter().filter(|b| is_weekday_bar(b)).collect();

        let monthly_change_pct = match weekdays.first() {
            Some(first) if first.close != 0.0 => (snap.price - first.close) / first.close * 100.0,
            _ => 0.0,
        };

        let recent = &weekdays[weekdays.len().saturating_sub(30)..];
        let monthly_avg_volume = if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|b| b.volume).sum::<f64>() / recent.len() as f64
        };
        let volume_change_pct = if monthly_avg_volume != 0.0 {
            (snap.volume - monthly_avg_volume) / monthly_avg_volume * 100.0
        } else {
            0.0
        };

        Self {
            ticker: ticker.to_string(),
            description: description.to_string(),
            price: snap.price,
            change_amount: snap.change_amount.unwrap_or(0.0),
            change_percent: snap.change_pct_or_flat(),
            high: snap.high,
            low: snap.low,
            volume: snap.volume,
            previous_close: snap.prev_close,
            monthly_change_pct,
            volume_change_pct,
            monthly_avg_volume,
        }
    }

    pub fn is_sector_fund(&self) -> bool {
        self.ticker.starts_with("XL")
    }
}

/// Render snapshots as Markdown bullet blocks for an LLM prompt.
pub fn format_index_snapshot(rows: &[IndexSnapshot]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "**{}** ({}):", row.ticker, row.description);
        let _ = writeln!(out, " - Current Price: ${:.2}", row.price);
        let _ = writeln!(out, " - Change: ${:.2} ({:.2}%)", row.change_amount, row.change_percent);
        let _ = writeln!(out, " - High of the Day: ${:.2}", row.high);
        let _ = writeln!(out, " - Low of the Day: ${:.2}", row.low);
        let _ = writeln!(out, " - Volume: {:.0}", row.volume);
        match row.previous_close {
            Some(pc) => {
                let _ = writeln!(out, " - Previous Close: ${:.2}", pc);
            }
            None => {
                let _ = writeln!(out, " - Previous Close: n/a");
            }
        }
        let _ = writeln!(out, " - Monthly Change: {:.2}%", row.monthly_change_pct);
        let _ = writeln!(
            out,
            " - Volume Change: {:.2}% (Change from the monthly average)",
            row.volume_change_pct
        );
        let _ = writeln!(out, " - Monthly Average Volume: {:.0}", row.monthly_avg_volume);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ticker(price: f64, volume: f64) -> MarketTicker {
        MarketTicker {
            symbol: "SPY".into(),
            name: None,
            price,
            volume,
            high: price + 1.0,
            low: price - 1.0,
            prev_volume: 0.0,
            prev_close: Some(price - 2.0),
            change_amount: Some(2.0),
            change_percent: Some(0.4),
            market_cap: None,
        }
    }

    fn bar(day: u32, close: f64, volume: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 6, day, 20, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            vwap: None,
        }
    }

    #[test]
    fn test_monthly_change_skips_weekend_bars() {
        // 2024-06-01 is a Saturday, 06-03 a Monday
        let bars = vec![bar(1, 50.0, 10.0), bar(3, 100.0, 100.0), bar(4, 105.0, 300.0)];
        let snap = IndexSnapshot::from_history("SPY", "S&P", &ticker(110.0, 400.0), &bars);

        assert!((snap.monthly_change_pct - 10.0).abs() < 1e-9);
        assert!((snap.monthly_avg_volume - 200.0).abs() < 1e-9);
        assert!((snap.volume_change_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_history_is_flat() {
        let snap = IndexSnapshot::from_history("XLK", "Tech", &ticker(200.0, 1.0), &[]);
        assert_eq!(snap.monthly_change_pct, 0.0);
        assert_eq!(snap.volume_change_pct, 0.0);
        assert!(snap.is_sector_fund());
    }

    #[test]
    fn test_format_block() {
        let snap = IndexSnapshot::from_history("SPY", "S&P 500 ETF", &ticker(500.0, 1000.0), &[]);
        let text = format_index_snapshot(&[snap]);
        assert!(text.starts_with("**SPY** (S&P 500 ETF):\n"));
        assert!(text.contains(" - Change: $2.00 (0.40%)"));
        assert!(text.contains(" - Previous Close: $498.00"));
        assert!(text.ends_with("\n\n"));
    }
}
