use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// One row of the full-market snapshot.
///
/// `price`, `volume`, `high` and `low` come from the current session; rows
/// without session data never make it this far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketTicker {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
    #[serde(default)]
    pub prev_volume: f64,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(default)]
    pub change_amount: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl MarketTicker {
    /// Percent change, treating a missing value as flat.
    pub fn change_pct_or_flat(&self) -> f64 {
        self.change_percent.unwrap_or(0.0)
    }
}

/// Latest MACD reading (12/26/9 on daily closes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// Per-ticker technical indicators feeding the strategy rules.
///
/// Every indicator is optional: an upstream fetch that failed or returned
/// nothing leaves the field empty, and rules needing it simply do not match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub symbol: String,
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
    pub rvol: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

impl TechnicalSnapshot {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            ..Default::default()
        }
    }
}

/// A headline from any news provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub description: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rankscore: Option<f64>,
    #[serde(default)]
    pub news_type: Option<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
}

/// Directional read of a strategy setup.
///
/// The seven graded values come from the label table; the two `*Leaning`
/// values only appear when a label has no table entry and the tags decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "bullish +")]
    StrongBullish,
    #[serde(rename = "bullish")]
    Bullish,
    #[serde(rename = "bullish -")]
    WeakBullish,
    #[serde(rename = "bullish-leaning")]
    BullishLeaning,
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "bearish-leaning")]
    BearishLeaning,
    #[serde(rename = "bearish -")]
    WeakBearish,
    #[serde(rename = "bearish")]
    Bearish,
    #[serde(rename = "bearish +")]
    StrongBearish,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::StrongBullish => "bullish +",
            Sentiment::Bullish => "bullish",
            Sentiment::WeakBullish => "bullish -",
            Sentiment::BullishLeaning => "bullish-leaning",
            Sentiment::Neutral => "neutral",
            Sentiment::BearishLeaning => "bearish-leaning",
            Sentiment::WeakBearish => "bearish -",
            Sentiment::Bearish => "bearish",
            Sentiment::StrongBearish => "bearish +",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = crate::PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bullish +" => Ok(Sentiment::StrongBullish),
            "bullish" => Ok(Sentiment::Bullish),
            "bullish -" => Ok(Sentiment::WeakBullish),
            "bullish-leaning" => Ok(Sentiment::BullishLeaning),
            "neutral" => Ok(Sentiment::Neutral),
            "bearish-leaning" => Ok(Sentiment::BearishLeaning),
            "bearish -" => Ok(Sentiment::WeakBearish),
            "bearish" => Ok(Sentiment::Bearish),
            "bearish +" => Ok(Sentiment::StrongBearish),
            other => Err(crate::PulseError::InvalidData(format!(
                "unknown sentiment '{}'",
                other
            ))),
        }
    }
}

/// Which side of the market movers to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverDirection {
    Gainers,
    Losers,
}

impl MoverDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoverDirection::Gainers => "gainers",
            MoverDirection::Losers => "losers",
        }
    }
}

/// Round to cents, the precision every derived indicator is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
