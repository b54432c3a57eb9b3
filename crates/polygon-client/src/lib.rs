use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, Utc};
use pulse_core::{round2, Bar, MacdReading, MarketDataSource, MarketTicker, NewsItem, PulseError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod index;

pub use index::{format_index_snapshot, IndexSnapshot, INDEX_ETFS};
pub use pulse_core::MoverDirection;

const BASE_URL: &str = "https://api.polygon.io";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request leaves the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        // Starter plan allows 500 req/min. Free tier users should set POLYGON_RATE_LIMIT=5.
        let rate_limit: usize = std::env::var("POLYGON_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        Self::with_rate_limit(api_key, rate_limit)
    }

    pub fn with_rate_limit(api_key: String, requests_per_minute: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(requests_per_minute, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, PulseError> {
        let request = builder.build().map_err(|e| PulseError::Api(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| PulseError::Api("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| PulseError::Api(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!("Polygon 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(PulseError::RateLimited("Polygon still rate limiting after 3 retries".to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, PulseError> {
        let response = self
            .send_request(
                self.client
                    .get(url)
                    .query(query)
                    .query(&[("apiKey", self.api_key.as_str())]),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulseError::Api(format!(
                "{} HTTP {}: {}",
                what,
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PulseError::Api(format!("{}: {}", what, e)))
    }

    /// Snapshot of every US stock ticker.
    pub async fn get_snapshot_all(&self) -> Result<Vec<MarketTicker>, PulseError> {
        let url = format!("{}/v2/snapshot/locale/us/markets/stocks/tickers", BASE_URL);
        let resp: SnapshotAllResponse = self.get_json("Snapshot", &url, &[]).await?;

        let tickers = parse_snapshot_tickers(resp);
        tracing::info!("Market snapshot contains {} tickers", tickers.len());
        Ok(tickers)
    }

    /// Snapshot for a single ticker (today's session, previous day, change).
    pub async fn get_snapshot(&self, symbol: &str) -> Result<MarketTicker, PulseError> {
        let url = format!("{}/v2/snapshot/locale/us/markets/stocks/tickers/{}", BASE_URL, symbol);
        let resp: SnapshotResponse = self.get_json("Snapshot", &url, &[]).await?;

        resp.ticker
            .and_then(SnapshotTicker::into_market_ticker)
            .ok_or_else(|| PulseError::InsufficientData(format!("no snapshot data for {}", symbol)))
    }

    /// Top gainers or losers of the current session.
    pub async fn get_gainers_losers(&self, direction: MoverDirection) -> Result<Vec<MarketTicker>, PulseError> {
        let url = format!(
            "{}/v2/snapshot/locale/us/markets/stocks/{}",
            BASE_URL,
            direction.as_str()
        );
        let resp: SnapshotAllResponse = self.get_json("Movers", &url, &[]).await?;
        Ok(parse_snapshot_tickers(resp))
    }

    /// Daily bars between two dates, oldest first.
    pub async fn get_aggregates(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Bar>, PulseError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            BASE_URL,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let resp: AggregateResponse = self
            .get_json(
                "Aggregates",
                &url,
                &[("adjusted", "true".to_string()), ("sort", "asc".to_string())],
            )
            .await?;

        Ok(resp.results.into_iter().map(AggregateResult::into_bar).collect())
    }

    /// Previous session's bar.
    pub async fn get_previous_close(&self, symbol: &str) -> Result<Option<Bar>, PulseError> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", BASE_URL, symbol);
        let resp: AggregateResponse = self.get_json("Previous close", &url, &[]).await?;
        Ok(resp.results.into_iter().next().map(AggregateResult::into_bar))
    }

    /// Latest daily RSI, rounded to two decimals.
    pub async fn get_rsi(&self, symbol: &str, window: u32) -> Result<Option<f64>, PulseError> {
        let url = format!("{}/v1/indicators/rsi/{}", BASE_URL, symbol);
        let resp: IndicatorResponse = self
            .get_json("RSI", &url, &latest_indicator_query(Some(window)))
            .await?;

        let value = latest_indicator_value(resp);
        if value.is_none() {
            tracing::warn!("No RSI data available for {}", symbol);
        }
        Ok(value)
    }

    /// Latest daily SMA for the given window, rounded to two decimals.
    pub async fn get_sma(&self, symbol: &str, window: u32) -> Result<Option<f64>, PulseError> {
        let url = format!("{}/v1/indicators/sma/{}", BASE_URL, symbol);
        let resp: IndicatorResponse = self
            .get_json("SMA", &url, &latest_indicator_query(Some(window)))
            .await?;
        Ok(latest_indicator_value(resp))
    }

    /// 50-day and 200-day simple moving averages.
    pub async fn get_moving_averages(&self, symbol: &str) -> Result<(Option<f64>, Option<f64>), PulseError> {
        let sma50 = self.get_sma(symbol, 50).await?;
        let sma200 = self.get_sma(symbol, 200).await?;
        Ok((sma50, sma200))
    }

    /// Latest 12/26/9 daily MACD, each component rounded to two decimals.
    pub async fn get_macd(&self, symbol: &str) -> Result<MacdReading, PulseError> {
        let url = format!("{}/v1/indicators/macd/{}", BASE_URL, symbol);
        let mut query = latest_indicator_query(None);
        query.push(("short_window", "12".to_string()));
        query.push(("long_window", "26".to_string()));
        query.push(("signal_window", "9".to_string()));

        let resp: MacdResponse = self.get_json("MACD", &url, &query).await?;
        Ok(latest_macd(resp))
    }

    /// Recent articles for a ticker, dropping anything older than `days_range` days.
    pub async fn get_news_for_ticker(
        &self,
        symbol: &str,
        limit: u32,
        days_range: i64,
    ) -> Result<Vec<NewsItem>, PulseError> {
        let url = format!("{}/v2/reference/news", BASE_URL);
        let resp: NewsResponse = self
            .get_json(
                "News",
                &url,
                &[("ticker", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        Ok(recent_news(resp.results, Utc::now().date_naive(), days_range))
    }

    /// Snapshot of the benchmark and sector ETFs used by the daily recap.
    pub async fn get_index_snapshot(&self) -> Vec<IndexSnapshot> {
        let today = Utc::now().date_naive();
        let start = today - ChronoDuration::days(90);
        let mut snapshots = Vec::with_capacity(INDEX_ETFS.len());

        for (ticker, description) in INDEX_ETFS {
            let snap = match self.get_snapshot(ticker).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("No valid snapshot for {}: {}", ticker, e);
                    continue;
                }
            };
            let bars = match self.get_aggregates(ticker, start, today).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("No history for {}: {}", ticker, e);
                    Vec::new()
                }
            };
            snapshots.push(IndexSnapshot::from_history(ticker, description, &snap, &bars));
        }

        snapshots
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    async fn rsi(&self, symbol: &str) -> Result<Option<f64>, PulseError> {
        self.get_rsi(symbol, 14).await
    }

    async fn macd(&self, symbol: &str) -> Result<MacdReading, PulseError> {
        self.get_macd(symbol).await
    }

    async fn daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, PulseError> {
        let today = Utc::now().date_naive();
        self.get_aggregates(symbol, today - ChronoDuration::days(days), today).await
    }

    async fn previous_volume(&self, symbol: &str) -> Result<Option<f64>, PulseError> {
        Ok(self.get_previous_close(symbol).await?.map(|bar| bar.volume))
    }
}

fn latest_indicator_query(window: Option<u32>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("timespan", "day".to_string()),
        ("adjusted", "true".to_string()),
        ("series_type", "close".to_string()),
        ("order", "desc".to_string()),
        ("limit", "1".to_string()),
    ];
    if let Some(w) = window {
        query.push(("window", w.to_string()));
    }
    query
}

fn parse_snapshot_tickers(resp: SnapshotAllResponse) -> Vec<MarketTicker> {
    match resp.tickers {
        Some(tickers) => tickers
            .into_iter()
            .filter_map(SnapshotTicker::into_market_ticker)
            .collect(),
        None => {
            tracing::warn!("No 'tickers' key in snapshot response");
            Vec::new()
        }
    }
}

/// First (most recent) value; a zero reading is treated as missing.
fn latest_indicator_value(resp: IndicatorResponse) -> Option<f64> {
    resp.results
        .and_then(|r| r.values)
        .and_then(|values| values.into_iter().next())
        .and_then(|v| v.value)
        .filter(|v| *v != 0.0)
        .map(round2)
}

fn latest_macd(resp: MacdResponse) -> MacdReading {
    resp.results
        .and_then(|r| r.values)
        .and_then(|values| values.into_iter().next())
        .map(|v| MacdReading {
            macd: v.value.map(round2),
            signal: v.signal.map(round2),
            histogram: v.histogram.map(round2),
        })
        .unwrap_or_default()
}

fn recent_news(results: Vec<NewsResult>, today: NaiveDate, days_range: i64) -> Vec<NewsItem> {
    let cutoff = today - ChronoDuration::days(days_range);

    results
        .into_iter()
        .filter_map(|article| {
            let published = match NaiveDateTime::parse_from_str(&article.published_utc, "%Y-%m-%dT%H:%M:%SZ") {
                Ok(dt) => dt.and_utc(),
                Err(e) => {
                    tracing::debug!("Unparseable date for '{}': {}", article.title.as_deref().unwrap_or(""), e);
                    return None;
                }
            };
            if published.date_naive() < cutoff {
                return None;
            }
            Some(NewsItem {
                headline: article.title.unwrap_or_else(|| "No headline available".to_string()),
                description: article
                    .description
                    .unwrap_or_else(|| "No description available".to_string()),
                source: article
                    .publisher
                    .and_then(|p| p.name)
                    .unwrap_or_else(|| "Unknown Source".to_string()),
                url: article.article_url,
                published: Some(published),
                rankscore: None,
                news_type: None,
                tickers: article.tickers,
            })
        })
        .collect()
}

// Response structures
#[derive(Debug, Deserialize)]
struct SnapshotAllResponse {
    #[serde(default)]
    tickers: Option<Vec<SnapshotTicker>>,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    #[serde(default)]
    ticker: Option<SnapshotTicker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTicker {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub day: Option<SnapshotDay>,
    #[serde(rename = "prevDay", default)]
    pub prev_day: Option<SnapshotDay>,
    #[serde(rename = "todaysChange", default)]
    pub todays_change: Option<f64>,
    #[serde(rename = "todaysChangePerc", default)]
    pub todays_change_perc: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDay {
    pub o: Option<f64>,
    pub h: Option<f64>,
    pub l: Option<f64>,
    pub c: Option<f64>,
    pub v: Option<f64>,
}

impl SnapshotTicker {
    /// `None` when the session block is missing its close, volume or range.
    fn into_market_ticker(self) -> Option<MarketTicker> {
        let day = self.day?;
        let prev = self.prev_day;
        Some(MarketTicker {
            symbol: self.ticker,
            name: self.name,
            price: day.c?,
            volume: day.v?,
            high: day.h?,
            low: day.l?,
            prev_volume: prev.as_ref().and_then(|p| p.v).unwrap_or(0.0),
            prev_close: prev.as_ref().and_then(|p| p.c),
            change_amount: self.todays_change,
            change_percent: self.todays_change_perc,
            market_cap: self.market_cap,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp
    o: f64, // open
    h: f64, // high
    l: f64, // low
    c: f64, // close
    v: f64, // volume
    #[serde(default)]
    vw: Option<f64>,
}

impl AggregateResult {
    fn into_bar(self) -> Bar {
        Bar {
            timestamp: DateTime::from_timestamp_millis(self.t).unwrap_or_else(Utc::now),
            open: self.o,
            high: self.h,
            low: self.l,
            close: self.c,
            volume: self.v,
            vwap: self.vw,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    article_url: Option<String>,
    #[serde(default)]
    publisher: Option<Publisher>,
    #[serde(default)]
    published_utc: String,
    #[serde(default)]
    tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    #[serde(default)]
    name: Option<String>,
}

// Technical indicator types
#[derive(Debug, Deserialize)]
struct IndicatorResponse {
    #[serde(default)]
    results: Option<IndicatorResults>,
}

#[derive(Debug, Deserialize)]
struct IndicatorResults {
    values: Option<Vec<IndicatorValue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MacdResponse {
    #[serde(default)]
    results: Option<MacdResults>,
}

#[derive(Debug, Deserialize)]
struct MacdResults {
    values: Option<Vec<MacdValue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdValue {
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// Weekday check on a bar's UTC timestamp.
pub(crate) fn is_weekday_bar(bar: &Bar) -> bool {
    bar.timestamp.weekday().num_days_from_monday() < 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_parsing_skips_rows_without_session() {
        let json = r#"{
            "status": "OK",
            "tickers": [
                {"ticker": "AAPL", "day": {"o": 189.0, "h": 192.5, "l": 188.1, "c": 191.2, "v": 55000000},
                 "prevDay": {"c": 189.5, "v": 48000000}, "todaysChange": 1.7, "todaysChangePerc": 0.9},
                {"ticker": "HALT", "prevDay": {"c": 3.0, "v": 100}},
                {"ticker": "ZERO", "day": {"o": 1.0, "h": 1.0, "l": 1.0, "v": 10}}
            ]
        }"#;
        let resp: SnapshotAllResponse = serde_json::from_str(json).unwrap();
        let tickers = parse_snapshot_tickers(resp);

        assert_eq!(tickers.len(), 1);
        let aapl = &tickers[0];
        assert_eq!(aapl.symbol, "AAPL");
        assert_eq!(aapl.price, 191.2);
        assert_eq!(aapl.prev_volume, 48_000_000.0);
        assert_eq!(aapl.change_percent, Some(0.9));
        assert!(aapl.market_cap.is_none());
    }

    #[test]
    fn test_snapshot_without_tickers_is_empty() {
        let resp: SnapshotAllResponse = serde_json::from_str(r#"{"status":"ERROR"}"#).unwrap();
        assert!(parse_snapshot_tickers(resp).is_empty());
    }

    #[test]
    fn test_missing_prev_day_volume_defaults_to_zero() {
        let json = r#"{"ticker": {"ticker": "NEW", "day": {"o": 10, "h": 11, "l": 9, "c": 10.5, "v": 1000}}}"#;
        let resp: SnapshotResponse = serde_json::from_str(json).unwrap();
        let t = resp.ticker.and_then(SnapshotTicker::into_market_ticker).unwrap();
        assert_eq!(t.prev_volume, 0.0);
        assert!(t.prev_close.is_none());
    }

    #[test]
    fn test_rsi_rounding_and_zero() {
        let resp: IndicatorResponse =
            serde_json::from_str(r#"{"results": {"values": [{"timestamp": 1, "value": 63.4567}]}}"#).unwrap();
        assert_eq!(latest_indicator_value(resp), Some(63.46));

        let resp: IndicatorResponse =
            serde_json::from_str(r#"{"results": {"values": [{"timestamp": 1, "value": 0.0}]}}"#).unwrap();
        assert_eq!(latest_indicator_value(resp), None);

        let resp: IndicatorResponse = serde_json::from_str(r#"{"status": "NOT_FOUND"}"#).unwrap();
        assert_eq!(latest_indicator_value(resp), None);
    }

    #[test]
    fn test_macd_parsing() {
        let json = r#"{"results": {"values": [
            {"timestamp": 2, "value": 1.23456, "signal": 0.98765, "histogram": 0.24691},
            {"timestamp": 1, "value": 1.0, "signal": 1.0, "histogram": 0.0}
        ]}}"#;
        let resp: MacdResponse = serde_json::from_str(json).unwrap();
        let reading = latest_macd(resp);
        assert_eq!(reading.macd, Some(1.23));
        assert_eq!(reading.signal, Some(0.99));
        assert_eq!(reading.histogram, Some(0.25));

        let empty: MacdResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(latest_macd(empty), MacdReading::default());
    }

    #[test]
    fn test_news_cutoff_and_defaults() {
        let json = r#"{"results": [
            {"title": "Fresh", "article_url": "https://x/1", "publisher": {"name": "Wire"},
             "published_utc": "2024-05-10T13:00:00Z", "tickers": ["NVDA"]},
            {"title": "Stale", "published_utc": "2024-04-01T13:00:00Z"},
            {"title": "Fractional", "published_utc": "2024-05-10T13:00:00.123Z"},
            {"description": "no title", "published_utc": "2024-05-09T08:30:00Z"}
        ]}"#;
        let resp: NewsResponse = serde_json::from_str(json).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let items = recent_news(resp.results, today, 10);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].headline, "Fresh");
        assert_eq!(items[0].source, "Wire");
        assert_eq!(items[0].url.as_deref(), Some("https://x/1"));
        assert_eq!(items[1].headline, "No headline available");
        assert_eq!(items[1].source, "Unknown Source");
    }

    #[test]
    fn test_aggregate_bar_keeps_vwap() {
        let json = r#"{"results": [{"t": 1715299200000, "o": 1, "h": 2, "l": 0.5, "c": 1.5, "v": 100, "vw": 1.4}]}"#;
        let resp: AggregateResponse = serde_json::from_str(json).unwrap();
        let bar = resp.results.into_iter().next().unwrap().into_bar();
        assert_eq!(bar.vwap, Some(1.4));
        assert_eq!(bar.volume, 100.0);
    }
}
