use async_trait::async_trait;
use crate::{Bar, MacdReading, PulseError};

/// Source of the per-ticker indicator inputs used by the strategy scan.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest 14-period daily RSI, `None` when the provider has no value.
    async fn rsi(&self, symbol: &str) -> Result<Option<f64>, PulseError>;

    /// Latest 12/26/9 daily MACD reading.
    async fn macd(&self, symbol: &str) -> Result<MacdReading, PulseError>;

    /// Daily bars covering the last `days` calendar days, oldest first.
    async fn daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<Bar>, PulseError>;

    /// Volume of the previous completed session.
    async fn previous_volume(&self, symbol: &str) -> Result<Option<f64>, PulseError>;
}
