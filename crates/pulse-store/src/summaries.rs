use anyhow::Result;
use chrono::{Duration, NaiveDate};

use crate::db::StoreDb;
use crate::models::MarketSummary;

impl StoreDb {
    /// Key points for `date`, replacing any stored earlier that day.
    pub async fn store_market_summary(&self, date: NaiveDate, key_points: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO market_summaries (summary_date, key_points) VALUES (?, ?)
            ON CONFLICT(summary_date) DO UPDATE SET key_points = excluded.key_points
            "#,
        )
        .bind(date)
        .bind(key_points)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_market_summary(&self, date: NaiveDate) -> Result<Option<MarketSummary>> {
        let row = sqlx::query_as::<_, MarketSummary>("SELECT * FROM market_summaries WHERE summary_date = ?")
            .bind(date)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// Key points from the `days` days up to and including `today`, oldest first.
    pub async fn recent_key_points(&self, today: NaiveDate, days: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT key_points FROM market_summaries WHERE summary_date >= ? AND summary_date <= ? ORDER BY summary_date",
        )
        .bind(today - Duration::days(days))
        .bind(today)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
