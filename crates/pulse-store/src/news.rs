use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use pulse_core::NewsItem;

use crate::db::StoreDb;
use crate::models::NewsRow;

impl StoreDb {
    /// Insert an article unless the same symbol already has one with this url
    /// or headline. Returns whether a row was written.
    pub async fn insert_news(&self, item: &NewsItem, symbol: Option<&str>) -> Result<bool> {
        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM stock_news WHERE symbol IS ? AND (headline = ? OR (url IS NOT NULL AND url = ?)) LIMIT 1",
        )
        .bind(symbol)
        .bind(&item.headline)
        .bind(&item.url)
        .fetch_optional(self.pool())
        .await?;

        if existing.is_some() {
            tracing::debug!("Skipping duplicate news for {:?}: {}", symbol, item.headline);
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO stock_news (symbol, headline, description, source, url, rankscore, news_type, date_published)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(symbol)
        .bind(&item.headline)
        .bind(&item.description)
        .bind(&item.source)
        .bind(&item.url)
        .bind(item.rankscore)
        .bind(&item.news_type)
        .bind(item.published)
        .execute(self.pool())
        .await?;

        Ok(true)
    }

    /// Insert many articles for one symbol, returning how many were new.
    pub async fn insert_news_batch(&self, items: &[NewsItem], symbol: Option<&str>) -> Result<usize> {
        let mut added = 0;
        for item in items {
            if self.insert_news(item, symbol).await? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Trending headlines are the rows carrying a rank score.
    pub async fn delete_trending_news(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM stock_news WHERE rankscore IS NOT NULL")
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_news_older_than(&self, days: i64, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = now - Duration::days(days);
        let result = sqlx::query("DELETE FROM stock_news WHERE date_published < ?")
            .bind(cutoff)
            .execute(self.pool())
            .await?;
        tracing::info!("Deleted {} news articles older than {} days", result.rows_affected(), days);
        Ok(result.rows_affected())
    }

    /// News for `symbol` published since `since`, best-ranked first.
    pub async fn recent_news_for(&self, symbol: &str, since: DateTime<Utc>) -> Result<Vec<NewsRow>> {
        let rows = sqlx::query_as::<_, NewsRow>(
            r#"
            SELECT * FROM stock_news
            WHERE symbol = ? AND date_published >= ?
            ORDER BY rankscore DESC, date_published DESC
            "#,
        )
        .bind(symbol)
        .bind(since)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn item(headline: &str, url: Option<&str>, rank: Option<f64>, published: DateTime<Utc>) -> NewsItem {
        NewsItem {
            headline: headline.to_string(),
            description: "desc".to_string(),
            source: "Reuters".to_string(),
            url: url.map(str::to_string),
            published: Some(published),
            rankscore: rank,
            news_type: None,
            tickers: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_dedupes_per_symbol() {
        let db = StoreDb::new("sqlite::memory:").await.unwrap();
        let a = item("Apple beats", Some("https://x/1"), None, at(3, 10));

        assert!(db.insert_news(&a, Some("AAPL")).await.unwrap());
        assert!(!db.insert_news(&a, Some("AAPL")).await.unwrap());
        // Same article under another ticker is kept
        assert!(db.insert_news(&a, Some("MSFT")).await.unwrap());

        let retitled = item("Apple beats estimates", Some("https://x/1"), None, at(3, 10));
        assert!(!db.insert_news(&retitled, Some("AAPL")).await.unwrap());

        let no_url = item("No link", None, Some(1.0), at(3, 10));
        assert!(db.insert_news(&no_url, None).await.unwrap());
        assert!(!db.insert_news(&no_url, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_trending_and_old() {
        let db = StoreDb::new("sqlite::memory:").await.unwrap();
        db.insert_news(&item("Trending", None, Some(3.0), at(5, 10)), None).await.unwrap();
        db.insert_news(&item("Old", None, None, at(1, 10)), Some("AAPL")).await.unwrap();
        db.insert_news(&item("Fresh", None, None, at(5, 9)), Some("AAPL")).await.unwrap();

        assert_eq!(db.delete_trending_news().await.unwrap(), 1);
        assert_eq!(db.delete_news_older_than(1, at(5, 12)).await.unwrap(), 1);

        let left = db.recent_news_for("AAPL", at(1, 0)).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].headline, "Fresh");
    }

    #[tokio::test]
    async fn test_recent_news_order() {
        let db = StoreDb::new("sqlite::memory:").await.unwrap();
        let items = vec![
            item("Low", None, Some(1.0), at(5, 8)),
            item("High", None, Some(5.0), at(5, 7)),
            item("Unranked", None, None, at(5, 9)),
            item("Stale", None, Some(9.0), at(2, 9)),
        ];
        assert_eq!(db.insert_news_batch(&items, Some("NVDA")).await.unwrap(), 4);

        let rows = db.recent_news_for("NVDA", at(4, 12)).await.unwrap();
        let headlines: Vec<&str> = rows.iter().map(|r| r.headline.as_str()).collect();
        assert_eq!(headlines, vec!["High", "Low", "Unranked"]);
    }
}
