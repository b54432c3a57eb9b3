use std::collections::{BTreeSet, HashSet};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use pulse_core::{MarketTicker, TechnicalSnapshot};
use strategy_engine::{calculate_confidence_score, ScoredSetup};

use crate::db::StoreDb;
use crate::models::*;

/// Consecutive-session count for a setup seen again on `today`.
pub(crate) fn next_streak(existing: Option<&StockRow>, today: NaiveDate) -> u32 {
    let Some(row) = existing else {
        return 1;
    };
    if !row.has_strategy_tags() {
        return 1;
    }
    let current = row.days_in_a_row.unwrap_or(1).max(1) as u32;
    match row.strategy_last_seen {
        Some(seen) if seen == today => current,
        Some(seen) if Some(seen) == today.pred_opt() => current + 1,
        _ => 1,
    }
}

fn snapshot_categories(change_percent: Option<f64>) -> BTreeSet<String> {
    let mut cats = BTreeSet::new();
    match change_percent {
        Some(c) if c > 0.0 => {
            cats.insert(CATEGORY_GAINER.to_string());
        }
        Some(c) if c < 0.0 => {
            cats.insert(CATEGORY_LOSER.to_string());
        }
        _ => {}
    }
    cats
}

impl StoreDb {
    pub async fn get_stock(&self, symbol: &str) -> Result<Option<StockRow>> {
        let row = sqlx::query_as::<_, StockRow>("SELECT * FROM stock_data WHERE symbol = ?")
            .bind(symbol)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// Every symbol in `stock_data`.
    pub async fn all_symbols(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT symbol FROM stock_data")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Symbols whose category set contains `category`.
    pub async fn symbols_in_category(&self, category: &str) -> Result<Vec<String>> {
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT symbol, category FROM stock_data WHERE category LIKE ? ORDER BY symbol")
                .bind(format!("%{}%", category))
                .fetch_all(self.pool())
                .await?;

        Ok(rows
            .into_iter()
            .filter(|(_, cats)| parse_categories(cats.as_deref()).contains(category))
            .map(|(symbol, _)| symbol)
            .collect())
    }

    async fn set_categories(&self, id: i64, categories: &BTreeSet<String>) -> Result<()> {
        sqlx::query("UPDATE stock_data SET category = ? WHERE id = ?")
            .bind(join_categories(categories))
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Add `category` to a row's set. Returns false when the symbol is unknown.
    pub async fn merge_category(&self, symbol: &str, category: &str) -> Result<bool> {
        let Some(row) = self.get_stock(symbol).await? else {
            return Ok(false);
        };
        let mut cats = row.categories();
        cats.insert(category.to_string());
        self.set_categories(row.id, &cats).await?;
        Ok(true)
    }

    /// Remove `category` from a row's set, deleting the row once no category
    /// is left. Returns true when the row was deleted.
    pub async fn drop_category(&self, symbol: &str, category: &str) -> Result<bool> {
        let Some(row) = self.get_stock(symbol).await? else {
            return Ok(false);
        };
        let mut cats = row.categories();
        cats.remove(category);

        if cats.is_empty() {
            sqlx::query("DELETE FROM stock_data WHERE id = ?")
                .bind(row.id)
                .execute(self.pool())
                .await?;
            return Ok(true);
        }

        self.set_categories(row.id, &cats).await?;
        Ok(false)
    }

    async fn drop_category_except(&self, category: &str, keep: &HashSet<&str>) -> Result<usize> {
        let mut dropped = 0;
        for symbol in self.symbols_in_category(category).await? {
            if !keep.contains(symbol.as_str()) {
                self.drop_category(&symbol, category).await?;
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    /// Price/volume upsert from a snapshot row, adding `category`.
    async fn upsert_market_row(&self, t: &MarketTicker, category: &str, now: DateTime<Utc>) -> Result<()> {
        match self.get_stock(&t.symbol).await? {
            Some(row) => {
                let mut cats = row.categories();
                cats.insert(category.to_string());
                sqlx::query(
                    r#"
                    UPDATE stock_data
                    SET name = COALESCE(?, name), price = ?, change_percent = ?, change_amount = ?,
                        volume = ?, category = ?, last_updated = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&t.name)
                .bind(t.price)
                .bind(t.change_percent)
                .bind(t.change_amount)
                .bind(t.volume)
                .bind(join_categories(&cats))
                .bind(now)
                .bind(row.id)
                .execute(self.pool())
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO stock_data (symbol, name, price, change_percent, change_amount, volume, category, last_updated)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&t.symbol)
                .bind(t.name.as_deref().unwrap_or("Unknown"))
                .bind(t.price)
                .bind(t.change_percent)
                .bind(t.change_amount)
                .bind(t.volume)
                .bind(category)
                .bind(now)
                .execute(self.pool())
                .await?;
            }
        }
        Ok(())
    }

    /// Store gainers or losers under `category`.
    pub async fn upsert_movers(&self, movers: &[MarketTicker], category: &str, now: DateTime<Utc>) -> Result<usize> {
        let mut stored = 0;
        for t in movers {
            match self.upsert_market_row(t, category, now).await {
                Ok(()) => stored += 1,
                Err(e) => tracing::warn!("Could not store {} {}: {}", category, t.symbol, e),
            }
        }
        Ok(stored)
    }

    /// Replace the `top_traded` set with `top`.
    pub async fn refresh_top_traded(&self, top: &[MarketTicker], now: DateTime<Utc>) -> Result<usize> {
        let keep: HashSet<&str> = top.iter().map(|t| t.symbol.as_str()).collect();
        let dropped = self.drop_category_except(CATEGORY_TOP_TRADED, &keep).await?;
        tracing::debug!("Removed top_traded from {} stocks", dropped);

        for t in top {
            self.upsert_market_row(t, CATEGORY_TOP_TRADED, now).await?;
        }
        Ok(top.len())
    }

    /// Replace the `breakout` set with `candidates`. Volume holds RVOL for
    /// these rows.
    pub async fn refresh_breakouts(&self, candidates: &[TechnicalSnapshot], now: DateTime<Utc>) -> Result<usize> {
        let keep: HashSet<&str> = candidates.iter().map(|c| c.symbol.as_str()).collect();
        self.drop_category_except(CATEGORY_BREAKOUT, &keep).await?;

        for c in candidates {
            match self.get_stock(&c.symbol).await? {
                Some(row) => {
                    let mut cats = row.categories();
                    cats.insert(CATEGORY_BREAKOUT.to_string());
                    sqlx::query(
                        "UPDATE stock_data SET price = ?, rsi = ?, volume = ?, category = ?, last_updated = ? WHERE id = ?",
                    )
                    .bind(c.price)
                    .bind(c.rsi)
                    .bind(c.rvol)
                    .bind(join_categories(&cats))
                    .bind(now)
                    .bind(row.id)
                    .execute(self.pool())
                    .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO stock_data (symbol, name, price, rsi, volume, category, last_updated)
                        VALUES (?, 'Unknown', ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(&c.symbol)
                    .bind(c.price)
                    .bind(c.rsi)
                    .bind(c.rvol)
                    .bind(CATEGORY_BREAKOUT)
                    .bind(now)
                    .execute(self.pool())
                    .await?;
                }
            }
        }
        Ok(candidates.len())
    }

    /// Latest quote for one ticker, tagged gainer or loser by the sign of the
    /// day's change (`neutral` when the row ends up with no category).
    pub async fn upsert_ticker_snapshot(&self, t: &MarketTicker, now: DateTime<Utc>) -> Result<StockRow> {
        let fresh = snapshot_categories(t.change_percent);
        let change_percent = t.change_pct_or_flat();
        let change_amount = t.change_amount.unwrap_or(0.0);

        match self.get_stock(&t.symbol).await? {
            Some(row) => {
                let mut cats = row.categories();
                cats.extend(fresh);
                let category = if cats.is_empty() {
                    CATEGORY_NEUTRAL.to_string()
                } else {
                    join_categories(&cats)
                };
                sqlx::query(
                    r#"
                    UPDATE stock_data
                    SET last_updated = ?, price = ?, change_percent = ?, change_amount = ?, volume = ?, category = ?
                    WHERE id = ?
                    "#,
                )
                .bind(now)
                .bind(t.price)
                .bind(change_percent)
                .bind(change_amount)
                .bind(t.volume)
                .bind(category)
                .bind(row.id)
                .execute(self.pool())
                .await?;
            }
            None => {
                let category = if fresh.is_empty() {
                    CATEGORY_NEUTRAL.to_string()
                } else {
                    join_categories(&fresh)
                };
                sqlx::query(
                    r#"
                    INSERT INTO stock_data (symbol, name, last_updated, price, change_percent, change_amount, volume, category)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&t.symbol)
                .bind(format!("{} (No name found)", t.symbol))
                .bind(now)
                .bind(t.price)
                .bind(change_percent)
                .bind(change_amount)
                .bind(t.volume)
                .bind(category)
                .execute(self.pool())
                .await?;
            }
        }

        self.get_stock(&t.symbol)
            .await?
            .ok_or_else(|| anyhow!("{} missing after snapshot upsert", t.symbol))
    }

    /// Persist today's scored setups with their streaks, then remove strategy
    /// rows that dropped out and have no news attached.
    pub async fn upsert_strategy_setups(&self, scored: &[ScoredSetup], now: DateTime<Utc>) -> Result<Vec<StoredSetup>> {
        let mut stored = Vec::with_capacity(scored.len());
        for setup in scored {
            match self.store_setup(setup, now).await {
                Ok(s) => stored.push(s),
                Err(e) => tracing::warn!("Could not store {}: {}", setup.symbol(), e),
            }
        }

        let today: Vec<&str> = scored.iter().map(ScoredSetup::symbol).collect();
        let removed = self.prune_strategy_rows(&today).await?;
        tracing::info!(
            "Stored {} strategy-matching stocks, removed {} stale",
            stored.len(),
            removed
        );
        Ok(stored)
    }

    async fn store_setup(&self, setup: &ScoredSetup, now: DateTime<Utc>) -> Result<StoredSetup> {
        let existing = self.get_stock(setup.symbol()).await?;
        let days = next_streak(existing.as_ref(), now.date_naive());
        let confidence = calculate_confidence_score(setup, days);
        let snap = &setup.snapshot;

        match existing {
            Some(row) => {
                sqlx::query(
                    r#"
                    UPDATE stock_data
                    SET sentiment = ?, confidence_score = ?, strategy_tags = ?, strategy_score = ?,
                        strategy_label = ?, price = ?, rsi = ?, days_in_a_row = ?, strategy_last_seen = ?,
                        last_updated = ?
                    WHERE id = ?
                    "#,
                )
                .bind(setup.sentiment.as_str())
                .bind(confidence)
                .bind(setup.tags_csv())
                .bind(setup.strategy_score as i64)
                .bind(&setup.label)
                .bind(snap.price)
                .bind(snap.rsi)
                .bind(days as i64)
                .bind(now.date_naive())
                .bind(now)
                .bind(row.id)
                .execute(self.pool())
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO stock_data (
                        symbol, name, price, change_percent, change_amount, volume, rsi, category,
                        strategy_tags, strategy_score, strategy_label, sentiment, confidence_score,
                        days_in_a_row, strategy_last_seen, last_updated
                    )
                    VALUES (?, 'Unknown', ?, 0, 0, 0, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&snap.symbol)
                .bind(snap.price)
                .bind(snap.rsi)
                .bind(CATEGORY_STRATEGY)
                .bind(setup.tags_csv())
                .bind(setup.strategy_score as i64)
                .bind(&setup.label)
                .bind(setup.sentiment.as_str())
                .bind(confidence)
                .bind(days as i64)
                .bind(now.date_naive())
                .bind(now)
                .execute(self.pool())
                .await?;
            }
        }

        Ok(StoredSetup {
            setup: setup.clone(),
            days_in_a_row: days,
            confidence_score: confidence,
        })
    }

    async fn prune_strategy_rows(&self, keep: &[&str]) -> Result<u64> {
        let mut sql = String::from(
            "DELETE FROM stock_data WHERE category = ? \
             AND symbol NOT IN (SELECT DISTINCT symbol FROM stock_news WHERE symbol IS NOT NULL)",
        );
        if !keep.is_empty() {
            let placeholders = vec!["?"; keep.len()].join(", ");
            sql.push_str(&format!(" AND symbol NOT IN ({})", placeholders));
        }

        let mut query = sqlx::query(&sql).bind(CATEGORY_STRATEGY);
        for symbol in keep {
            query = query.bind(*symbol);
        }
        Ok(query.execute(self.pool()).await?.rows_affected())
    }

    pub async fn save_summary(&self, symbol: &str, text: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE stock_data SET summary_text = ?, summary_last_updated = ? WHERE symbol = ?")
            .bind(text)
            .bind(at)
            .bind(symbol)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// True when a stored summary exists and is younger than `max_age`.
    pub async fn summary_is_fresh(&self, symbol: &str, now: DateTime<Utc>, max_age: Duration) -> Result<bool> {
        let Some(row) = self.get_stock(symbol).await? else {
            return Ok(false);
        };
        Ok(match (row.summary_text, row.summary_last_updated) {
            (Some(_), Some(at)) => now - at < max_age,
            _ => false,
        })
    }

    pub async fn mark_news_fetched(&self, symbol: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE stock_data SET date_fetched = ? WHERE symbol = ?")
            .bind(at)
            .bind(symbol)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn news_fetched_since(&self, symbol: &str, since: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .get_stock(symbol)
            .await?
            .and_then(|row| row.date_fetched)
            .is_some_and(|at| at > since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pulse_core::Sentiment;
    use strategy_engine::{score_strategy_matches, StrategyTag};

    async fn db() -> StoreDb {
        StoreDb::new("sqlite::memory:").await.unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn ticker(symbol: &str, price: f64, change: Option<f64>) -> MarketTicker {
        MarketTicker {
            symbol: symbol.to_string(),
            name: None,
            price,
            volume: 1_500_000.0,
            high: price,
            low: price,
            prev_volume: 0.0,
            prev_close: None,
            change_amount: change.map(|c| c / 10.0),
            change_percent: change,
            market_cap: None,
        }
    }

    fn breakout_setup(symbol: &str) -> ScoredSetup {
        let mut s = TechnicalSnapshot::new(symbol, 100.0);
        s.rsi = Some(60.0);
        s.rvol = Some(1.5);
        s.resistance = Some(100.0);
        s.macd = Some(1.0);
        s.signal = Some(0.5);
        s.histogram = Some(0.5);
        ScoredSetup::from_tags(s, vec![StrategyTag::Breakout])
    }

    #[test]
    fn test_next_streak() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let mut row = StockRow {
            id: 1,
            symbol: "X".into(),
            name: None,
            price: None,
            change_percent: None,
            change_amount: None,
            volume: None,
            rsi: None,
            category: None,
            summary_text: None,
            summary_last_updated: None,
            strategy_tags: Some("breakout".into()),
            strategy_score: Some(1),
            strategy_label: None,
            sentiment: None,
            confidence_score: None,
            days_in_a_row: Some(3),
            strategy_last_seen: Some(day(4)),
            last_updated: Some(at(5, 9)),
            date_fetched: None,
        };
        assert_eq!(next_streak(None, today), 1);
        assert_eq!(next_streak(Some(&row), today), 4);

        row.strategy_last_seen = Some(day(5));
        assert_eq!(next_streak(Some(&row), today), 3);

        row.strategy_last_seen = Some(day(2));
        assert_eq!(next_streak(Some(&row), today), 1);

        row.strategy_last_seen = None;
        assert_eq!(next_streak(Some(&row), today), 1);

        row.strategy_last_seen = Some(day(4));
        row.strategy_tags = Some(String::new());
        assert_eq!(next_streak(Some(&row), today), 1);
    }

    #[tokio::test]
    async fn test_strategy_streak_across_days() {
        let db = db().await;
        let setups = vec![breakout_setup("AMD")];

        let day1 = db.upsert_strategy_setups(&setups, at(3, 21)).await.unwrap();
        assert_eq!(day1[0].days_in_a_row, 1);

        // Rerun on the same day keeps the streak
        let again = db.upsert_strategy_setups(&setups, at(3, 22)).await.unwrap();
        assert_eq!(again[0].days_in_a_row, 1);

        let day2 = db.upsert_strategy_setups(&setups, at(4, 21)).await.unwrap();
        assert_eq!(day2[0].days_in_a_row, 2);
        // Streak bonus flows into confidence
        assert_eq!(day2[0].confidence_score, day1[0].confidence_score + 2);

        let row = db.get_stock("AMD").await.unwrap().unwrap();
        assert_eq!(row.category.as_deref(), Some("strategy"));
        assert_eq!(row.strategy_tags.as_deref(), Some("breakout"));
        assert_eq!(row.sentiment.as_deref(), Some(Sentiment::Bullish.as_str()));
        assert_eq!(row.days_in_a_row, Some(2));
        assert_eq!(row.confidence_score, Some(day2[0].confidence_score as i64));
    }

    #[tokio::test]
    async fn test_streak_ignores_market_refreshes() {
        let db = db().await;
        let setups = vec![breakout_setup("AMD")];
        let top = vec![ticker("AMD", 100.0, Some(2.0))];

        db.refresh_top_traded(&top, at(3, 15)).await.unwrap();
        let day1 = db.upsert_strategy_setups(&setups, at(3, 21)).await.unwrap();
        assert_eq!(day1[0].days_in_a_row, 1);

        // Still top traded on the 4th, but no setup that day
        db.refresh_top_traded(&top, at(4, 15)).await.unwrap();
        db.upsert_strategy_setups(&[], at(4, 21)).await.unwrap();

        let day3 = db.upsert_strategy_setups(&setups, at(5, 21)).await.unwrap();
        assert_eq!(day3[0].days_in_a_row, 1);

        let row = db.get_stock("AMD").await.unwrap().unwrap();
        assert_eq!(row.strategy_last_seen, Some(day(5)));
    }

    #[tokio::test]
    async fn test_strategy_cleanup_spares_news_and_other_categories() {
        let db = db().await;
        let setups = vec![breakout_setup("OLD"), breakout_setup("NEWSY"), breakout_setup("KEEP")];
        db.upsert_strategy_setups(&setups, at(3, 21)).await.unwrap();

        sqlx::query("INSERT INTO stock_news (symbol, headline) VALUES ('NEWSY', 'Earnings beat')")
            .execute(db.pool())
            .await
            .unwrap();
        db.upsert_movers(&[ticker("MOVER", 10.0, Some(5.0))], CATEGORY_GAINER, at(3, 21))
            .await
            .unwrap();

        db.upsert_strategy_setups(&[breakout_setup("KEEP")], at(4, 21)).await.unwrap();

        assert!(db.get_stock("OLD").await.unwrap().is_none());
        assert!(db.get_stock("NEWSY").await.unwrap().is_some());
        assert!(db.get_stock("KEEP").await.unwrap().is_some());
        assert!(db.get_stock("MOVER").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_scan_prunes_all_strategy_rows() {
        let db = db().await;
        let scored = score_strategy_matches(&[breakout_setup("GONE").snapshot]);
        db.upsert_strategy_setups(&scored, at(3, 21)).await.unwrap();
        db.upsert_strategy_setups(&[], at(4, 21)).await.unwrap();
        assert!(db.get_stock("GONE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_merge_and_drop() {
        let db = db().await;
        db.refresh_top_traded(&[ticker("AAPL", 200.0, Some(1.0))], at(3, 15)).await.unwrap();
        assert!(db.merge_category("AAPL", CATEGORY_GAINER).await.unwrap());
        assert!(!db.merge_category("NOPE", CATEGORY_GAINER).await.unwrap());

        let row = db.get_stock("AAPL").await.unwrap().unwrap();
        assert_eq!(row.category.as_deref(), Some("gainer,top_traded"));

        assert!(!db.drop_category("AAPL", CATEGORY_TOP_TRADED).await.unwrap());
        assert!(db.drop_category("AAPL", CATEGORY_GAINER).await.unwrap());
        assert!(db.get_stock("AAPL").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_top_traded_replaces_set() {
        let db = db().await;
        db.refresh_top_traded(
            &[ticker("AAPL", 200.0, Some(1.0)), ticker("TSLA", 180.0, Some(-2.0))],
            at(3, 15),
        )
        .await
        .unwrap();
        db.upsert_movers(&[ticker("TSLA", 180.0, Some(-2.0))], CATEGORY_LOSER, at(3, 15))
            .await
            .unwrap();

        db.refresh_top_traded(&[ticker("NVDA", 900.0, Some(3.0))], at(4, 15)).await.unwrap();

        assert!(db.get_stock("AAPL").await.unwrap().is_none());
        let tsla = db.get_stock("TSLA").await.unwrap().unwrap();
        assert_eq!(tsla.category.as_deref(), Some("loser"));
        assert_eq!(db.symbols_in_category(CATEGORY_TOP_TRADED).await.unwrap(), vec!["NVDA"]);
    }

    #[tokio::test]
    async fn test_refresh_breakouts_stores_rvol_as_volume() {
        let db = db().await;
        let mut snap = TechnicalSnapshot::new("MSFT", 410.0);
        snap.rsi = Some(62.0);
        snap.rvol = Some(1.8);
        db.refresh_breakouts(&[snap], at(3, 15)).await.unwrap();

        let row = db.get_stock("MSFT").await.unwrap().unwrap();
        assert_eq!(row.name.as_deref(), Some("Unknown"));
        assert_eq!(row.volume, Some(1.8));
        assert_eq!(row.category.as_deref(), Some("breakout"));

        db.refresh_breakouts(&[], at(4, 15)).await.unwrap();
        assert!(db.get_stock("MSFT").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ticker_snapshot_categories() {
        let db = db().await;
        let row = db.upsert_ticker_snapshot(&ticker("FLAT", 10.0, None), at(3, 15)).await.unwrap();
        assert_eq!(row.category.as_deref(), Some("neutral"));
        assert_eq!(row.name.as_deref(), Some("FLAT (No name found)"));
        assert_eq!(row.change_percent, Some(0.0));

        let row = db.upsert_ticker_snapshot(&ticker("UP", 10.0, Some(2.0)), at(3, 15)).await.unwrap();
        assert_eq!(row.category.as_deref(), Some("gainer"));

        let row = db.upsert_ticker_snapshot(&ticker("UP", 9.0, Some(-1.0)), at(3, 16)).await.unwrap();
        assert_eq!(row.category.as_deref(), Some("gainer,loser"));
        assert_eq!(row.price, Some(9.0));
        assert_eq!(row.last_updated, Some(at(3, 16)));
    }

    #[tokio::test]
    async fn test_summary_freshness_and_news_gate() {
        let db = db().await;
        db.upsert_ticker_snapshot(&ticker("AAPL", 200.0, Some(1.0)), at(3, 10)).await.unwrap();
        let max_age = Duration::hours(2);

        assert!(!db.summary_is_fresh("AAPL", at(3, 10), max_age).await.unwrap());
        db.save_summary("AAPL", "Quiet day.", at(3, 10)).await.unwrap();
        assert!(db.summary_is_fresh("AAPL", at(3, 11), max_age).await.unwrap());
        assert!(!db.summary_is_fresh("AAPL", at(3, 12), max_age).await.unwrap());

        assert!(!db.news_fetched_since("AAPL", at(3, 9)).await.unwrap());
        db.mark_news_fetched("AAPL", at(3, 10)).await.unwrap();
        assert!(db.news_fetched_since("AAPL", at(3, 9)).await.unwrap());
        assert!(!db.news_fetched_since("AAPL", at(3, 11)).await.unwrap());
    }
}
