use anyhow::Result;

use crate::db::StoreDb;
use crate::models::User;

impl StoreDb {
    pub async fn create_user(&self, email: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (email) VALUES (?)")
            .bind(email)
            .execute(self.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, subscription_status, stripe_customer_id FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    /// Add a symbol to a user's watchlist. Returns false when it was already saved.
    pub async fn save_stock(&self, user_id: i64, symbol: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO user_saved_stocks (user_id, stock_symbol) VALUES (?, ?)")
            .bind(user_id)
            .bind(symbol.to_uppercase())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn unsave_stock(&self, user_id: i64, symbol: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_saved_stocks WHERE user_id = ? AND stock_symbol = ?")
            .bind(user_id)
            .bind(symbol.to_uppercase())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct symbols saved by any user.
    pub async fn tracked_symbols(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT stock_symbol FROM user_saved_stocks ORDER BY stock_symbol")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
