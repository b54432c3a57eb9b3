use anyhow::{Context, Result};
use news_client::StockNewsClient;
use polygon_client::PolygonClient;
use pulse_store::StoreDb;
use std::sync::Arc;
use summarizer::LlmClient;

use crate::config::JobsConfig;

/// Clients and storage handed to every job. API clients are only built
/// when their key is configured; jobs that need a missing one fail early.
pub struct JobContext {
    pub config: JobsConfig,
    pub db: StoreDb,
    polygon: Option<Arc<PolygonClient>>,
    news: Option<StockNewsClient>,
    llm: Option<LlmClient>,
}

impl JobContext {
    pub async fn connect(config: JobsConfig) -> Result<Self> {
        let db = StoreDb::new(&config.database_url)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_url))?;

        let polygon = config.polygon_api_key.clone().map(|key| {
            Arc::new(match config.polygon_rate_limit {
                Some(rpm) => PolygonClient::with_rate_limit(key, rpm),
                None => PolygonClient::new(key),
            })
        });
        let news = config.stocknews_api_key.clone().map(StockNewsClient::new);
        let llm = config
            .openai_api_key
            .clone()
            .map(|key| LlmClient::new(key, config.openai_model.clone()));

        tracing::info!(
            "Jobs ready (polygon: {}, news: {}, llm: {})",
            polygon.is_some(),
            news.is_some(),
            llm.as_ref().map(LlmClient::model).unwrap_or("off")
        );

        Ok(Self { config, db, polygon, news, llm })
    }

    pub fn polygon(&self) -> Result<Arc<PolygonClient>> {
        self.polygon.clone().context("POLYGON_API_KEY not set")
    }

    pub fn news(&self) -> Result<&StockNewsClient> {
        self.news.as_ref().context("STOCKNEWSAPI_KEY not set")
    }

    pub fn llm(&self) -> Result<&LlmClient> {
        self.llm.as_ref().context("OPENAI_API_KEY not set")
    }
}
