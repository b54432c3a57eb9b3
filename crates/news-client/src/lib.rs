pub mod analysis;
pub mod batch;
pub mod client;
pub mod error;

pub use analysis::{format_market_analysis, match_tickers};
pub use batch::{fetch_in_batches, group_top_ranked, BatchPolicy, TOP_PER_TICKER};
pub use client::{parse_news_date, StockNewsArticle, StockNewsClient};
pub use error::{NewsError, NewsResult};
