use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::time::Duration;

use pulse_core::NewsItem;

use crate::client::StockNewsArticle;
use crate::error::{NewsError, NewsResult};

pub const TOP_PER_TICKER: usize = 5;

/// Multi-ticker request sizing. A request rejected with an HTTP error status
/// shrinks the batch by `step` down to `min` and retries the same tickers.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub start: usize,
    pub step: usize,
    pub min: usize,
    pub retry_pause: Duration,
    pub batch_pause: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            start: 20,
            step: 5,
            min: 5,
            retry_pause: Duration::from_secs(1),
            batch_pause: Duration::from_secs(2),
        }
    }
}

/// Walk `symbols` in batches, calling `fetch` once per batch and collecting
/// every returned article.
///
/// Only an error status shrinks the batch; one still rejected at the minimum
/// size is skipped. A response without data skips its batch at the current
/// size. Transport and decoding errors end the walk.
pub async fn fetch_in_batches<F, Fut>(
    symbols: &[String],
    policy: &BatchPolicy,
    mut fetch: F,
) -> NewsResult<Vec<StockNewsArticle>>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = NewsResult<Vec<StockNewsArticle>>>,
{
    let min = policy.min.max(1);
    let mut size = policy.start.max(min);
    let mut pos = 0;
    let mut articles = Vec::new();

    while pos < symbols.len() {
        let end = (pos + size).min(symbols.len());
        let batch = symbols[pos..end].to_vec();

        match fetch(batch).await {
            Ok(found) => {
                tracing::info!("Fetched {} articles for {} tickers", found.len(), end - pos);
                articles.extend(found);
                pos = end;
                if pos < symbols.len() {
                    tokio::time::sleep(policy.batch_pause).await;
                }
            }
            Err(NewsError::Status(status)) if size > min => {
                size = size.saturating_sub(policy.step).max(min);
                tracing::warn!("News batch got status {}, retrying with batch size {}", status, size);
                tokio::time::sleep(policy.retry_pause).await;
            }
            Err(NewsError::Status(status)) => {
                tracing::warn!(
                    "News batch {:?} got status {} at minimum size, skipping",
                    &symbols[pos..end],
                    status
                );
                pos = end;
            }
            Err(NewsError::MissingData) => {
                tracing::warn!("No data for news batch {:?}, skipping", &symbols[pos..end]);
                pos = end;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(articles)
}

/// Group articles under each wanted ticker they mention, keeping the
/// best-ranked few per ticker.
pub fn group_top_ranked(
    articles: Vec<StockNewsArticle>,
    wanted: &HashSet<String>,
) -> BTreeMap<String, Vec<NewsItem>> {
    let mut by_ticker: BTreeMap<String, Vec<(f64, StockNewsArticle)>> = BTreeMap::new();
    for article in articles {
        let rank = article.ticker_rank();
        for ticker in article.tickers.iter().filter(|t| wanted.contains(*t)) {
            by_ticker
                .entry(ticker.clone())
                .or_default()
                .push((rank, article.clone()));
        }
    }

    by_ticker
        .into_iter()
        .map(|(ticker, mut ranked)| {
            ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
            let items = ranked
                .into_iter()
                .take(TOP_PER_TICKER)
                .filter_map(|(_, a)| a.into_ticker_item())
                .collect();
            (ticker, items)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn instant() -> BatchPolicy {
        BatchPolicy {
            retry_pause: Duration::ZERO,
            batch_pause: Duration::ZERO,
            ..BatchPolicy::default()
        }
    }

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{i}")).collect()
    }

    fn article(title: &str, ticker: &str, rank: f64) -> StockNewsArticle {
        StockNewsArticle {
            title: Some(title.to_string()),
            date: Some("Wed, 05 Mar 2025 10:00:00 +0000".to_string()),
            tickers: vec![ticker.to_string()],
            rankscore: Some(json!(rank)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_batches_of_twenty() {
        let calls = Mutex::new(Vec::new());
        let out = fetch_in_batches(&symbols(45), &instant(), |batch| {
            calls.lock().unwrap().push(batch.len());
            async { Ok(vec![article("x", "T0", 1.0)]) }
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![20, 20, 5]);
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_shrinks_and_retries_same_position() {
        let calls = Mutex::new(Vec::new());
        let out = fetch_in_batches(&symbols(30), &instant(), |batch| {
            let first = batch[0].clone();
            calls.lock().unwrap().push((first.clone(), batch.len()));
            async move {
                // Large batches starting at T0 are rejected
                if first == "T0" && batch.len() > 10 {
                    Err(NewsError::Status(414))
                } else {
                    Ok(vec![])
                }
            }
        })
        .await
        .unwrap();

        assert!(out.is_empty());
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ("T0".to_string(), 20),
                ("T0".to_string(), 15),
                ("T0".to_string(), 10),
                ("T10".to_string(), 10),
                ("T20".to_string(), 10),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_at_minimum_skips_batch() {
        let calls = Mutex::new(Vec::new());
        let policy = BatchPolicy { start: 5, ..instant() };
        fetch_in_batches(&symbols(12), &policy, |batch| {
            let first = batch[0].clone();
            calls.lock().unwrap().push(first.clone());
            async move {
                if first == "T5" {
                    Err(NewsError::Status(500))
                } else {
                    Ok(vec![])
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["T0", "T5", "T10"]);
    }

    #[tokio::test]
    async fn test_missing_data_skips_without_shrinking() {
        let calls = Mutex::new(Vec::new());
        let out = fetch_in_batches(&symbols(45), &instant(), |batch| {
            let first = batch[0].clone();
            calls.lock().unwrap().push((first.clone(), batch.len()));
            async move {
                if first == "T0" {
                    Err(NewsError::MissingData)
                } else {
                    Ok(vec![article("x", &first, 1.0)])
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![("T0".to_string(), 20), ("T20".to_string(), 20), ("T40".to_string(), 5)]
        );
    }

    #[tokio::test]
    async fn test_decode_error_ends_walk() {
        let calls = Mutex::new(0);
        let result = fetch_in_batches(&symbols(45), &instant(), |_batch| {
            *calls.lock().unwrap() += 1;
            async { Err(NewsError::Serialization(serde_json::from_str::<u8>("x").unwrap_err())) }
        })
        .await;

        assert!(matches!(result, Err(NewsError::Serialization(_))));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_group_keeps_top_five_per_ticker() {
        let mut articles: Vec<StockNewsArticle> = (0..7)
            .map(|i| article(&format!("AAPL {i}"), "AAPL", i as f64))
            .collect();
        articles.push(article("Other", "IBM", 9.0));
        let mut both = article("Both", "AAPL", 2.5);
        both.tickers.push("MSFT".into());
        articles.push(both);

        let wanted: HashSet<String> = ["AAPL", "MSFT"].iter().map(|s| s.to_string()).collect();
        let grouped = group_top_ranked(articles, &wanted);

        assert_eq!(grouped.len(), 2);
        let aapl: Vec<&str> = grouped["AAPL"].iter().map(|n| n.headline.as_str()).collect();
        assert_eq!(aapl, vec!["AAPL 6", "AAPL 5", "AAPL 4", "AAPL 3", "Both"]);
        assert_eq!(grouped["MSFT"].len(), 1);
        assert!(!grouped.contains_key("IBM"));
    }
}
