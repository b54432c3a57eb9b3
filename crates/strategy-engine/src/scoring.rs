use pulse_core::{Sentiment, TechnicalSnapshot};
use serde::{Deserialize, Serialize};

use crate::labels::label_strategy_combo;
use crate::rules::{evaluate_strategies, StrategyTag, TagSet};
use crate::sentiment::determine_sentiment;

/// A snapshot that matched at least one strategy rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSetup {
    pub snapshot: TechnicalSnapshot,
    pub tags: Vec<StrategyTag>,
    pub strategy_score: u32,
    pub label: Option<String>,
    pub sentiment: Sentiment,
}

impl ScoredSetup {
    /// Build from tags already evaluated, deriving score, label and sentiment.
    pub fn from_tags(snapshot: TechnicalSnapshot, tags: Vec<StrategyTag>) -> Self {
        let set: TagSet = tags.iter().collect();
        let label = label_strategy_combo(set);
        Self {
            strategy_score: tags.len() as u32,
            sentiment: determine_sentiment(label, set),
            label: label.map(str::to_string),
            snapshot,
            tags,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.snapshot.symbol
    }

    pub fn tag_set(&self) -> TagSet {
        self.tags.iter().collect()
    }

    /// Comma-joined tags in evaluation order.
    pub fn tags_csv(&self) -> String {
        self.tags
            .iter()
            .map(StrategyTag::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Evaluate every snapshot against every rule; snapshots with no match are dropped.
pub fn score_strategy_matches(snapshots: &[TechnicalSnapshot]) -> Vec<ScoredSetup> {
    let scored: Vec<ScoredSetup> = snapshots
        .iter()
        .filter_map(|snap| {
            let tags = evaluate_strategies(snap);
            if tags.is_empty() {
                None
            } else {
                Some(ScoredSetup::from_tags(snap.clone(), tags))
            }
        })
        .collect();

    tracing::info!("Scored {} stocks with at least 1 matching strategy", scored.len());
    scored
}
