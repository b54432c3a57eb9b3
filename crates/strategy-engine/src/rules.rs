use pulse_core::{PulseError, TechnicalSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Heuristic setup a ticker can be tagged with.
///
/// Declaration order is evaluation order, and therefore the order tags are
/// stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyTag {
    Breakout,
    Breakdown,
    Momentum,
    Pullback,
    Reversal,
    Fade,
    Slingshot,
    Consolidation,
    Parabolic,
}

impl StrategyTag {
    pub const ALL: [StrategyTag; 9] = [
        StrategyTag::Breakout,
        StrategyTag::Breakdown,
        StrategyTag::Momentum,
        StrategyTag::Pullback,
        StrategyTag::Reversal,
        StrategyTag::Fade,
        StrategyTag::Slingshot,
        StrategyTag::Consolidation,
        StrategyTag::Parabolic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::Breakout => "breakout",
            StrategyTag::Breakdown => "breakdown",
            StrategyTag::Momentum => "momentum",
            StrategyTag::Pullback => "pullback",
            StrategyTag::Reversal => "reversal",
            StrategyTag::Fade => "fade",
            StrategyTag::Slingshot => "slingshot",
            StrategyTag::Consolidation => "consolidation",
            StrategyTag::Parabolic => "parabolic",
        }
    }

    /// Evaluate this rule. Any required input that is missing means no match.
    pub fn matches(&self, s: &TechnicalSnapshot) -> bool {
        self.evaluate(s).unwrap_or(false)
    }

    fn evaluate(&self, s: &TechnicalSnapshot) -> Option<bool> {
        let price = s.price;
        let hit = match self {
            StrategyTag::Breakout => {
                let rsi = s.rsi?;
                let rvol = s.rvol?;
                let near_resistance = level(s.resistance).is_some_and(|r| price >= r * 0.95);
                let bullish = macd_bullish(s)?;
                50.0 < rsi && rsi < 70.0 && rvol > 1.2 && near_resistance && bullish
            }
            StrategyTag::Breakdown => {
                let rsi = s.rsi?;
                let rvol = s.rvol?;
                let near_support = level(s.support).is_some_and(|sup| price <= sup * 1.05);
                let bearish = macd_bearish(s)?;
                rsi < 50.0 && rvol > 1.2 && near_support && bearish
            }
            StrategyTag::Momentum => s.rsi? > 70.0 && s.rvol? > 2.0 && price > s.resistance?,
            StrategyTag::Pullback => {
                let rsi = s.rsi?;
                (40.0..=50.0).contains(&rsi) && s.macd? > s.signal? && price <= s.support? * 1.05
            }
            StrategyTag::Reversal => s.histogram?.abs() < 0.1,
            StrategyTag::Fade => {
                let extended = level(s.resistance).is_some_and(|r| price > r * 1.05);
                let bearish = macd_bearish(s)?;
                s.rsi? > 75.0 && extended && bearish
            }
            StrategyTag::Slingshot => {
                s.rvol? > 2.5 && price >= s.support? && s.macd? > s.signal? && s.rsi? > 40.0
            }
            StrategyTag::Consolidation => {
                let rsi = s.rsi?;
                s.rvol? < 0.9 && s.histogram?.abs() < 0.05 && 40.0 < rsi && rsi < 60.0
            }
            StrategyTag::Parabolic => s.rvol? > 3.0 && s.rsi? > 80.0 && price > s.resistance? * 1.1,
        };
        Some(hit)
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyTag {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyTag::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| PulseError::InvalidData(format!("unknown strategy tag '{}'", s)))
    }
}

/// Small set of tags, compared by membership only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSet(u16);

impl TagSet {
    pub fn new() -> Self {
        Self(0)
    }

    fn bit(tag: StrategyTag) -> u16 {
        1 << (tag as u16)
    }

    pub fn insert(&mut self, tag: StrategyTag) {
        self.0 |= Self::bit(tag);
    }

    pub fn contains(&self, tag: StrategyTag) -> bool {
        self.0 & Self::bit(tag) != 0
    }

    pub fn contains_all(&self, tags: &[StrategyTag]) -> bool {
        tags.iter().all(|t| self.contains(*t))
    }

    /// Every member of `self` is in `other`.
    pub fn is_subset(&self, other: TagSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = StrategyTag> + '_ {
        StrategyTag::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<StrategyTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = StrategyTag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl<'a> FromIterator<&'a StrategyTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a StrategyTag>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

/// Run every rule against a snapshot, in declaration order.
pub fn evaluate_strategies(snapshot: &TechnicalSnapshot) -> Vec<StrategyTag> {
    StrategyTag::ALL
        .into_iter()
        .filter(|tag| tag.matches(snapshot))
        .collect()
}

/// A price level counts only when it is known and non-zero.
pub(crate) fn level(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x != 0.0)
}

/// `macd > signal`, or a positive histogram. `None` when macd or signal is missing.
fn macd_bullish(s: &TechnicalSnapshot) -> Option<bool> {
    let (macd, signal) = (s.macd?, s.signal?);
    Some(macd > signal || s.histogram.is_some_and(|h| h > 0.0))
}

/// `macd < signal`, or a negative histogram. `None` when macd or signal is missing.
fn macd_bearish(s: &TechnicalSnapshot) -> Option<bool> {
    let (macd, signal) = (s.macd?, s.signal?);
    Some(macd < signal || s.histogram.is_some_and(|h| h < 0.0))
}
