use crate::rules::{level, TagSet};
use crate::scoring::ScoredSetup;

/// Keywords marking a setup as short-biased, matched against tag names and
/// anywhere inside the lower-cased label.
const BEARISH_KEYWORDS: [&str; 7] = ["breakdown", "fade", "capitulation", "flush", "dead", "exhausted", "bleed"];

pub fn is_bearish_setup(tags: TagSet, label: Option<&str>) -> bool {
    let label = label.map(str::to_lowercase).unwrap_or_default();
    tags.iter().any(|t| BEARISH_KEYWORDS.contains(&t.as_str()))
        || BEARISH_KEYWORDS.iter().any(|kw| label.contains(kw))
}

/// Integer confidence for a scored setup that has been seen `days_in_a_row`
/// consecutive sessions.
pub fn calculate_confidence_score(setup: &ScoredSetup, days_in_a_row: u32) -> i32 {
    let snap = &setup.snapshot;
    let bearish = is_bearish_setup(setup.tag_set(), setup.label.as_deref());
    let mut score = setup.strategy_score as i32 * 5;

    if let Some(rsi) = snap.rsi {
        score += if bearish {
            if rsi > 80.0 {
                4
            } else if rsi > 70.0 {
                3
            } else if rsi < 30.0 {
                1
            } else {
                0
            }
        } else if (45.0..=55.0).contains(&rsi) {
            4
        } else if rsi > 70.0 || rsi < 30.0 {
            2
        } else {
            0
        };
    }

    if let Some(rvol) = level(snap.rvol) {
        score += if rvol >= 2.0 {
            5
        } else if rvol >= 1.5 {
            3
        } else if rvol >= 1.0 {
            1
        } else {
            0
        };
    }

    if let Some(hist) = level(snap.histogram) {
        score += match (bearish, hist) {
            (true, h) if h < -1.0 => 3,
            (true, h) if h < -0.5 => 2,
            (false, h) if h > 1.0 => 3,
            (false, h) if h > 0.5 => 2,
            _ => 0,
        };
    }

    // Proximity to key levels
    let price = snap.price;
    if price != 0.0 {
        if level(snap.support).is_some_and(|s| price <= s * 1.05) {
            score += if bearish { 2 } else { 1 };
        }
        if level(snap.resistance).is_some_and(|r| price >= r * 0.95) {
            score += if bearish { 1 } else { 2 };
        }
    }

    score += match days_in_a_row {
        d if d >= 5 => 6,
        4 => 4,
        3 => 3,
        2 => 2,
        _ => 0,
    };

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StrategyTag::{self, *};
    use crate::scoring::ScoredSetup;
    use pulse_core::TechnicalSnapshot;

    fn setup(tags: &[StrategyTag], snap: TechnicalSnapshot) -> ScoredSetup {
        ScoredSetup::from_tags(snap, tags.to_vec())
    }

    #[test]
    fn test_bearish_detection() {
        let tags: TagSet = [Fade].iter().collect();
        assert!(is_bearish_setup(tags, None));

        let tags: TagSet = [Pullback, Reversal].iter().collect();
        assert!(!is_bearish_setup(tags, Some("Buyable Dip")));
        // Label keyword alone is enough
        assert!(is_bearish_setup(tags, Some("Dead Cat Bounce")));
        assert!(is_bearish_setup(tags, Some("Bleed and Reversal")));
    }

    #[test]
    fn test_base_score_only() {
        let s = setup(&[Reversal, Slingshot], TechnicalSnapshot::new("X", 10.0));
        assert_eq!(calculate_confidence_score(&s, 1), 10);
    }

    #[test]
    fn test_bullish_setup_score() {
        let mut snap = TechnicalSnapshot::new("NVDA", 99.0);
        snap.rsi = Some(50.0); // +4
        snap.rvol = Some(2.1); // +5
        snap.histogram = Some(0.6); // +2
        snap.resistance = Some(100.0); // +2
        snap.support = Some(80.0);
        let s = setup(&[Breakout, Momentum], snap);
        // 2 tags * 5 = 10
        assert_eq!(calculate_confidence_score(&s, 1), 23);
        assert_eq!(calculate_confidence_score(&s, 3), 26);
        assert_eq!(calculate_confidence_score(&s, 9), 29);
    }

    #[test]
    fn test_bearish_setup_score() {
        let mut snap = TechnicalSnapshot::new("XYZ", 50.0);
        snap.rsi = Some(82.0); // +4
        snap.rvol = Some(1.6); // +3
        snap.histogram = Some(-1.2); // +3
        snap.support = Some(49.0); // +2
        snap.resistance = Some(51.0); // +1
        let s = setup(&[Breakdown, Fade], snap);
        assert_eq!(calculate_confidence_score(&s, 2), 10 + 4 + 3 + 3 + 2 + 1 + 2);
    }

    #[test]
    fn test_rsi_bands() {
        let mut snap = TechnicalSnapshot::new("A", 10.0);
        snap.rsi = Some(25.0);
        let bull = setup(&[Reversal], snap.clone());
        assert_eq!(calculate_confidence_score(&bull, 1), 5 + 2);

        let bear = setup(&[Fade], snap.clone());
        assert_eq!(calculate_confidence_score(&bear, 1), 5 + 1);

        snap.rsi = Some(60.0);
        let neither = setup(&[Reversal], snap);
        assert_eq!(calculate_confidence_score(&neither, 1), 5);
    }

    #[test]
    fn test_zero_values_count_as_missing() {
        let mut snap = TechnicalSnapshot::new("Z", 10.0);
        snap.rvol = Some(0.0);
        snap.histogram = Some(0.0);
        snap.support = Some(0.0);
        let s = setup(&[Reversal], snap);
        assert_eq!(calculate_confidence_score(&s, 1), 5);
    }
}
