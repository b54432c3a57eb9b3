use pulse_core::Sentiment;

use crate::rules::{StrategyTag, TagSet};

/// Graded sentiment for a known combo label.
pub fn sentiment_for_label(label: &str) -> Option<Sentiment> {
    let s = match label {
        // Trend-ready upside setups
        "Compression Breakout" | "Coiled Breakout" | "Coiled Spring" | "Buyable Dip"
        | "Trend Continuation" | "Breakout Retest" | "Slingshot Reversal" | "Aggressive Reversal"
        | "Coiled Reversal" | "Support Breakdown Trap" | "V-Shaped Recovery" => Sentiment::StrongBullish,

        "Explosive Breakout" | "Range Expansion" | "Reversal Slingshot" | "Momentum Slingshot"
        | "Slingshot" | "Breakout Reversal" => Sentiment::Bullish,

        // Forming, not confirmed
        "Breakout Cooling" | "Momentum Pullback" | "Overextended Reversal" | "Breakdown Failure" => {
            Sentiment::WeakBullish
        }

        "Multi-Signal Setup" | "Multi-Signal Convergence" | "Unclassified Setup" | "Momentum Reversal" => {
            Sentiment::Neutral
        }

        "Bleed and Reversal" | "Exhausted Runner" => Sentiment::WeakBearish,

        "Failed Bounce" | "Failed Bounce Attempt" | "Bounce Rejection" | "Momentum Flip"
        | "Momentum Unwind" | "Breakout Failure" | "Chaotic Extension" | "Momentum Exhaustion"
        | "Breakdown Cooling" => Sentiment::Bearish,

        // Climactic downside
        "Blow-Off Top" | "Parabolic Exhaustion" | "Capitulation Event" | "Dead Cat Bounce"
        | "Climax Selling" | "Failed Recovery" => Sentiment::StrongBearish,

        _ => return None,
    };
    Some(s)
}

/// Sentiment for a setup: the label table first, then a tag vote.
pub fn determine_sentiment(label: Option<&str>, tags: TagSet) -> Sentiment {
    if let Some(s) = label.and_then(sentiment_for_label) {
        return s;
    }

    let bullish: TagSet = [StrategyTag::Breakout, StrategyTag::Momentum].iter().collect();
    let bearish: TagSet = [StrategyTag::Breakdown, StrategyTag::Fade].iter().collect();
    let neutral: TagSet = [StrategyTag::Pullback, StrategyTag::Reversal].iter().collect();

    let bullish_votes = tags.iter().filter(|t| bullish.contains(*t)).count();
    let bearish_votes = tags.iter().filter(|t| bearish.contains(*t)).count();

    if tags.is_subset(bullish) {
        Sentiment::Bullish
    } else if tags.is_subset(bearish) {
        Sentiment::Bearish
    } else if tags.is_subset(neutral) {
        Sentiment::Neutral
    } else if bullish_votes > 0 && bearish_votes == 0 {
        Sentiment::BullishLeaning
    } else if bearish_votes > 0 && bullish_votes == 0 {
        Sentiment::BearishLeaning
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StrategyTag::*;

    fn set(tags: &[StrategyTag]) -> TagSet {
        tags.iter().collect()
    }

    #[test]
    fn test_label_table() {
        assert_eq!(sentiment_for_label("Buyable Dip"), Some(Sentiment::StrongBullish));
        assert_eq!(sentiment_for_label("Range Expansion"), Some(Sentiment::Bullish));
        assert_eq!(sentiment_for_label("Bleed and Reversal"), Some(Sentiment::WeakBearish));
        assert_eq!(sentiment_for_label("Dead Cat Bounce"), Some(Sentiment::StrongBearish));
        assert_eq!(sentiment_for_label("Triple Signal"), None);
    }

    #[test]
    fn test_label_wins_over_tags() {
        let s = determine_sentiment(Some("Failed Recovery"), set(&[Pullback, Fade]));
        assert_eq!(s, Sentiment::StrongBearish);
    }

    #[test]
    fn test_fallback_subsets() {
        assert_eq!(determine_sentiment(None, set(&[Breakout])), Sentiment::Bullish);
        assert_eq!(determine_sentiment(None, set(&[Fade])), Sentiment::Bearish);
        assert_eq!(determine_sentiment(None, set(&[Reversal])), Sentiment::Neutral);
        assert_eq!(determine_sentiment(None, set(&[Slingshot])), Sentiment::Neutral);
    }

    #[test]
    fn test_fallback_leaning() {
        // Unlisted labels fall through to the tag vote
        assert_eq!(
            determine_sentiment(Some("Triple Signal"), set(&[Momentum, Slingshot, Parabolic])),
            Sentiment::BullishLeaning
        );
        assert_eq!(
            determine_sentiment(Some("Capitulation Reversal"), set(&[Breakdown, Reversal, Fade])),
            Sentiment::BearishLeaning
        );
        assert_eq!(
            determine_sentiment(Some("Triple Signal"), set(&[Breakout, Fade, Slingshot])),
            Sentiment::Neutral
        );
    }

    #[test]
    fn test_unlisted_combo_labels_use_tags() {
        let tags = set(&[Pullback, Breakdown]);
        let label = crate::labels::label_strategy_combo(tags);
        assert_eq!(label, Some("Downtrend Continuation"));
        assert_eq!(sentiment_for_label("Downtrend Continuation"), None);
        assert_eq!(determine_sentiment(label, tags), Sentiment::BearishLeaning);
    }
}
