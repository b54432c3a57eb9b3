use crate::rules::{StrategyTag, TagSet};
use StrategyTag::*;

type Combo = (&'static [StrategyTag], &'static str);

/// Four-tag power combos, checked first when four or more tags match.
const FOUR_TAG_COMBOS: &[Combo] = &[
    (&[Consolidation, Breakout, Momentum, Slingshot], "Compression Breakout"),
    (&[Parabolic, Momentum, Fade, Reversal], "Blow-Off Top"),
    (&[Breakout, Momentum, Reversal, Fade], "Parabolic Exhaustion"),
    (&[Breakdown, Momentum, Reversal, Fade], "Capitulation Event"),
    (&[Pullback, Momentum, Fade, Reversal], "Failed Bounce"),
    (&[Pullback, Reversal, Momentum, Slingshot], "Slingshot Reversal"),
];

const THREE_TAG_COMBOS: &[Combo] = &[
    (&[Pullback, Reversal, Consolidation], "Coiled Reversal"),
    (&[Pullback, Reversal, Momentum], "Momentum Slingshot"),
    (&[Breakout, Momentum, Reversal], "Breakout Reversal"),
    (&[Breakdown, Reversal, Fade], "Capitulation Reversal"),
    (&[Pullback, Breakout, Momentum], "Coiled Breakout"),
    (&[Pullback, Reversal, Fade], "Failed Bounce Attempt"),
    (&[Breakout, Momentum, Fade], "Momentum Exhaustion"),
    (&[Breakdown, Fade, Reversal], "Bleed and Reversal"),
    (&[Pullback, Breakdown, Reversal], "Support Breakdown Trap"),
    (&[Breakout, Fade, Reversal], "Breakout Failure"),
    (&[Fade, Momentum, Reversal], "Momentum Flip"),
    (&[Consolidation, Breakout, Momentum], "Coiled Spring"),
    (&[Parabolic, Fade, Reversal], "Blow-Off Top"),
];

const TWO_TAG_COMBOS: &[Combo] = &[
    (&[Consolidation, Breakout], "Range Breakout"),
    (&[Breakout, Momentum], "Range Expansion"),
    (&[Breakout, Reversal], "Breakout Failure Risk"),
    (&[Pullback, Reversal], "Buyable Dip"),
    (&[Breakdown, Reversal], "Oversold Reversal"),
    (&[Fade, Reversal], "Exhaustion Reversal"),
    (&[Pullback, Momentum], "Trend Continuation"),
    (&[Reversal, Momentum], "V-Shaped Recovery"),
    (&[Breakdown, Fade], "Dead Cat Bounce"),
    (&[Breakdown, Pullback], "Downtrend Continuation"),
    (&[Pullback, Fade], "Failed Recovery"),
    (&[Momentum, Fade], "Momentum Exhaustion"),
    (&[Pullback, Slingshot], "Aggressive Reversal"),
    (&[Consolidation, Momentum], "Tight Breakout Setup"),
];

fn first_match(tags: TagSet, table: &[Combo]) -> Option<&'static str> {
    table
        .iter()
        .find(|(combo, _)| tags.contains_all(combo))
        .map(|(_, label)| *label)
}

/// Composite label for a set of matched tags.
///
/// Priority: four-tag combos (or "Multi-Signal Convergence") for 4+ tags,
/// then three-tag combos ("Triple Signal" fallback for exactly three), then
/// two-tag combos. Single tags get no label.
pub fn label_strategy_combo(tags: TagSet) -> Option<&'static str> {
    if tags.len() >= 4 {
        return Some(first_match(tags, FOUR_TAG_COMBOS).unwrap_or("Multi-Signal Convergence"));
    }

    if let Some(label) = first_match(tags, THREE_TAG_COMBOS) {
        return Some(label);
    }
    if tags.len() == 3 {
        return Some("Triple Signal");
    }

    if let Some(label) = first_match(tags, TWO_TAG_COMBOS) {
        return Some(label);
    }
    if tags.len() >= 2 {
        return Some("Multi-Signal Setup");
    }
    None
}
