//! Stand-alone candidate screens reported next to the scored output.
//!
//! These use slightly stricter inputs than the tag rules: MACD direction
//! only counts when both the MACD line and the signal line are non-zero.

use pulse_core::TechnicalSnapshot;

use crate::rules::level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Breakout,
    Breakdown,
    MomentumSurge,
    PullbackBuyZone,
    Reversal,
    OverboughtFade,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Breakout,
        Screen::Breakdown,
        Screen::MomentumSurge,
        Screen::PullbackBuyZone,
        Screen::Reversal,
        Screen::OverboughtFade,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Breakout => "BREAKOUT CANDIDATES",
            Screen::Breakdown => "BREAKDOWN CANDIDATES",
            Screen::MomentumSurge => "MOMENTUM SURGE CANDIDATES",
            Screen::PullbackBuyZone => "PULLBACK BUY ZONE CANDIDATES",
            Screen::Reversal => "REVERSAL CANDIDATES",
            Screen::OverboughtFade => "OVERBOUGHT FADE CANDIDATES",
        }
    }

    pub fn passes(&self, s: &TechnicalSnapshot) -> bool {
        let price = s.price;
        match self {
            Screen::Breakout => {
                let near_resistance = level(s.resistance).is_some_and(|r| price >= r * 0.95);
                level(s.rsi).is_some_and(|rsi| 50.0 < rsi && rsi < 70.0)
                    && level(s.rvol).is_some_and(|rvol| rvol > 1.2)
                    && near_resistance
                    && strict_macd_bullish(s)
            }
            Screen::Breakdown => {
                let near_support = level(s.support).is_some_and(|sup| price <= sup * 1.05);
                level(s.rsi).is_some_and(|rsi| 30.0 < rsi && rsi < 50.0)
                    && level(s.rvol).is_some_and(|rvol| rvol > 1.2)
                    && near_support
                    && strict_macd_bearish(s)
            }
            Screen::MomentumSurge => {
                level(s.rsi).is_some_and(|rsi| rsi > 70.0)
                    && level(s.rvol).is_some_and(|rvol| rvol > 2.0)
                    && strict_macd_bullish(s)
                    && level(s.resistance).is_some_and(|r| price > r)
            }
            Screen::PullbackBuyZone => match (s.rsi, s.macd, s.signal) {
                (Some(rsi), Some(macd), Some(signal)) => {
                    (40.0..=50.0).contains(&rsi)
                        && macd > signal
                        && level(s.support).is_some_and(|sup| price <= sup * 1.05)
                }
                _ => false,
            },
            Screen::Reversal => level(s.histogram).is_some_and(|h| h.abs() < 0.1),
            Screen::OverboughtFade => match (s.rsi, s.macd, s.signal) {
                (Some(rsi), Some(macd), Some(signal)) => {
                    let extended = level(s.resistance).is_some_and(|r| price > r * 1.05);
                    let flat_or_bearish = macd < signal || s.histogram.is_some_and(|h| h < 0.0);
                    rsi > 80.0 && extended && flat_or_bearish
                }
                _ => false,
            },
        }
    }

    /// Snapshots passing this screen, input order kept.
    pub fn run<'a>(&self, snapshots: &'a [TechnicalSnapshot]) -> Vec<&'a TechnicalSnapshot> {
        let hits: Vec<_> = snapshots.iter().filter(|s| self.passes(s)).collect();
        tracing::info!("Found {} {}", hits.len(), self.title().to_lowercase());
        hits
    }
}

fn strict_macd_bullish(s: &TechnicalSnapshot) -> bool {
    match (level(s.macd), level(s.signal)) {
        (Some(macd), Some(signal)) => macd > signal || s.histogram.is_some_and(|h| h > 0.0),
        _ => false,
    }
}

fn strict_macd_bearish(s: &TechnicalSnapshot) -> bool {
    match (level(s.macd), level(s.signal)) {
        (Some(macd), Some(signal)) => macd < signal || s.histogram.is_some_and(|h| h < 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StrategyTag;

    fn base(price: f64) -> TechnicalSnapshot {
        TechnicalSnapshot::new("T", price)
    }

    #[test]
    fn test_breakout_screen_rejects_zero_signal() {
        let mut s = base(99.0);
        s.rsi = Some(60.0);
        s.rvol = Some(1.5);
        s.resistance = Some(100.0);
        s.macd = Some(0.5);
        s.signal = Some(0.0);
        // The tag rule accepts a zero signal line, the screen does not
        assert!(StrategyTag::Breakout.matches(&s));
        assert!(!Screen::Breakout.passes(&s));

        s.signal = Some(0.2);
        assert!(Screen::Breakout.passes(&s));
    }

    #[test]
    fn test_breakdown_screen_has_rsi_floor() {
        let mut s = base(50.0);
        s.rvol = Some(1.5);
        s.support = Some(49.0);
        s.macd = Some(-1.0);
        s.signal = Some(-0.5);
        s.rsi = Some(25.0);
        assert!(StrategyTag::Breakdown.matches(&s));
        assert!(!Screen::Breakdown.passes(&s));
        s.rsi = Some(35.0);
        assert!(Screen::Breakdown.passes(&s));
    }

    #[test]
    fn test_momentum_surge_needs_bullish_macd() {
        let mut s = base(110.0);
        s.rsi = Some(75.0);
        s.rvol = Some(2.5);
        s.resistance = Some(100.0);
        assert!(!Screen::MomentumSurge.passes(&s));
        s.macd = Some(1.2);
        s.signal = Some(1.0);
        assert!(Screen::MomentumSurge.passes(&s));
    }

    #[test]
    fn test_pullback_and_reversal_screens() {
        let mut s = base(20.0);
        s.rsi = Some(45.0);
        s.macd = Some(0.3);
        s.signal = Some(0.2);
        s.support = Some(19.5);
        assert!(Screen::PullbackBuyZone.passes(&s));
        s.support = None;
        assert!(!Screen::PullbackBuyZone.passes(&s));

        let mut r = base(10.0);
        r.histogram = Some(0.0);
        assert!(!Screen::Reversal.passes(&r));
        r.histogram = Some(0.05);
        assert!(Screen::Reversal.passes(&r));
    }

    #[test]
    fn test_overbought_fade_screen() {
        let mut s = base(120.0);
        s.rsi = Some(85.0);
        s.resistance = Some(110.0);
        s.macd = Some(1.0);
        s.signal = Some(0.8);
        s.histogram = Some(-0.1);
        assert!(Screen::OverboughtFade.passes(&s));
        s.rsi = Some(79.0);
        assert!(!Screen::OverboughtFade.passes(&s));
    }

    #[test]
    fn test_run_keeps_order() {
        let mut a = base(1.0);
        a.symbol = "A".into();
        a.histogram = Some(0.01);
        let b = base(2.0);
        let mut c = base(3.0);
        c.symbol = "C".into();
        c.histogram = Some(-0.02);
        let snaps = vec![a, b, c];
        let hits: Vec<&str> = Screen::Reversal.run(&snaps).into_iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(hits, vec!["A", "C"]);
    }
}
