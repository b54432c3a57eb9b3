use pulse_core::{round2, Bar};
use serde::{Deserialize, Serialize};

/// Lookback windows, in calendar days, for the derived indicators.
pub const RVOL_LOOKBACK_DAYS: i64 = 60;
pub const LEVELS_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Relative volume: a session's volume over the mean volume of `bars`.
pub fn relative_volume(volume: f64, bars: &[Bar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let avg = bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64;
    if avg == 0.0 {
        return None;
    }
    Some(round2(volume / avg))
}

/// Support is the lowest low, resistance the highest high, over the window.
pub fn support_resistance(bars: &[Bar]) -> Option<SupportResistance> {
    if bars.is_empty() {
        return None;
    }
    let support = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let resistance = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    Some(SupportResistance {
        support: round2(support),
        resistance: round2(resistance),
    })
}

/// Human-readable volume: `1.23B`, `4.50M`, `12.3K`.
pub fn format_number(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}
