use pulse_core::MarketTicker;
use pulse_store::StoredSetup;
use std::cmp::Reverse;
use std::fmt::Write;

use strategy_engine::format_number;

use crate::jobs::market::ScanOutcome;

/// Plain-text scan report: one block per screen, then every stored setup by
/// score, then the setups grouped under their label.
pub fn render_scan_report(outcome: &ScanOutcome) -> String {
    let mut out = String::new();

    for (screen, hits) in &outcome.screens {
        let _ = writeln!(out, "\n{}:", screen.title());
        for s in hits {
            let _ = writeln!(out, "  {} @ ${:.2}", s.symbol, s.price);
        }
    }

    let _ = writeln!(out, "\nFINAL STRATEGY OUTPUT (sorted by strategy score):\n");
    let mut by_score: Vec<&StoredSetup> = outcome.stored.iter().collect();
    by_score.sort_by_key(|s| Reverse(s.setup.strategy_score));
    for stored in by_score {
        let setup = &stored.setup;
        let _ = writeln!(
            out,
            "{} | Price: ${:.2} | Score: {} | Days: {} | Confidence: {} | Sentiment: {}",
            setup.symbol(),
            setup.snapshot.price,
            setup.strategy_score,
            stored.days_in_a_row,
            stored.confidence_score,
            setup.sentiment
        );
        let _ = writeln!(out, "    Strategies: {}", tag_list(stored));
        if let Some(label) = &setup.label {
            let _ = writeln!(out, "    Label: {}", label);
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }

    let _ = writeln!(out, "\nFINAL STRATEGY OUTPUT GROUPED BY LABEL:\n");
    for (label, group) in group_by_label(&outcome.stored) {
        let _ = writeln!(out, "{} ({} stocks)", label, group.len());
        let _ = writeln!(out, "{}", "-".repeat(label.len() + 20));
        for stored in group {
            let setup = &stored.setup;
            let _ = writeln!(
                out,
                "{} | ${:.2} | Score: {} | Days: {} | Sentiment: {}",
                setup.symbol(),
                setup.snapshot.price,
                setup.strategy_score,
                stored.days_in_a_row,
                setup.sentiment
            );
            let _ = writeln!(out, "    Tags: {}", tag_list(stored));
        }
        out.push('\n');
    }

    out
}

/// One line per most-traded stock with a compact volume.
pub fn render_top_traded(top: &[MarketTicker]) -> String {
    let mut out = String::new();
    for t in top {
        let _ = writeln!(
            out,
            "{:<6} ${:>9.2}  {:>+6.2}%  vol {}",
            t.symbol,
            t.price,
            t.change_pct_or_flat(),
            format_number(t.volume)
        );
    }
    out
}

fn tag_list(stored: &StoredSetup) -> String {
    stored.setup.tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

/// Labelled setups grouped in first-seen label order.
fn group_by_label(stored: &[StoredSetup]) -> Vec<(&str, Vec<&StoredSetup>)> {
    let mut groups: Vec<(&str, Vec<&StoredSetup>)> = Vec::new();
    for s in stored {
        let Some(label) = s.setup.label.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, group)) => group.push(s),
            None => groups.push((label, vec![s])),
        }
    }
    groups
}
