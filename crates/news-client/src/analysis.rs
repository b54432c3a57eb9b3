use std::collections::{BTreeSet, HashSet};

use pulse_core::NewsItem;

/// Known symbols an article refers to: the API's own tickers plus any known
/// symbol appearing as a word in the upper-cased headline or body. Sorted.
pub fn match_tickers(item: &NewsItem, known: &HashSet<String>) -> Vec<String> {
    let text = format!("{} {}", item.headline, item.description).to_uppercase();
    let words: HashSet<&str> = text
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '.'))
        .map(|w| w.trim_end_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();

    let matched: BTreeSet<String> = item
        .tickers
        .iter()
        .filter(|t| known.contains(*t))
        .cloned()
        .chain(known.iter().filter(|s| words.contains(s.as_str())).cloned())
        .collect();

    matched.into_iter().collect()
}

/// Render headlines as prompt input, leaving out video items.
pub fn format_market_analysis(items: &[NewsItem]) -> String {
    items
        .iter()
        .filter(|n| n.news_type.as_deref() != Some("Video"))
        .map(|n| {
            let rank = n
                .rankscore
                .map(|r| r.to_string())
                .unwrap_or_else(|| "No rank score available".to_string());
            format!(
                "Headline: {}\nDescription: {}\nRank Score: {}\n",
                n.headline, n.description, rank
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(headline: &str, description: &str, tickers: &[&str]) -> NewsItem {
        NewsItem {
            headline: headline.to_string(),
            description: description.to_string(),
            source: "Reuters".to_string(),
            url: None,
            published: None,
            rankscore: Some(2.5),
            news_type: Some("Article".to_string()),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn known(symbols: &[&str]) -> HashSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_match_tickers() {
        let news = item("Nvidia and amd rally", "Chip stocks led by NVDA.", &["AMD", "INTC"]);
        let matched = match_tickers(&news, &known(&["NVDA", "AMD", "TSLA"]));
        assert_eq!(matched, vec!["AMD", "NVDA"]);
    }

    #[test]
    fn test_match_requires_whole_word() {
        let news = item("Macro outlook", "Rates and inflation", &[]);
        assert!(match_tickers(&news, &known(&["MA", "A"])).is_empty());

        let news = item("BRK.B climbs", "", &[]);
        assert_eq!(match_tickers(&news, &known(&["BRK.B"])), vec!["BRK.B"]);
    }

    #[test]
    fn test_format_market_analysis() {
        let mut video = item("Watch this", "clip", &[]);
        video.news_type = Some("Video".to_string());
        let mut unranked = item("Oil slides", "Crude falls", &[]);
        unranked.rankscore = None;

        let text = format_market_analysis(&[item("Fed holds", "No change", &[]), video, unranked]);
        assert_eq!(
            text,
            "Headline: Fed holds\nDescription: No change\nRank Score: 2.5\n\n\n\
             Headline: Oil slides\nDescription: Crude falls\nRank Score: No rank score available\n"
        );
    }
}
