//! Prompt text for the per-ticker snapshot and the market recaps.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use pulse_core::MacdReading;
use serde::{Deserialize, Serialize};

pub const STOCK_SYSTEM_PROMPT: &str = "You are a seasoned financial analyst providing concise yet insightful stock updates for investors. Your analysis should be strategic, forward-looking, and impactful.";
pub const RECAP_SYSTEM_PROMPT: &str = "You are a financial analyst providing market summaries.";
pub const NO_HEADLINES: &str = "No headlines available for analysis.";

const TIME_FORMAT: &str = "%A, %B %d, %Y - %I:%M %p %Z";

/// Everything the per-ticker snapshot prompt is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSummaryInput {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: f64,
    /// `headline: description`, best-ranked first.
    pub headlines: Vec<String>,
    pub rsi: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub macd: MacdReading,
    pub rvol: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn with_commas(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0.0 {
        out.insert(0, '-');
    }
    out
}

pub fn rsi_reading(rsi: Option<f64>) -> &'static str {
    match rsi {
        Some(r) if r < 30.0 => "Oversold — rebound potential",
        Some(r) if r > 70.0 => "Overbought — possible pullback",
        _ => "Neutral",
    }
}

pub fn stock_summary_prompt(input: &StockSummaryInput) -> String {
    let sym = &input.symbol;
    let news = input
        .headlines
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"You are a sharp financial analyst summarizing {sym}'s market behavior. Write for beginner-to-intermediate investors, with insights smart enough to impress pros.

Use the data below to craft a short, actionable summary. Be concise — focus only on what stands out. Skip fluff or repetition:

- **Price**: ${price:.2} ({change:.2}%)
- **Volume**: {volume}
- **Key News**: {news}
- **RSI**: {rsi} ({reading})
- **50-day MA**: {sma50}
- **200-day MA**: {sma200}
- **MACD**: Line {macd}, Signal {signal}, Histogram {hist}
- **RVOL**: {rvol}
- **Support / Resistance**: Support near ${support}, Resistance near ${resistance}

---

### Output Style:

Write a concise 2-paragraph stock snapshot. Focus only on what stands out — skip fluff and repetition.

- **Trend Check** – Summarize technical momentum (MACD, RSI, MAs, etc.) in 1–2 clear sentences.
- **News Pulse** – Only mention news if it's materially driving price, sentiment, or volume.

Wrap with a **forward-looking insight** (e.g. key level, setup, or likely next move).

If the stock was quiet:
> "{sym} showed no meaningful changes today. No actionable signal."

Avoid repeating raw inputs unless they directly support the insight. Aim for clarity, brevity, and signal."#,
        price = input.price,
        change = input.change_percent,
        volume = with_commas(input.volume),
        rsi = opt(input.rsi),
        reading = rsi_reading(input.rsi),
        sma50 = opt(input.sma50),
        sma200 = opt(input.sma200),
        macd = opt(input.macd.macd),
        signal = opt(input.macd.signal),
        hist = opt(input.macd.histogram),
        rvol = opt(input.rvol),
        support = opt(input.support),
        resistance = opt(input.resistance),
    )
}

/// Regular-session status for a US/Eastern wall-clock time.
pub fn market_status<Tz: TimeZone>(now: &DateTime<Tz>) -> &'static str {
    match now.weekday() {
        Weekday::Sat | Weekday::Sun => "Market is closed (Weekend)",
        _ if now.hour() < 9 || now.hour() >= 16 => "Market is closed (After Hours)",
        _ => "Market is open",
    }
}

pub fn daily_recap_prompt<Tz>(headlines: &str, indices: &str, sectors: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        r#"**Date & Time:** {time}
**Market Status:** {status}

Below are key stock market headlines, economic data, and index movements. Your job is to deliver a **concise and insightful market recap** for investors. Identify what mattered most today, what changed, and where attention should go next.

Write in a sharp, professional tone. Avoid filler. Prioritize signal over noise. Highlight clear moves, reactions, and strategic takeaways — not just summaries.

---

### Core Instructions:
- **Be brief, not shallow**: Short paragraphs with punchy insights. No wasted words.
- **Use the data**: Headlines, descriptions, price % changes, and sector moves should drive your analysis.
- **Don't speculate**: All conclusions must be grounded in reported facts and clear patterns.
- **Each section = unique insight**: Avoid restating themes between sections.

---

Updates:
{headlines}

Indices:
{indices}

Sector Performance:
{sectors}

---

### Market Summary:
Outline the big picture. What defined today's market — macro, sentiment, or sector moves? Keep it sharp and avoid repeating details from other sections. Point out **macro signals** or **unusual behavior**.

---

### Key Movements and Trends:
Highlight what **actually moved** today — sectors, large caps, unexpected winners or laggards. Look for **rotations**, **momentum reversals**, or **sector divergence**.

---

### Major Catalysts:
List major catalysts (earnings, economic data, geopolitical events). Focus on what changed market behavior — not just what happened.

---

### Sector Performance:
Quickly scan the board — who led, who lagged, and why? Identify any **tradeable themes** or **early signals** in sectors that stood out.

---

### Market Sentiment:
What's the tone? Bullish, bearish, or cautious? Use market behavior, VIX, volume, and sector flow to assess emotional context. Don't rehash data — focus on interpretation.

---

### Conclusion:
End with 2–3 **sharp takeaways** or forward-looking thoughts. Avoid fluff or summaries. Think like a strategist: what should readers watch next, or consider doing?"#,
        time = now.format(TIME_FORMAT),
        status = market_status(now),
    )
}

/// Weekly recap built from the past week's stored key points and this
/// weekend's headlines.
pub fn weekly_recap_prompt<Tz>(past_key_points: &[String], weekend_headlines: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let status = match now.weekday() {
        Weekday::Sat | Weekday::Sun => "Market is closed (Weekend)",
        _ => "Market is open",
    };
    format!(
        r#"**Date & Time:** {time}
**Market Status:** {status}

Below are stock market summaries from the past week. There are also stock news headlines from this weekend. Provide a **weekly market summary** that synthesizes key movements, trends, and themes observed during the past week. Focus on identifying **major catalysts** and **emerging patterns** that investors should be aware of, with **actionable insights**.

- **Prioritize consequential headlines**: Identify the headlines with the most significant **market impact**.
- **Consider both stock performance data and headlines** when assessing overall market sentiment.
- **Minimize coverage** of minor fluctuations unless they signal a **broader trend**.

Then, assess the **overall market sentiment** (Bullish, Bearish, or Neutral), explaining the reasoning behind it. If sentiment is mixed, highlight and explain the **conflicting signals** in the market.

**Weekly Data (Past Week's Summaries):**
{past}
**Headlines from this Weekend**
{weekend_headlines}

Structure:
### Market Summary:
### Key Movements and Trends:
### Major Catalysts:
### Sector Performance:
### Overall Market Sentiment:
### Conclusion:
### Forward Guidance (Investor Tips):"#,
        time = now.format(TIME_FORMAT),
        past = past_key_points.join("\n"),
    )
}
