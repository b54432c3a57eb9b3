use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pulse-jobs", about = "MrktPulse market data and summary jobs", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Override DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prescreen the market, score strategy setups and store them
    Scan {
        /// Concurrent technical-indicator fetches (defaults to SCAN_MAX_WORKERS)
        #[arg(short, long)]
        max_workers: Option<usize>,
    },

    /// Store today's top gainers and losers
    Movers,

    /// Store the most traded stocks with their news
    TopTraded,

    /// Find and store market breakouts with their news
    Breakouts,

    /// Replace trending headlines and tag them with known symbols
    News,

    /// Fetch news for every saved stock
    TickerNews,

    /// Refresh saved stocks and write summaries for stale ones
    Summarize,

    /// Write the daily market recap and store its key points
    Recap {
        /// Weekly look-ahead from the past week's key points instead
        #[arg(short, long)]
        weekly: bool,
    },

    /// Refresh quotes for saved stocks, and their news when stale
    RefreshSaved,

    /// Delete news older than the given number of days
    PruneNews {
        #[arg(short, long, default_value_t = 1)]
        days: i64,
    },

    /// Run whichever daily tasks the current US/Eastern time allows, including the weekday evening recap
    Daily,

    /// Run the daily tasks every weekday at a fixed local time
    Schedule {
        /// Wall-clock time, HH:MM (defaults to SCHEDULE_AT)
        #[arg(long)]
        at: Option<String>,

        /// IANA time zone (defaults to SCHEDULE_TZ)
        #[arg(long)]
        tz: Option<String>,
    },
}
