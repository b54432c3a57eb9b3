//! pulse-jobs: run MrktPulse batch jobs from the command line.
//!
//! Usage:
//!   cargo run -p pulse-jobs -- scan --max-workers 8
//!   cargo run -p pulse-jobs -- recap --weekly
//!   cargo run -p pulse-jobs -- schedule --at 20:10 --tz US/Pacific

use anyhow::Result;
use clap::Parser;
use pulse_jobs::config::{parse_time, parse_tz};
use pulse_jobs::jobs::{market, news, report, summary};
use pulse_jobs::{schedule, JobContext, JobsConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::{Cli, Commands};

const DEFAULT_LOG_FILTER: &str = "pulse_jobs=info,strategy_engine=info,polygon_client=warn";

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let mut config = JobsConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    let ctx = JobContext::connect(config).await?;

    match cli.command {
        Commands::Scan { max_workers } => {
            let workers = max_workers.unwrap_or(ctx.config.scan_max_workers);
            let outcome = market::scan(&ctx, workers).await?;
            println!("{}", report::render_scan_report(&outcome));
        }
        Commands::Movers => {
            market::movers(&ctx).await?;
        }
        Commands::TopTraded => {
            let top = market::top_traded_stocks(&ctx, None).await?;
            print!("{}", report::render_top_traded(&top));
        }
        Commands::Breakouts => {
            for s in market::breakouts(&ctx, None).await? {
                println!("{:<6} ${:>9.2}  rvol {:?}", s.symbol, s.price, s.rvol);
            }
        }
        Commands::News => {
            news::top_news(&ctx).await?;
        }
        Commands::TickerNews => {
            news::ticker_news(&ctx).await?;
        }
        Commands::Summarize => {
            summary::summarize(&ctx).await?;
        }
        Commands::Recap { weekly } => {
            let text = if weekly {
                summary::weekly(&ctx).await?
            } else {
                summary::recap(&ctx).await?
            };
            println!("{}", text);
        }
        Commands::RefreshSaved => {
            market::refresh_saved(&ctx).await?;
        }
        Commands::PruneNews { days } => {
            news::prune_news(&ctx, days).await?;
        }
        Commands::Daily => {
            schedule::run_daily(&ctx).await?;
        }
        Commands::Schedule { at, tz } => {
            let at = match at {
                Some(raw) => parse_time(&raw)?,
                None => ctx.config.schedule_at,
            };
            let tz = match tz {
                Some(raw) => parse_tz(&raw)?,
                None => ctx.config.schedule_tz,
            };
            schedule::run_schedule(&ctx, tz, at).await?;
        }
    }

    Ok(())
}
