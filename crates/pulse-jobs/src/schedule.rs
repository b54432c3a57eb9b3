//! Time-windowed daily runner and the weekday scheduler that drives it.
//!
//! News tasks run from 05:00 to 23:00 US/Eastern every day; stock tasks only
//! run on weekdays between 09:00 and 17:00 US/Eastern. A weekday pass after
//! the stock window closes writes the evening ticker news and market recap.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::{Tz, US::Eastern};

use crate::context::JobContext;
use crate::jobs;

pub const NEWS_WINDOW: (u32, u32) = (5, 23);
pub const STOCK_WINDOW: (u32, u32) = (9, 17);
const NEWS_RETENTION_DAYS: i64 = 1;

/// Whether the hour of `now` falls in `[start, end)`.
pub fn in_window<T: TimeZone>(now: &DateTime<T>, (start, end): (u32, u32)) -> bool {
    (start..end).contains(&now.hour())
}

pub fn is_weekday<T: TimeZone>(now: &DateTime<T>) -> bool {
    !matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn news_tasks_due(now_eastern: &DateTime<Tz>) -> bool {
    in_window(now_eastern, NEWS_WINDOW)
}

pub fn stock_tasks_due(now_eastern: &DateTime<Tz>) -> bool {
    is_weekday(now_eastern) && in_window(now_eastern, STOCK_WINDOW)
}

/// Weekday evening, from the stock window close until midnight US/Eastern.
pub fn evening_tasks_due(now_eastern: &DateTime<Tz>) -> bool {
    is_weekday(now_eastern) && now_eastern.hour() >= STOCK_WINDOW.1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    PruneNews,
    TopNews,
    Movers,
    RefreshSaved,
    TopTraded,
    TickerNews,
    Recap,
}

/// Tasks a daily pass at `now_eastern` runs, in order.
pub fn planned_tasks(now_eastern: &DateTime<Tz>) -> Vec<Task> {
    let mut tasks = Vec::new();
    if news_tasks_due(now_eastern) {
        tasks.extend([Task::PruneNews, Task::TopNews]);
    }
    if stock_tasks_due(now_eastern) {
        tasks.extend([Task::Movers, Task::RefreshSaved, Task::TopTraded]);
    }
    if evening_tasks_due(now_eastern) {
        tasks.extend([Task::TickerNews, Task::Recap]);
    }
    tasks
}

/// First Monday-to-Friday occurrence of `at` strictly after `now`, in `now`'s zone.
///
/// Local times skipped by a DST jump are ignored for that day.
pub fn next_fire_time(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    (0..=8).find_map(|offset| {
        let date = now.date_naive() + Duration::days(offset);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return None;
        }
        tz.from_local_datetime(&date.and_time(at))
            .earliest()
            .filter(|fire| fire > now)
    })
}

/// One pass of the daily runner, deciding what to do from the Eastern clock.
pub async fn run_daily(ctx: &JobContext) -> Result<()> {
    let now = Utc::now().with_timezone(&Eastern);
    let tasks = planned_tasks(&now);
    if tasks.is_empty() {
        tracing::info!("Nothing due at {}", now.format("%a %H:%M %Z"));
        return Ok(());
    }
    tracing::info!("Daily pass at {}: {:?}", now.format("%a %H:%M %Z"), tasks);

    for task in tasks {
        if let Err(e) = run_task(ctx, task).await {
            tracing::warn!("{:?} failed: {:#}", task, e);
        }
    }

    Ok(())
}

async fn run_task(ctx: &JobContext, task: Task) -> Result<()> {
    match task {
        Task::PruneNews => {
            jobs::news::prune_news(ctx, NEWS_RETENTION_DAYS).await?;
        }
        Task::TopNews => {
            jobs::news::top_news(ctx).await?;
        }
        Task::Movers => {
            jobs::market::movers(ctx).await?;
        }
        Task::RefreshSaved => {
            jobs::market::refresh_saved(ctx).await?;
        }
        Task::TopTraded => {
            let snapshot = ctx.polygon()?.get_snapshot_all().await?;
            jobs::market::top_traded_stocks(ctx, Some(&snapshot)).await?;
        }
        Task::TickerNews => {
            jobs::news::ticker_news(ctx).await?;
        }
        Task::Recap => {
            jobs::summary::recap(ctx).await?;
        }
    }
    Ok(())
}

/// Run the daily pass at `at` in `tz` every weekday, forever.
pub async fn run_schedule(ctx: &JobContext, tz: Tz, at: NaiveTime) -> Result<()> {
    loop {
        let now = Utc::now().with_timezone(&tz);
        let fire = next_fire_time(&now, at).context("No weekday fire time in the next week")?;
        let wait = (fire - now).to_std().unwrap_or_default();
        tracing::info!("Next run at {} (in {}s)", fire.format("%a %Y-%m-%d %H:%M %Z"), wait.as_secs());

        tokio::time::sleep(wait).await;

        if let Err(e) = run_daily(ctx).await {
            tracing::error!("Scheduled run failed: {:#}", e);
        }
    }
}
