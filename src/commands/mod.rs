pub mod note;
pub mod schedule;
pub mod show;

use std::time::Duration;

use anyhow::Result;
use weekrooster::{AppConfig, FeedFetcher, HttpTransport, ScheduleSource, Session};
use weekrooster_core::{RoosterError, WeekWindow};

/// The named schedule, or the active one when no name is given.
pub fn select_schedule(cfg: &AppConfig, name: Option<&str>) -> Result<Option<ScheduleSource>> {
    match name {
        Some(name) => {
            let source = cfg
                .schedule(name)
                .cloned()
                .ok_or_else(|| RoosterError::UnknownSchedule(name.to_string()))?;
            Ok(Some(source))
        }
        None => Ok(cfg.active().cloned()),
    }
}

/// Session over HTTP for `weeks` weeks from the current one.
pub fn open_session(cfg: &AppConfig, source: Option<ScheduleSource>, weeks: i64) -> Result<Session> {
    let timetable = cfg.timetable()?;
    let week = WeekWindow::current(timetable.zone).offset(weeks);
    let transport = HttpTransport::new(Duration::from_secs(cfg.fetch.timeout_secs))?;
    let fetcher = FeedFetcher::new(transport, cfg.fetch.strategies.clone());

    Ok(Session::new(source, timetable, fetcher, week))
}

/// Shared message for a missing schedule
pub fn print_not_configured() {
    println!(
        "No schedule configured.\n\
        Add one with `weekrooster schedule add <name> <url>`."
    );
}
