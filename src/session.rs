//! Application state for one viewer: the selected week, the last fetched
//! events and the projected grid.
//!
//! State changes are published on a `watch` channel so a front end can
//! redraw on every transition (loading, loaded, failed). Only one load runs
//! at a time; a load requested while another is in flight is dropped.
//! Navigating during a load therefore changes the week without reloading,
//! and the in-flight result lands for the week it was started with.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use weekrooster_core::ics::parse_events_in;
use weekrooster_core::{Event, ScheduleGrid, Timetable, WeekWindow};

use crate::config::ScheduleSource;
use crate::feed::{FeedFetcher, HttpTransport, Transport};

#[derive(Debug, Clone)]
pub struct AppState {
    pub week: WeekWindow,
    /// Name of the schedule being shown
    pub schedule: Option<String>,
    /// Everything in the last fetched feed, not only this week
    pub events: Vec<Event>,
    /// Present after a successful load
    pub grid: Option<ScheduleGrid>,
    pub loading: bool,
    pub error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl AppState {
    fn new(week: WeekWindow, schedule: Option<String>) -> Self {
        AppState {
            week,
            schedule,
            events: Vec::new(),
            grid: None,
            loading: false,
            error: None,
            loaded_at: None,
        }
    }

    pub fn label(&self, now: DateTime<Utc>) -> String {
        self.week.label(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { lessons: usize },
    /// Another load was already running
    Skipped,
    /// No schedule to load; not an error
    NotConfigured,
    Failed,
}

/// Releases the in-flight flag even when the load future is dropped.
struct LoadGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a watch::Sender<AppState>,
    finished: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("Load cancelled before completion");
            self.state.send_modify(|state| state.loading = false);
        }
        self.in_flight.store(false, Ordering::Release);
    }
}

pub struct Session<T: Transport = HttpTransport> {
    source: Option<ScheduleSource>,
    timetable: Timetable,
    fetcher: FeedFetcher<T>,
    in_flight: AtomicBool,
    state: watch::Sender<AppState>,
}

impl<T: Transport> Session<T> {
    pub fn new(
        source: Option<ScheduleSource>,
        timetable: Timetable,
        fetcher: FeedFetcher<T>,
        week: WeekWindow,
    ) -> Self {
        let schedule = source.as_ref().map(|s| s.name.clone());
        let (state, _) = watch::channel(AppState::new(week, schedule));

        Self {
            source,
            timetable,
            fetcher,
            in_flight: AtomicBool::new(false),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    /// Fetch the feed and project it onto the current week.
    pub async fn load(&self) -> LoadOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Load already in flight, dropping request");
            return LoadOutcome::Skipped;
        }

        let mut guard = LoadGuard {
            in_flight: &self.in_flight,
            state: &self.state,
            finished: false,
        };
        let outcome = self.run_load().await;
        guard.finished = true;
        outcome
    }

    async fn run_load(&self) -> LoadOutcome {
        let Some(source) = &self.source else {
            self.state.send_modify(|state| {
                state.loading = false;
                state.error = None;
                state.grid = None;
            });
            return LoadOutcome::NotConfigured;
        };

        let week = self.state.borrow().week;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.fetcher.fetch(&source.url).await {
            Ok(content) => {
                let events = parse_events_in(&content, self.timetable.zone);
                let grid = self.timetable.project(&events, &week);
                let lessons = week.filter(&events).len();
                tracing::info!(
                    "Loaded {} events for {}, {} this week",
                    events.len(),
                    source.name,
                    lessons
                );

                self.state.send_modify(|state| {
                    state.events = events;
                    state.grid = Some(grid);
                    state.loading = false;
                    state.loaded_at = Some(Utc::now());
                });
                LoadOutcome::Loaded { lessons }
            }
            Err(e) => {
                tracing::warn!("Loading {} failed: {}", source.name, e);
                self.state.send_modify(|state| {
                    state.events.clear();
                    state.grid = None;
                    state.loading = false;
                    state.error = Some(e.to_string());
                });
                LoadOutcome::Failed
            }
        }
    }

    pub async fn go_to(&self, week: WeekWindow) -> LoadOutcome {
        self.state.send_modify(|state| state.week = week);
        self.load().await
    }

    pub async fn next_week(&self) -> LoadOutcome {
        let week = self.state.borrow().week.next();
        self.go_to(week).await
    }

    pub async fn previous_week(&self) -> LoadOutcome {
        let week = self.state.borrow().week.previous();
        self.go_to(week).await
    }

    pub async fn this_week(&self) -> LoadOutcome {
        let week = WeekWindow::current(self.timetable.zone);
        self.go_to(week).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{NaiveDate, Weekday};
    use chrono_tz::Europe::Amsterdam;
    use tokio::sync::Notify;
    use weekrooster_core::{Cell, FeedFailureCause, RoosterError, SlotMode};

    use super::*;
    use crate::feed::FetchStrategy;
    use crate::feed::testing::ScriptedTransport;

    const FEED_URL: &str = "https://school.example/4a.ics";
    const FEED: &str = "BEGIN:VCALENDAR\r
BEGIN:VEVENT\r
SUMMARY:Wiskunde\r
LOCATION:A101\r
DTSTART:20240304T073000Z\r
DTEND:20240304T081500Z\r
END:VEVENT\r
BEGIN:VEVENT\r
SUMMARY:Engels\r
DTSTART:20240312T073000Z\r
DTEND:20240312T081500Z\r
END:VEVENT\r
END:VCALENDAR\r
";

    fn week() -> WeekWindow {
        WeekWindow::containing(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), Amsterdam)
    }

    fn source() -> ScheduleSource {
        ScheduleSource {
            name: "4a".to_string(),
            url: FEED_URL.to_string(),
        }
    }

    fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        Session::new(
            Some(source()),
            Timetable::new(Amsterdam, SlotMode::default()),
            FeedFetcher::new(transport, vec![FetchStrategy::Direct]),
            week(),
        )
    }

    #[tokio::test]
    async fn load_projects_the_current_week() {
        let session = session(ScriptedTransport::new().respond(FEED_URL, 200, FEED));
        let mut updates = session.subscribe();

        let outcome = session.load().await;

        assert_eq!(outcome, LoadOutcome::Loaded { lessons: 1 });
        assert!(updates.has_changed().unwrap());
        let state = updates.borrow_and_update().clone();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.events.len(), 2);
        let grid = state.grid.unwrap();
        let cell = grid.get("08:30 - 09:15", Weekday::Mon).unwrap();
        assert_eq!(cell.event().map(|e| e.subject.as_str()), Some("Wiskunde"));
    }

    #[tokio::test]
    async fn navigation_reloads_for_the_new_week() {
        let session = session(ScriptedTransport::new().respond(FEED_URL, 200, FEED));

        assert_eq!(session.next_week().await, LoadOutcome::Loaded { lessons: 1 });
        let state = session.state();
        assert_eq!(state.week, week().next());
        let grid = state.grid.unwrap();
        assert!(matches!(grid.get("08:30 - 09:15", Weekday::Tue), Some(Cell::Lesson(_))));

        session.previous_week().await;
        assert_eq!(session.state().week, week());
        assert_eq!(session.transport_requests(), 2);
    }

    #[tokio::test]
    async fn failure_clears_the_grid_and_keeps_the_message() {
        let failing = session(ScriptedTransport::new().respond(FEED_URL, 403, ""));
        failing.state.send_modify(|state| {
            state.events = vec![Event::new("Oud", Utc::now(), Utc::now())];
            state.grid = Some(ScheduleGrid::new(Vec::new(), week().days()));
        });

        let outcome = failing.load().await;

        assert_eq!(outcome, LoadOutcome::Failed);
        let state = failing.state();
        assert!(state.grid.is_none());
        assert!(state.events.is_empty());
        let expected = RoosterError::FeedUnavailable {
            url: FEED_URL.to_string(),
            cause: FeedFailureCause::PrivateCalendar,
        };
        assert_eq!(state.error, Some(expected.to_string()));
    }

    #[tokio::test]
    async fn missing_schedule_is_not_an_error() {
        let session: Session<ScriptedTransport> = Session::new(
            None,
            Timetable::new(Amsterdam, SlotMode::default()),
            FeedFetcher::new(ScriptedTransport::new(), vec![FetchStrategy::Direct]),
            week(),
        );

        assert_eq!(session.load().await, LoadOutcome::NotConfigured);
        let state = session.state();
        assert!(state.error.is_none());
        assert!(state.schedule.is_none());
    }

    #[tokio::test]
    async fn concurrent_loads_are_dropped() {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport::new()
            .respond(FEED_URL, 200, FEED)
            .gated(gate.clone());
        let session = session(transport);

        let (first, second) = tokio::join!(session.load(), async {
            assert!(session.state().loading);
            let skipped = session.load().await;
            gate.notify_one();
            skipped
        });

        assert_eq!(first, LoadOutcome::Loaded { lessons: 1 });
        assert_eq!(second, LoadOutcome::Skipped);
        assert_eq!(session.transport_requests(), 1);
        assert!(!session.state().loading);
    }

    #[tokio::test]
    async fn cancelled_load_does_not_block_the_next_one() {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport::new()
            .respond(FEED_URL, 200, FEED)
            .gated(gate.clone());
        let session = session(transport);

        let timed_out = tokio::time::timeout(Duration::from_millis(50), session.load()).await;
        assert!(timed_out.is_err());
        assert!(!session.state().loading);

        gate.notify_one();
        assert_eq!(session.load().await, LoadOutcome::Loaded { lessons: 1 });
        assert_eq!(session.transport_requests(), 2);
    }

    impl Session<ScriptedTransport> {
        fn transport_requests(&self) -> usize {
            self.fetcher.transport().requests().len()
        }
    }
}
