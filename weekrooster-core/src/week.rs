//! Monday–Friday week windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use crate::event::Event;

const SCHOOL_DAYS: i64 = 5;

/// Longest DST gap searched when a local midnight does not exist.
const MAX_GAP_MINUTES: i64 = 3 * 60;

const MONTHS: [&str; 12] = [
    "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus", "september",
    "oktober", "november", "december",
];

/// The school week shown in the timetable: Monday 00:00:00.000 through
/// Friday 23:59:59.999 in `zone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    monday: NaiveDate,
    zone: Tz,
}

/// One column of the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub weekday: Weekday,
    pub date: NaiveDate,
    /// Display name, e.g. "maandag"
    pub name: &'static str,
}

impl WeekWindow {
    /// The week containing `date`; weekends belong to the week before.
    pub fn containing(date: NaiveDate, zone: Tz) -> Self {
        let back = date.weekday().num_days_from_monday() as i64;
        WeekWindow {
            monday: date - Duration::days(back),
            zone,
        }
    }

    /// The week containing `instant` as seen in `zone`.
    pub fn containing_instant(instant: DateTime<Utc>, zone: Tz) -> Self {
        Self::containing(instant.with_timezone(&zone).date_naive(), zone)
    }

    pub fn current(zone: Tz) -> Self {
        Self::containing_instant(Utc::now(), zone)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    /// Shift by whole weeks.
    pub fn offset(&self, weeks: i64) -> Self {
        WeekWindow {
            monday: self.monday + Duration::days(7 * weeks),
            zone: self.zone,
        }
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    pub fn friday(&self) -> NaiveDate {
        self.monday + Duration::days(SCHOOL_DAYS - 1)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Monday 00:00:00.000
    pub fn start(&self) -> DateTime<Tz> {
        self.localize(self.monday.and_time(NaiveTime::MIN))
    }

    /// Friday 23:59:59.999
    pub fn end(&self) -> DateTime<Tz> {
        let saturday = self.friday().and_time(NaiveTime::MIN) + Duration::days(1);
        self.localize(saturday - Duration::milliseconds(1))
    }

    /// Local wall-clock time to an instant. A time skipped by a DST gap
    /// moves forward to the first valid instant after the gap.
    fn localize(&self, naive: NaiveDateTime) -> DateTime<Tz> {
        if let Some(local) = self.zone.from_local_datetime(&naive).earliest() {
            return local;
        }

        // Gaps are at most a few hours; step to the first existing minute
        (1..=MAX_GAP_MINUTES)
            .map(|minutes| naive + Duration::minutes(minutes))
            .find_map(|candidate| self.zone.from_local_datetime(&candidate).earliest())
            .unwrap_or_else(|| self.zone.from_utc_datetime(&naive))
    }

    /// The five weekday columns, Monday first.
    pub fn days(&self) -> Vec<WeekDay> {
        (0..SCHOOL_DAYS)
            .map(|offset| {
                let date = self.monday + Duration::days(offset);
                WeekDay {
                    weekday: date.weekday(),
                    date,
                    name: weekday_name(date.weekday()),
                }
            })
            .collect()
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let start = self.start().with_timezone(&Utc);
        let end = self.end().with_timezone(&Utc);
        start <= instant && instant <= end
    }

    /// Events starting inside this week, in input order.
    pub fn filter(&self, events: &[Event]) -> Vec<Event> {
        events
            .iter()
            .filter(|event| event.start.is_some_and(|start| self.contains(start)))
            .cloned()
            .collect()
    }

    /// "Deze week" for the week containing `now`, otherwise
    /// "4 maart - 8 maart 2024".
    pub fn label(&self, now: DateTime<Utc>) -> String {
        if self.contains(now) {
            return "Deze week".to_string();
        }
        let friday = self.friday();
        format!(
            "{} {} - {} {} {}",
            self.monday.day(),
            month_name(self.monday),
            friday.day(),
            month_name(friday),
            friday.year()
        )
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "maandag",
        Weekday::Tue => "dinsdag",
        Weekday::Wed => "woensdag",
        Weekday::Thu => "donderdag",
        Weekday::Fri => "vrijdag",
        Weekday::Sat => "zaterdag",
        Weekday::Sun => "zondag",
    }
}

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}
