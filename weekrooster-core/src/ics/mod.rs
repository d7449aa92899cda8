//! iCalendar feed parsing.
//!
//! This is a deliberately small reader: it walks the feed line by line and
//! only understands the handful of VEVENT properties a timetable needs.
//! RRULE/EXDATE expansion, VTIMEZONE definitions and TZID resolution are
//! not supported; floating times are read in a single caller-chosen zone.

mod parse;

pub use parse::{parse_events, parse_events_in};
