//! Timetable events.
//!
//! An [`Event`] is the flat record the parser produces for every VEVENT
//! block: what is taught, where, by whom and when. Events are rebuilt from
//! scratch on every fetch and never mutated afterwards.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Teacher shown when the feed does not name one.
pub const UNKNOWN_TEACHER: &str = "Onbekend";

/// Location shown when the feed leaves it empty.
pub const NO_LOCATION: &str = "Geen locatie";

/// A single lesson from the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub subject: String,
    pub location: String,
    pub teacher: String,
    /// Missing when the block had no usable DTSTART
    pub start: Option<DateTime<Utc>>,
    /// Missing when the block had no usable DTEND
    pub end: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(
        subject: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Event {
            subject: subject.into(),
            location: NO_LOCATION.to_string(),
            teacher: UNKNOWN_TEACHER.to_string(),
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_teacher(mut self, teacher: impl Into<String>) -> Self {
        self.teacher = teacher.into();
        self
    }

    /// Start and end, if both are present and `start < end`.
    ///
    /// Events without a span are unschedulable: they stay in the parsed
    /// list but never occupy a slot.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_schedulable(&self) -> bool {
        self.span().is_some()
    }

    pub fn has_teacher(&self) -> bool {
        !self.teacher.is_empty() && self.teacher != UNKNOWN_TEACHER
    }

    pub fn has_location(&self) -> bool {
        !self.location.is_empty() && self.location != NO_LOCATION
    }

    /// Identity used to attach notes to this event across reloads.
    pub fn key(&self) -> Option<EventKey> {
        self.start.map(|start| EventKey {
            start,
            subject: self.subject.clone(),
        })
    }

    /// Cell text: subject, then location and teacher when known.
    pub fn display_text(&self) -> String {
        let mut parts = vec![self.subject.as_str()];
        if self.has_location() {
            parts.push(&self.location);
        }
        if self.has_teacher() {
            parts.push(&self.teacher);
        }
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

/// Stable (start, subject) composite identifying an event across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub start: DateTime<Utc>,
    pub subject: String,
}

impl EventKey {
    pub fn new(start: DateTime<Utc>, subject: impl Into<String>) -> Self {
        EventKey {
            start,
            subject: subject.into(),
        }
    }

    /// Storage key, e.g. `2024-03-04T08:30:00.000Z_Wiskunde`.
    pub fn storage_key(&self) -> String {
        format!(
            "{}_{}",
            self.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.subject
        )
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}
