//! Time slots and slot generation.
//!
//! A [`TimeSlot`] is a time-of-day interval in minutes since local midnight.
//! A day's slot list is either a fixed bell schedule or derived from the
//! start/end times actually observed in the active week ([`SlotMode`]).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{RoosterError, RoosterResult};
use crate::event::Event;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Smallest gap between two observed time points that becomes its own slot.
pub const DEFAULT_MIN_GAP_MINUTES: u16 = 5;

/// Label for declared breaks in the default bell schedule.
pub const BREAK_LABEL: &str = "Pauze";

/// Label of the single slot returned when there is nothing to derive slots from.
pub const FALLBACK_LABEL: &str = "Geen lessen";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    #[default]
    Lesson,
    Break,
}

/// A time-of-day interval `[start, end)` in minutes since midnight.
///
/// Invariant: `start < end <= 1440`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SlotSpec", into = "SlotSpec")]
pub struct TimeSlot {
    start: u16,
    end: u16,
    kind: SlotKind,
    label: Option<String>,
}

/// Serialized form: `{ time = "10:30 - 10:50", kind = "break", label = "Pauze" }`
#[derive(Serialize, Deserialize)]
struct SlotSpec {
    time: String,
    #[serde(default)]
    kind: SlotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl TryFrom<SlotSpec> for TimeSlot {
    type Error = RoosterError;

    fn try_from(spec: SlotSpec) -> Result<Self, Self::Error> {
        let slot: TimeSlot = spec.time.parse()?;
        Ok(TimeSlot {
            kind: spec.kind,
            label: spec.label,
            ..slot
        })
    }
}

impl From<TimeSlot> for SlotSpec {
    fn from(slot: TimeSlot) -> Self {
        SlotSpec {
            time: slot.range_label(),
            kind: slot.kind,
            label: slot.label,
        }
    }
}

impl TimeSlot {
    pub fn new(start: u16, end: u16, kind: SlotKind, label: Option<String>) -> RoosterResult<Self> {
        if start >= end || end > MINUTES_PER_DAY {
            return Err(RoosterError::InvalidTimeSlot(format!(
                "{} - {} (start must be before end, end at most 24:00)",
                format_minute(start),
                format_minute(end)
            )));
        }
        Ok(TimeSlot {
            start,
            end,
            kind,
            label,
        })
    }

    pub fn lesson(start: u16, end: u16) -> RoosterResult<Self> {
        Self::new(start, end, SlotKind::Lesson, None)
    }

    pub fn break_slot(start: u16, end: u16, label: impl Into<String>) -> RoosterResult<Self> {
        Self::new(start, end, SlotKind::Break, Some(label.into()))
    }

    /// Caller guarantees `start < end <= 1440`.
    fn unchecked(start: u16, end: u16, kind: SlotKind, label: Option<&str>) -> Self {
        debug_assert!(start < end && end <= MINUTES_PER_DAY);
        TimeSlot {
            start,
            end,
            kind,
            label: label.map(str::to_string),
        }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_break(&self) -> bool {
        self.kind == SlotKind::Break
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end - self.start
    }

    /// Whether an interval `[start, end)` (minutes of day) overlaps this slot.
    ///
    /// Same as "starts inside, ends inside, or covers the slot".
    pub fn overlaps(&self, start: u16, end: u16) -> bool {
        start < self.end && end > self.start
    }

    /// Inclusive on both ends, so the boundary minute belongs to both
    /// neighbouring slots; the first one wins in [`current_slot_index`].
    pub fn contains_minute(&self, minute: u16) -> bool {
        self.start <= minute && minute <= self.end
    }

    /// `"08:30 - 09:00"`
    pub fn range_label(&self) -> String {
        format!("{} - {}", format_minute(self.start), format_minute(self.end))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range_label())
    }
}

impl FromStr for TimeSlot {
    type Err = RoosterError;

    /// Parse `"HH:MM - HH:MM"` (spaces optional) into a lesson slot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| RoosterError::InvalidTimeSlot(format!("'{s}', expected HH:MM - HH:MM")))?;
        TimeSlot::lesson(parse_minute(start)?, parse_minute(end)?)
    }
}

fn parse_minute(s: &str) -> RoosterResult<u16> {
    let s = s.trim();
    let invalid = || RoosterError::InvalidTimeSlot(format!("'{s}' is not a HH:MM time"));

    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    let h: u16 = h.parse().map_err(|_| invalid())?;
    let m: u16 = m.parse().map_err(|_| invalid())?;
    if m >= 60 || h > 24 || h * 60 + m > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(h * 60 + m)
}

/// `510` → `"08:30"`
pub fn format_minute(minute: u16) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

pub fn minute_of_day<T: Timelike>(time: &T) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

/// Local minutes of day for an event span. An end on a later local date
/// than the start is clamped to 24:00.
pub(crate) fn local_minutes(start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> (u16, u16) {
    let start = start.with_timezone(&zone);
    let end = end.with_timezone(&zone);

    let end_minute = if end.date_naive() > start.date_naive() {
        MINUTES_PER_DAY
    } else {
        minute_of_day(&end)
    };

    (minute_of_day(&start), end_minute)
}

/// Index of the first slot containing `minute`.
pub fn current_slot_index(slots: &[TimeSlot], minute: u16) -> Option<usize> {
    slots.iter().position(|slot| slot.contains_minute(minute))
}

/// How a day's slots are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotMode {
    /// A configured bell schedule, used as-is every week.
    Fixed(Vec<TimeSlot>),
    /// Slots between consecutive observed start/end times.
    Dynamic { min_gap_minutes: u16 },
}

impl Default for SlotMode {
    fn default() -> Self {
        SlotMode::Dynamic {
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
        }
    }
}

impl SlotMode {
    pub fn fixed_default() -> Self {
        SlotMode::Fixed(default_bell_schedule())
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, SlotMode::Fixed(_))
    }

    /// Slots for a week containing `events`. Never empty.
    pub fn generate(&self, events: &[Event], zone: Tz) -> Vec<TimeSlot> {
        match self {
            SlotMode::Fixed(slots) if slots.is_empty() => fallback_slots(),
            SlotMode::Fixed(slots) => {
                let mut slots = slots.clone();
                slots.sort_by_key(|s| (s.start, s.end));
                slots
            }
            SlotMode::Dynamic { min_gap_minutes } => {
                dynamic_slots(events, zone, *min_gap_minutes)
            }
        }
    }
}

/// Derive slots from the distinct start/end minutes of `events`.
///
/// Adjacent time points closer than `min_gap_minutes` do not form a slot.
/// Falls back to [`fallback_slots`] when nothing qualifies.
pub fn dynamic_slots(events: &[Event], zone: Tz, min_gap_minutes: u16) -> Vec<TimeSlot> {
    let points: BTreeSet<u16> = events
        .iter()
        .filter_map(Event::span)
        .flat_map(|(start, end)| {
            let (start, end) = local_minutes(start, end, zone);
            [start, end]
        })
        .collect();
    let points: Vec<u16> = points.into_iter().collect();

    let slots: Vec<TimeSlot> = points
        .windows(2)
        .filter(|pair| pair[1] - pair[0] >= min_gap_minutes)
        .map(|pair| TimeSlot::unchecked(pair[0], pair[1], SlotKind::Lesson, None))
        .collect();

    if slots.is_empty() {
        tracing::debug!("No slots derivable from {} events, using fallback", events.len());
        return fallback_slots();
    }
    slots
}

/// The empty-state slot list: one lesson row covering a school day.
pub fn fallback_slots() -> Vec<TimeSlot> {
    vec![TimeSlot::unchecked(
        8 * 60 + 30,
        15 * 60,
        SlotKind::Lesson,
        Some(FALLBACK_LABEL),
    )]
}

/// Half-hour lessons from 08:00 to 17:00 with three 20-minute breaks.
pub fn default_bell_schedule() -> Vec<TimeSlot> {
    const BELLS: &[(u16, u16, u16, u16, SlotKind)] = &[
        (8, 0, 8, 30, SlotKind::Lesson),
        (8, 30, 9, 0, SlotKind::Lesson),
        (9, 0, 9, 30, SlotKind::Lesson),
        (9, 30, 10, 0, SlotKind::Lesson),
        (10, 0, 10, 30, SlotKind::Lesson),
        (10, 30, 10, 50, SlotKind::Break),
        (10, 50, 11, 20, SlotKind::Lesson),
        (11, 20, 11, 50, SlotKind::Lesson),
        (11, 50, 12, 10, SlotKind::Break),
        (12, 10, 12, 40, SlotKind::Lesson),
        (12, 40, 13, 10, SlotKind::Lesson),
        (13, 10, 13, 30, SlotKind::Break),
        (13, 30, 14, 0, SlotKind::Lesson),
        (14, 0, 14, 30, SlotKind::Lesson),
        (14, 30, 15, 0, SlotKind::Lesson),
        (15, 0, 15, 30, SlotKind::Lesson),
        (15, 30, 16, 0, SlotKind::Lesson),
        (16, 0, 16, 30, SlotKind::Lesson),
        (16, 30, 17, 0, SlotKind::Lesson),
    ];

    BELLS
        .iter()
        .map(|&(sh, sm, eh, em, kind)| {
            let label = (kind == SlotKind::Break).then_some(BREAK_LABEL);
            TimeSlot::unchecked(sh * 60 + sm, eh * 60 + em, kind, label)
        })
        .collect()
}

/// Sort a configured slot list and reject overlaps.
pub fn validate_fixed(mut slots: Vec<TimeSlot>) -> RoosterResult<Vec<TimeSlot>> {
    slots.sort_by_key(|s| (s.start, s.end));
    if let Some(pair) = slots.windows(2).find(|pair| pair[1].start < pair[0].end) {
        return Err(RoosterError::InvalidTimeSlot(format!(
            "{} overlaps {}",
            pair[0], pair[1]
        )));
    }
    Ok(slots)
}
