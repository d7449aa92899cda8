//! Core engine for weekrooster.
//!
//! Turns an iCalendar feed into a weekly timetable:
//! - `ics` parses raw feed text into [`Event`]s
//! - `week` computes Monday–Friday windows and navigation
//! - `slot` builds the day's time slots (fixed bell schedule or dynamic)
//! - `projector` maps events and breaks onto a [`ScheduleGrid`]
//! - `timetable` chains the steps for one week
//!
//! Nothing here performs I/O; fetching feeds and persisting notes live in
//! the `weekrooster` crate.

pub mod error;
pub mod event;
pub mod grid;
pub mod ics;
pub mod projector;
pub mod slot;
pub mod timetable;
pub mod week;

pub use error::{FeedFailureCause, RoosterError, RoosterResult};
pub use event::{Event, EventKey, NO_LOCATION, UNKNOWN_TEACHER};
pub use grid::{Cell, GridRow, ScheduleGrid};
pub use projector::{BreakPolicy, ConflictPolicy, ProjectionPolicy};
pub use slot::{SlotKind, SlotMode, TimeSlot};
pub use timetable::Timetable;
pub use week::{WeekDay, WeekWindow};
