//! The projection pipeline: week filter → slot generation → projection.

use chrono_tz::Tz;

use crate::event::Event;
use crate::grid::ScheduleGrid;
use crate::ics::parse_events_in;
use crate::projector::{BreakPolicy, ProjectionPolicy, project};
use crate::slot::SlotMode;
use crate::week::WeekWindow;

/// How a feed turns into a weekly table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timetable {
    /// Zone in which times of day and dates are read
    pub zone: Tz,
    pub slots: SlotMode,
    pub policy: ProjectionPolicy,
}

impl Timetable {
    /// Fixed bell schedules declare their breaks; dynamic slots infer them.
    pub fn new(zone: Tz, slots: SlotMode) -> Self {
        let breaks = if slots.is_fixed() {
            BreakPolicy::Declared
        } else {
            BreakPolicy::Inferred
        };
        Timetable {
            zone,
            slots,
            policy: ProjectionPolicy {
                breaks,
                ..Default::default()
            },
        }
    }

    pub fn with_policy(mut self, policy: ProjectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Project the events starting inside `week`.
    pub fn project(&self, events: &[Event], week: &WeekWindow) -> ScheduleGrid {
        let week_events = week.filter(events);
        let slots = self.slots.generate(&week_events, self.zone);

        tracing::debug!(
            "Projecting {} of {} events onto {} slots",
            week_events.len(),
            events.len(),
            slots.len()
        );

        project(&slots, &week.days(), &week_events, self.zone, self.policy)
    }

    /// Parse raw ICS text (floating times in this zone) and project it.
    pub fn project_ics(&self, content: &str, week: &WeekWindow) -> ScheduleGrid {
        self.project(&parse_events_in(content, self.zone), week)
    }
}
