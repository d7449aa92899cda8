//! Slot projection: decide which event (or break) occupies each cell.
//!
//! An event occupies a slot on its day when the half-open intervals
//! overlap: `event_start < slot_end && event_end > slot_start`. That is the
//! union of "starts in the slot", "ends in the slot" and "covers the slot",
//! so a lesson spanning several slots fills every one of them.
//!
//! Two cells can compete for the same event and two events for the same
//! cell. The latter is settled by [`ConflictPolicy`]; the default keeps the
//! last event in feed order.
//!
//! Breaks are either declared by the slot list ([`BreakPolicy::Declared`])
//! or inferred from the absence of lessons ([`BreakPolicy::Inferred`]). The
//! inference is a heuristic: a free lesson hour looks exactly like a break.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::grid::{Cell, ScheduleGrid};
use crate::slot::{TimeSlot, local_minutes};
use crate::week::WeekDay;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakPolicy {
    /// Empty cells not overlapped by any lesson that day become breaks.
    #[default]
    Inferred,
    /// Slots of kind `Break` are breaks on every day and never hold lessons.
    Declared,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The event processed last (in feed order) keeps the cell.
    #[default]
    LastWins,
    /// The event processed first keeps the cell.
    FirstWins,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionPolicy {
    #[serde(default)]
    pub breaks: BreakPolicy,
    #[serde(default)]
    pub conflicts: ConflictPolicy,
}

/// An event resolved to a day column and local minutes of day.
struct Placement<'a> {
    col: usize,
    start: u16,
    end: u16,
    event: &'a Event,
}

/// Build the grid for `days` × `slots` from `events`.
///
/// Unschedulable events and events not starting on one of `days` are
/// skipped.
pub fn project(
    slots: &[TimeSlot],
    days: &[WeekDay],
    events: &[Event],
    zone: Tz,
    policy: ProjectionPolicy,
) -> ScheduleGrid {
    let mut grid = ScheduleGrid::new(slots.to_vec(), days.to_vec());

    let placements: Vec<Placement> = events
        .iter()
        .filter_map(|event| {
            let (start, end) = event.span()?;
            let date = start.with_timezone(&zone).date_naive();
            let col = days.iter().position(|day| day.date == date)?;
            let (start, end) = local_minutes(start, end, zone);
            Some(Placement {
                col,
                start,
                end,
                event,
            })
        })
        .collect();

    if placements.len() < events.len() {
        tracing::debug!(
            "{} of {} events not placed (untimed or outside the week)",
            events.len() - placements.len(),
            events.len()
        );
    }

    for placement in &placements {
        for (row, slot) in slots.iter().enumerate() {
            if policy.breaks == BreakPolicy::Declared && slot.is_break() {
                continue;
            }
            if !slot.overlaps(placement.start, placement.end) {
                continue;
            }

            let cell = grid.cell_mut(row, placement.col);
            if policy.conflicts == ConflictPolicy::FirstWins && !cell.is_empty() {
                continue;
            }
            *cell = Cell::Lesson(placement.event.clone());
        }
    }

    match policy.breaks {
        BreakPolicy::Declared => {
            for (row, slot) in slots.iter().enumerate() {
                if slot.is_break() {
                    for col in 0..days.len() {
                        *grid.cell_mut(row, col) = Cell::Break;
                    }
                }
            }
        }
        BreakPolicy::Inferred if placements.is_empty() => {
            tracing::debug!("No lessons this week, skipping break inference");
        }
        BreakPolicy::Inferred => {
            for (row, slot) in slots.iter().enumerate() {
                for col in 0..days.len() {
                    let busy = placements
                        .iter()
                        .any(|p| p.col == col && slot.overlaps(p.start, p.end));
                    let cell = grid.cell_mut(row, col);
                    if cell.is_empty() && !busy {
                        *cell = Cell::Break;
                    }
                }
            }
        }
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{SlotMode, default_bell_schedule};
    use crate::week::WeekWindow;
    use chrono::{NaiveDate, TimeZone, Utc, Weekday};
    use chrono_tz::Europe::Amsterdam;

    fn week() -> WeekWindow {
        WeekWindow::containing(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), Amsterdam)
    }

    /// Lesson on March `day` 2024, Amsterdam wall-clock times
    fn lesson(subject: &str, day: u32, (sh, sm): (u32, u32), (eh, em): (u32, u32)) -> Event {
        let start = Amsterdam.with_ymd_and_hms(2024, 3, day, sh, sm, 0).unwrap();
        let end = Amsterdam.with_ymd_and_hms(2024, 3, day, eh, em, 0).unwrap();
        Event::new(subject, start.with_timezone(&Utc), end.with_timezone(&Utc))
    }

    fn slots(ranges: &[&str]) -> Vec<TimeSlot> {
        ranges.iter().map(|r| r.parse().unwrap()).collect()
    }

    fn subject_at(grid: &ScheduleGrid, slot: &str, day: Weekday) -> Option<String> {
        grid.get(slot, day)
            .and_then(Cell::event)
            .map(|e| e.subject.clone())
    }

    #[test]
    fn lesson_fills_every_overlapped_slot() {
        let slots = slots(&["08:30 - 09:00", "09:00 - 09:30", "09:30 - 10:00"]);
        let events = vec![lesson("Wiskunde", 4, (8, 30), (9, 15))];

        let grid = project(&slots, &week().days(), &events, Amsterdam, ProjectionPolicy::default());

        assert_eq!(subject_at(&grid, "08:30 - 09:00", Weekday::Mon).as_deref(), Some("Wiskunde"));
        assert_eq!(subject_at(&grid, "09:00 - 09:30", Weekday::Mon).as_deref(), Some("Wiskunde"));
        assert_eq!(grid.get("09:30 - 10:00", Weekday::Mon), Some(&Cell::Break));
        assert_eq!(grid.get("08:30 - 09:00", Weekday::Tue), Some(&Cell::Break));
        assert_eq!(grid.lessons().count(), 2);
    }

    #[test]
    fn last_event_wins_by_default() {
        let slots = slots(&["09:00 - 10:00"]);
        let events = vec![
            lesson("Engels", 5, (9, 0), (10, 0)),
            lesson("Duits", 5, (9, 30), (10, 30)),
        ];

        let grid = project(&slots, &week().days(), &events, Amsterdam, ProjectionPolicy::default());

        assert_eq!(subject_at(&grid, "09:00 - 10:00", Weekday::Tue).as_deref(), Some("Duits"));
    }

    #[test]
    fn first_wins_keeps_the_earlier_event() {
        let slots = slots(&["09:00 - 10:00"]);
        let events = vec![
            lesson("Engels", 5, (9, 0), (10, 0)),
            lesson("Duits", 5, (9, 30), (10, 30)),
        ];
        let policy = ProjectionPolicy {
            conflicts: ConflictPolicy::FirstWins,
            ..Default::default()
        };

        let grid = project(&slots, &week().days(), &events, Amsterdam, policy);

        assert_eq!(subject_at(&grid, "09:00 - 10:00", Weekday::Tue).as_deref(), Some("Engels"));
    }

    #[test]
    fn declared_breaks_override_overlapping_lessons() {
        let slots = default_bell_schedule();
        // Runs straight through the 10:30 - 10:50 break
        let events = vec![lesson("Project", 6, (10, 0), (11, 20))];
        let policy = ProjectionPolicy {
            breaks: BreakPolicy::Declared,
            ..Default::default()
        };

        let grid = project(&slots, &week().days(), &events, Amsterdam, policy);

        for day in week().days() {
            assert_eq!(grid.get("10:30 - 10:50", day.weekday), Some(&Cell::Break));
        }
        assert_eq!(subject_at(&grid, "10:00 - 10:30", Weekday::Wed).as_deref(), Some("Project"));
        assert_eq!(subject_at(&grid, "10:50 - 11:20", Weekday::Wed).as_deref(), Some("Project"));
        // Declared mode never invents breaks in lesson slots
        assert_eq!(grid.get("08:00 - 08:30", Weekday::Wed), Some(&Cell::Empty));
    }

    #[test]
    fn inferred_breaks_are_per_day() {
        let slots = slots(&["08:30 - 09:15", "09:15 - 10:00", "10:00 - 10:20"]);
        let events = vec![
            lesson("Wiskunde", 4, (8, 30), (9, 15)),
            lesson("Engels", 5, (9, 15), (10, 20)),
        ];

        let grid = project(&slots, &week().days(), &events, Amsterdam, ProjectionPolicy::default());

        assert_eq!(grid.get("09:15 - 10:00", Weekday::Mon), Some(&Cell::Break));
        assert_eq!(grid.get("08:30 - 09:15", Weekday::Tue), Some(&Cell::Break));
        assert_eq!(subject_at(&grid, "10:00 - 10:20", Weekday::Tue).as_deref(), Some("Engels"));
        // A day without lessons is all breaks
        assert!(grid.rows().iter().all(|r| r.cells[4].is_break()));
    }

    #[test]
    fn no_events_means_no_inferred_breaks() {
        let grid = project(
            &slots(&["08:30 - 09:00"]),
            &week().days(),
            &[],
            Amsterdam,
            ProjectionPolicy::default(),
        );

        assert!(grid.rows()[0].cells.iter().all(Cell::is_empty));
    }

    #[test]
    fn skips_untimed_and_out_of_week_events() {
        let slots = slots(&["09:00 - 10:00"]);
        let mut untimed = lesson("Untimed", 4, (9, 0), (10, 0));
        untimed.end = None;
        let next_week = lesson("Later", 11, (9, 0), (10, 0));
        let monday = lesson("Frans", 4, (9, 0), (10, 0));

        let grid = project(
            &slots,
            &week().days(),
            &[untimed, next_week, monday],
            Amsterdam,
            ProjectionPolicy::default(),
        );

        assert_eq!(subject_at(&grid, "09:00 - 10:00", Weekday::Mon).as_deref(), Some("Frans"));
        assert_eq!(grid.lessons().count(), 1);
    }

    #[test]
    fn every_cell_is_present() {
        let events = vec![lesson("Wiskunde", 4, (8, 30), (9, 15))];
        let slots = SlotMode::fixed_default().generate(&events, Amsterdam);

        let grid = project(&slots, &week().days(), &events, Amsterdam, ProjectionPolicy::default());

        assert_eq!(grid.rows().len(), slots.len());
        assert!(grid.rows().iter().all(|row| row.cells.len() == 5));
    }
}
