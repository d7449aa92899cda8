//! The projected (slot × weekday) table.

use chrono::Weekday;
use serde::Serialize;

use crate::error::{RoosterError, RoosterResult};
use crate::event::Event;
use crate::slot::TimeSlot;
use crate::week::WeekDay;

/// Content of one (slot, weekday) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Lesson(Event),
    /// Synthetic placeholder: a declared break slot or an inferred gap
    Break,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Cell::Break)
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            Cell::Lesson(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub slot: TimeSlot,
    /// One cell per day, in the grid's day order
    pub cells: Vec<Cell>,
}

impl GridRow {
    pub fn has_lessons(&self) -> bool {
        self.cells.iter().any(|c| c.event().is_some())
    }
}

/// Every slot of the day crossed with the five weekdays of a week.
///
/// Rebuilt wholesale on every load; never mutated after projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleGrid {
    days: Vec<WeekDay>,
    rows: Vec<GridRow>,
}

impl ScheduleGrid {
    /// All cells empty.
    pub fn new(slots: Vec<TimeSlot>, days: Vec<WeekDay>) -> Self {
        let rows = slots
            .into_iter()
            .map(|slot| GridRow {
                slot,
                cells: vec![Cell::Empty; days.len()],
            })
            .collect();
        ScheduleGrid { days, rows }
    }

    pub fn days(&self) -> &[WeekDay] {
        &self.days
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.rows.iter().map(|row| &row.slot)
    }

    pub fn day_index(&self, weekday: Weekday) -> Option<usize> {
        self.days.iter().position(|d| d.weekday == weekday)
    }

    pub fn cell(&self, row: usize, weekday: Weekday) -> Option<&Cell> {
        let col = self.day_index(weekday)?;
        self.rows.get(row)?.cells.get(col)
    }

    /// Look a cell up by slot range label ("10:30 - 10:50") and weekday.
    pub fn get(&self, slot: &str, weekday: Weekday) -> Option<&Cell> {
        let row = self.rows.iter().position(|r| r.slot.range_label() == slot)?;
        self.cell(row, weekday)
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        &mut self.rows[row].cells[col]
    }

    /// Every lesson cell, row by row. A lesson spanning several slots
    /// appears once per slot.
    pub fn lessons(&self) -> impl Iterator<Item = &Event> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter().filter_map(Cell::event))
    }

    pub fn has_lessons(&self) -> bool {
        self.rows.iter().any(GridRow::has_lessons)
    }

    /// Drop lesson rows with nothing in them. Declared break rows and rows
    /// holding inferred breaks stay.
    pub fn compact(&self) -> ScheduleGrid {
        let rows: Vec<GridRow> = self
            .rows
            .iter()
            .filter(|row| row.slot.is_break() || row.cells.iter().any(|c| !c.is_empty()))
            .cloned()
            .collect();

        if rows.is_empty() {
            return self.clone();
        }
        ScheduleGrid {
            days: self.days.clone(),
            rows,
        }
    }

    pub fn to_json_pretty(&self) -> RoosterResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RoosterError::Serialization(e.to_string()))
    }
}
