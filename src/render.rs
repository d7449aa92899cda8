//! Terminal rendering of a weekly grid.
//!
//! Layout is computed on plain text first and colored afterwards, since
//! ANSI codes would throw off column widths.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use weekrooster_core::slot::{BREAK_LABEL, current_slot_index, minute_of_day};
use weekrooster_core::{Cell, ScheduleGrid, TimeSlot, WeekDay};

use crate::notes::NoteStore;

const MAX_CELL_WIDTH: usize = 28;
const NOTE_MARKER: &str = "*";
const TIME_HEADER: &str = "Tijd";

pub trait Render {
    fn render(&self) -> String;
}

impl Render for WeekDay {
    fn render(&self) -> String {
        format!("{} {}-{}", self.name, self.date.day(), self.date.month())
    }
}

impl Render for TimeSlot {
    fn render(&self) -> String {
        match self.label() {
            Some(label) => format!("{} {}", self.range_label(), label),
            None => self.range_label(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// No ANSI colors
    pub plain: bool,
    /// Only break rows and rows with lessons
    pub compact: bool,
    /// Highlight the day and slot containing this local time
    pub now: Option<DateTime<Tz>>,
}

/// Where "now" falls in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Highlight {
    col: usize,
    row: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tone {
    Normal,
    Header,
    Lesson,
    Break,
    Current,
}

pub struct TableView<'a> {
    grid: &'a ScheduleGrid,
    notes: Option<&'a NoteStore>,
    options: RenderOptions,
}

impl<'a> TableView<'a> {
    pub fn new(grid: &'a ScheduleGrid, options: RenderOptions) -> Self {
        Self {
            grid,
            notes: None,
            options,
        }
    }

    pub fn with_notes(mut self, notes: &'a NoteStore) -> Self {
        self.notes = Some(notes);
        self
    }

    fn highlight(&self, grid: &ScheduleGrid) -> Option<Highlight> {
        let now = self.options.now?;
        let col = grid.days().iter().position(|d| d.date == now.date_naive())?;
        let slots: Vec<TimeSlot> = grid.slots().cloned().collect();
        let row = current_slot_index(&slots, minute_of_day(&now));
        Some(Highlight { col, row })
    }

    fn cell_text(&self, cell: &Cell, slot: &TimeSlot) -> String {
        match cell {
            Cell::Empty => String::new(),
            Cell::Break => slot.label().unwrap_or(BREAK_LABEL).to_string(),
            Cell::Lesson(event) => {
                let text = event.display_text();
                match self.notes.and_then(|notes| notes.visible_text(event)) {
                    Some(_) => format!("{text} {NOTE_MARKER}"),
                    None => text,
                }
            }
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if self.options.plain {
            return text.to_string();
        }
        match tone {
            Tone::Normal => text.to_string(),
            Tone::Header => text.bold().to_string(),
            Tone::Lesson => text.green().to_string(),
            Tone::Break => text.dimmed().to_string(),
            Tone::Current => text.yellow().bold().to_string(),
        }
    }

    /// Footnotes for lessons whose note is shown.
    fn footnotes(&self, grid: &ScheduleGrid) -> Vec<String> {
        let Some(notes) = self.notes else {
            return Vec::new();
        };

        let mut seen = Vec::new();
        let mut lines = Vec::new();
        for (col, day) in grid.days().iter().enumerate() {
            for row in grid.rows() {
                let Cell::Lesson(event) = &row.cells[col] else {
                    continue;
                };
                let Some(text) = notes.visible_text(event) else {
                    continue;
                };
                if seen.contains(&event.key()) {
                    continue;
                }
                seen.push(event.key());
                lines.push(format!(
                    "{} {} {} {}: {}",
                    NOTE_MARKER,
                    day.name,
                    row.slot.range_label(),
                    event.subject,
                    text
                ));
            }
        }
        lines
    }
}

impl Render for TableView<'_> {
    fn render(&self) -> String {
        let compacted;
        let grid = if self.options.compact {
            compacted = self.grid.compact();
            &compacted
        } else {
            self.grid
        };

        let highlight = self.highlight(grid);

        let header: Vec<String> = std::iter::once(TIME_HEADER.to_string())
            .chain(grid.days().iter().map(Render::render))
            .collect();
        let body: Vec<Vec<String>> = grid
            .rows()
            .iter()
            .map(|row| {
                std::iter::once(row.slot.render())
                    .chain(row.cells.iter().map(|cell| self.cell_text(cell, &row.slot)))
                    .map(|text| truncate(&text, MAX_CELL_WIDTH))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                std::iter::once(&header[col])
                    .chain(body.iter().map(|row| &row[col]))
                    .map(|text| text.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let separator = format!(
            "+{}+",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("+")
        );

        let mut lines = vec![separator.clone()];

        let header_cells: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(col, text)| {
                let current = highlight.is_some_and(|h| col == h.col + 1);
                let tone = if current { Tone::Current } else { Tone::Header };
                self.paint(&pad(text, widths[col]), tone)
            })
            .collect();
        lines.push(format!("| {} |", header_cells.join(" | ")));
        lines.push(separator.clone());

        for (row_index, (row, texts)) in grid.rows().iter().zip(&body).enumerate() {
            let cells: Vec<String> = texts
                .iter()
                .enumerate()
                .map(|(col, text)| {
                    let padded = pad(text, widths[col]);
                    let tone = if col == 0 {
                        if row.slot.is_break() { Tone::Break } else { Tone::Normal }
                    } else if highlight.is_some_and(|h| h.col + 1 == col && h.row == Some(row_index)) {
                        Tone::Current
                    } else {
                        match &row.cells[col - 1] {
                            Cell::Lesson(_) => Tone::Lesson,
                            Cell::Break => Tone::Break,
                            Cell::Empty => Tone::Normal,
                        }
                    };
                    self.paint(&padded, tone)
                })
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
        lines.push(separator);

        let footnotes = self.footnotes(grid);
        if !footnotes.is_empty() {
            lines.push(String::new());
            lines.extend(footnotes);
        }

        lines.join("\n")
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max - 1).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Europe::Amsterdam;
    use weekrooster_core::{Event, EventKey, SlotMode, Timetable, WeekWindow};

    fn week() -> WeekWindow {
        WeekWindow::containing(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), Amsterdam)
    }

    fn wiskunde() -> Event {
        Event::new(
            "Wiskunde",
            Utc.with_ymd_and_hms(2024, 3, 4, 7, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 8, 15, 0).unwrap(),
        )
        .with_location("A101")
    }

    fn plain() -> RenderOptions {
        RenderOptions {
            plain: true,
            ..Default::default()
        }
    }

    #[test]
    fn plain_table_has_day_headers_and_lesson_text() {
        let grid = Timetable::new(Amsterdam, SlotMode::default()).project(&[wiskunde()], &week());

        let output = TableView::new(&grid, plain()).render();
        println!("{output}");

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[1].starts_with("| Tijd "));
        assert!(lines[1].contains("maandag 4-3"));
        assert!(lines[1].contains("vrijdag 8-3"));
        assert!(lines[3].starts_with("| 08:30 - 09:15 | Wiskunde A101 |"));
        assert!(lines[3].contains("| Pauze "));
        assert!(!output.contains('\u{1b}'));
        // All rows line up
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
    }

    #[test]
    fn break_rows_show_their_label() {
        let grid = Timetable::new(Amsterdam, SlotMode::fixed_default()).project(&[wiskunde()], &week());

        let output = TableView::new(&grid, plain()).render();

        let row = output.lines().find(|l| l.starts_with("| 10:30 - 10:50")).unwrap();
        assert!(row.starts_with("| 10:30 - 10:50 Pauze |"));
        assert_eq!(row.matches("Pauze").count(), 6);
    }

    #[test]
    fn compact_hides_empty_lesson_rows() {
        let grid = Timetable::new(Amsterdam, SlotMode::fixed_default()).project(&[wiskunde()], &week());
        let options = RenderOptions {
            compact: true,
            ..plain()
        };

        let output = TableView::new(&grid, options).render();

        assert!(output.contains("08:30 - 09:00"));
        assert!(output.contains("11:50 - 12:10"));
        assert!(!output.contains("16:30 - 17:00"));
    }

    #[test]
    fn visible_notes_get_a_marker_and_footnote() {
        let grid = Timetable::new(Amsterdam, SlotMode::default()).project(&[wiskunde()], &week());
        let mut notes = NoteStore::default();
        let key = EventKey::new(Utc.with_ymd_and_hms(2024, 3, 4, 7, 30, 0).unwrap(), "Wiskunde");
        notes.set_text(&key, "Rekenmachine mee");

        let output = TableView::new(&grid, plain()).with_notes(&notes).render();

        assert!(output.contains("Wiskunde A101 *"));
        assert!(output.ends_with("* maandag 08:30 - 09:15 Wiskunde: Rekenmachine mee"));

        notes.toggle_visibility(&key);
        let hidden = TableView::new(&grid, plain()).with_notes(&notes).render();
        assert!(!hidden.contains('*'));
    }

    #[test]
    fn colored_output_marks_the_current_slot() {
        let grid = Timetable::new(Amsterdam, SlotMode::default()).project(&[wiskunde()], &week());
        let options = RenderOptions {
            now: Some(Amsterdam.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()),
            ..Default::default()
        };
        let view = TableView::new(&grid, options);

        assert_eq!(view.highlight(&grid), Some(Highlight { col: 0, row: Some(0) }));
        let output = view.render();
        assert!(output.contains(&"Wiskunde A101".yellow().bold().to_string()));
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("Maatschappijleer", 8), "Maatsch…");
        assert_eq!(truncate("Duits", 8), "Duits");
    }
}
