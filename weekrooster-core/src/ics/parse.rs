//! Line-oriented VEVENT extraction.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::unfold;

use crate::event::{Event, NO_LOCATION, UNKNOWN_TEACHER};

const TEACHER_LABEL: &str = "docent: ";

/// Parse every VEVENT in `content`, reading floating times as UTC.
pub fn parse_events(content: &str) -> Vec<Event> {
    parse_with_zone(content, None)
}

/// Parse every VEVENT in `content`, reading floating times as wall-clock
/// time in `zone`.
pub fn parse_events_in(content: &str, zone: Tz) -> Vec<Event> {
    parse_with_zone(content, Some(zone))
}

/// Fields collected while inside a VEVENT block
#[derive(Default)]
struct PendingEvent {
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl PendingEvent {
    fn finish(self) -> Event {
        let location = self
            .location
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| NO_LOCATION.to_string());
        let teacher = self
            .description
            .as_deref()
            .and_then(extract_teacher)
            .unwrap_or_else(|| UNKNOWN_TEACHER.to_string());

        Event {
            subject: self.summary.unwrap_or_default(),
            location,
            teacher,
            start: self.start,
            end: self.end,
        }
    }
}

fn parse_with_zone(content: &str, zone: Option<Tz>) -> Vec<Event> {
    let unfolded = unfold(content);

    let mut events = Vec::new();
    let mut pending: Option<PendingEvent> = None;
    // Depth of sub-components (VALARM, ...) open inside the current VEVENT
    let mut nested = 0usize;

    for line in unfolded.lines() {
        let line = line.trim();
        let Some((name, value)) = split_property(line) else {
            continue;
        };

        match name.as_str() {
            "BEGIN" => {
                let is_vevent = value.eq_ignore_ascii_case("VEVENT");
                match (pending.is_some(), is_vevent) {
                    (true, true) if nested == 0 => {
                        tracing::debug!("Dropping VEVENT without END:VEVENT");
                        pending = Some(PendingEvent::default());
                    }
                    (true, _) => nested += 1,
                    (false, true) => pending = Some(PendingEvent::default()),
                    (false, false) => {}
                }
            }
            "END" => {
                if pending.is_none() {
                    continue;
                }
                let closes_event = value.eq_ignore_ascii_case("VEVENT");
                if nested > 0 && closes_event {
                    tracing::debug!("END:VEVENT with {} sub-component(s) still open", nested);
                    nested = 0;
                    if let Some(done) = pending.take() {
                        events.push(done.finish());
                    }
                } else if nested > 0 {
                    nested -= 1;
                } else if closes_event {
                    if let Some(done) = pending.take() {
                        events.push(done.finish());
                    }
                } else {
                    tracing::debug!("Dropping VEVENT closed by END:{}", value);
                    pending = None;
                }
            }
            _ => {
                if nested > 0 {
                    continue;
                }
                if let Some(event) = pending.as_mut() {
                    apply_property(event, &name, value, zone);
                }
            }
        }
    }

    if pending.is_some() {
        tracing::debug!("Feed ended inside a VEVENT; block dropped");
    }

    let unschedulable = events.iter().filter(|e| !e.is_schedulable()).count();
    tracing::debug!(
        "Parsed {} events ({} without a usable start/end)",
        events.len(),
        unschedulable
    );

    events
}

fn apply_property(event: &mut PendingEvent, name: &str, value: &str, zone: Option<Tz>) {
    match name {
        "SUMMARY" => event.summary = Some(unescape_text(value)),
        "LOCATION" => event.location = Some(unescape_text(value).trim().to_string()),
        "DESCRIPTION" => event.description = Some(unescape_text(value)),
        "DTSTART" => event.start = parse_timestamp(value, zone),
        "DTEND" => event.end = parse_timestamp(value, zone),
        _ => {}
    }
}

/// Split `NAME;PARAM=x:value` into the upper-cased name and the raw value.
fn split_property(line: &str) -> Option<(String, &str)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next().unwrap_or(head).trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_uppercase(), value))
}

/// Parse `YYYYMMDDTHHMMSSZ` (UTC) or `YYYYMMDDTHHMMSS` (floating).
///
/// Date-only values and anything unparseable yield `None`.
fn parse_timestamp(value: &str, zone: Option<Tz>) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    match zone {
        Some(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Some(naive.and_utc()),
    }
}

/// Pull the teacher out of `... Docent: <name>, ...`.
///
/// The label is matched case-insensitively; the name runs to the next comma
/// or line break.
fn extract_teacher(description: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with the original
    let lower = description.to_ascii_lowercase();
    let at = lower.find(TEACHER_LABEL)?;
    let rest = &description[at + TEACHER_LABEL.len()..];

    let name = rest
        .split([',', '\n'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Undo RFC 5545 TEXT escaping (`\,` `\;` `\n` `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
