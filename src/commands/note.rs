use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use weekrooster::{AppConfig, NoteStore};
use weekrooster_core::EventKey;

/// Lesson start as RFC 3339, e.g. `2024-03-04T08:30:00+01:00`
fn parse_key(start: &str, subject: &str) -> Result<EventKey> {
    let start = DateTime::parse_from_rfc3339(start)
        .with_context(|| format!("Invalid start '{start}', expected e.g. 2024-03-04T08:30:00+01:00"))?;
    Ok(EventKey::new(start.with_timezone(&Utc), subject))
}

fn open_store() -> Result<NoteStore> {
    let cfg = AppConfig::load()?;
    NoteStore::load(cfg.notes_path())
}

pub fn set(start: &str, subject: &str, text: &str) -> Result<()> {
    let key = parse_key(start, subject)?;
    let mut store = open_store()?;
    store.set_text(&key, text);
    store.save()?;

    println!("Saved note for {}", subject.green());
    Ok(())
}

pub fn toggle(start: &str, subject: &str) -> Result<()> {
    let key = parse_key(start, subject)?;
    let mut store = open_store()?;
    let visible = store.toggle_visibility(&key);
    store.save()?;

    println!("Note for {} is now {}", subject, if visible { "shown" } else { "hidden" });
    Ok(())
}

pub fn remove(start: &str, subject: &str) -> Result<()> {
    let key = parse_key(start, subject)?;
    let mut store = open_store()?;

    if store.remove(&key).is_none() {
        anyhow::bail!("No note for {subject} at {start}");
    }
    store.save()?;

    println!("Removed note for {}", subject.red());
    Ok(())
}

pub fn list() -> Result<()> {
    let store = open_store()?;

    if store.is_empty() {
        println!("No notes.");
        return Ok(());
    }

    for (key, note) in store.iter() {
        let text = if note.visible {
            note.text.clone()
        } else {
            format!("{} (hidden)", note.text).dimmed().to_string()
        };
        println!("{}  {}", key.dimmed(), text);
    }
    Ok(())
}
