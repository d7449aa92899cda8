//! Personal notes attached to lessons.
//!
//! Notes are keyed by [`EventKey`] (start instant + subject), so they follow
//! a lesson across refetches as long as the feed keeps its start and title.
//! A note also remembers whether it is shown in the table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use weekrooster_core::{Event, EventKey};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub visible: bool,
}

impl Note {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && !self.visible
    }
}

/// Notes stored as one JSON object: `{ "<start>_<subject>": { text, visible } }`.
#[derive(Debug, Default)]
pub struct NoteStore {
    path: PathBuf,
    notes: BTreeMap<String, Note>,
}

impl NoteStore {
    /// Load notes from `path`; a missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                notes: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read notes from {}", path.display()))?;
        let notes = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse notes in {}", path.display()))?;

        Ok(Self { path, notes })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.notes)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write notes to {}", self.path.display()))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &EventKey) -> Option<&Note> {
        self.notes.get(&key.storage_key())
    }

    /// The note for `event`, if it is timed and has one.
    pub fn note_for(&self, event: &Event) -> Option<&Note> {
        event.key().and_then(|key| self.get(&key))
    }

    /// The note text to show next to `event`, if any.
    pub fn visible_text(&self, event: &Event) -> Option<&str> {
        self.note_for(event)
            .filter(|note| note.visible && !note.text.trim().is_empty())
            .map(|note| note.text.as_str())
    }

    /// Replace the text of a note. Writing a new note makes it visible.
    pub fn set_text(&mut self, key: &EventKey, text: impl Into<String>) {
        let storage_key = key.storage_key();
        let note = self.notes.entry(storage_key.clone()).or_insert_with(|| Note {
            visible: true,
            ..Default::default()
        });
        note.text = text.into();
        self.prune(&storage_key);
    }

    /// Flip visibility; returns the new state.
    pub fn toggle_visibility(&mut self, key: &EventKey) -> bool {
        let storage_key = key.storage_key();
        let note = self.notes.entry(storage_key.clone()).or_default();
        note.visible = !note.visible;
        let visible = note.visible;
        self.prune(&storage_key);
        visible
    }

    pub fn remove(&mut self, key: &EventKey) -> Option<Note> {
        self.notes.remove(&key.storage_key())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Note)> {
        self.notes.iter().map(|(key, note)| (key.as_str(), note))
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn prune(&mut self, storage_key: &str) {
        if self.notes.get(storage_key).is_some_and(Note::is_blank) {
            self.notes.remove(storage_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(subject: &str) -> EventKey {
        EventKey::new(Utc.with_ymd_and_hms(2024, 3, 4, 7, 30, 0).unwrap(), subject)
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        let store = NoteStore::load(dir.path().join("notes.json")).unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn notes_persist_under_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("notes.json");

        let mut store = NoteStore::load(&path).unwrap();
        store.set_text(&key("Wiskunde"), "Huiswerk: opgave 3");
        store.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["2024-03-04T07:30:00.000Z_Wiskunde"]["text"], "Huiswerk: opgave 3");
        assert_eq!(raw["2024-03-04T07:30:00.000Z_Wiskunde"]["visible"], true);

        let reloaded = NoteStore::load(&path).unwrap();
        assert_eq!(reloaded.get(&key("Wiskunde")).unwrap().text, "Huiswerk: opgave 3");
        assert!(reloaded.get(&key("Engels")).is_none());
    }

    #[test]
    fn toggling_hides_without_losing_text() {
        let mut store = NoteStore::default();
        store.set_text(&key("Engels"), "Toets");

        assert!(!store.toggle_visibility(&key("Engels")));
        assert_eq!(store.get(&key("Engels")).unwrap().text, "Toets");

        let event = Event::new(
            "Engels",
            Utc.with_ymd_and_hms(2024, 3, 4, 7, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 8, 15, 0).unwrap(),
        );
        assert_eq!(store.visible_text(&event), None);
        assert!(store.toggle_visibility(&key("Engels")));
        assert_eq!(store.visible_text(&event), Some("Toets"));
    }

    #[test]
    fn blank_hidden_notes_are_dropped() {
        let mut store = NoteStore::default();

        assert!(store.toggle_visibility(&key("Duits")));
        assert_eq!(store.len(), 1);
        assert!(!store.toggle_visibility(&key("Duits")));
        assert!(store.is_empty());

        store.set_text(&key("Frans"), "x");
        store.toggle_visibility(&key("Frans"));
        store.set_text(&key("Frans"), "  ");
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "not json").unwrap();

        let err = NoteStore::load(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse notes"));
    }
}
