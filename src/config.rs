//! weekrooster configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use weekrooster_core::slot::{DEFAULT_MIN_GAP_MINUTES, default_bell_schedule, validate_fixed};
use weekrooster_core::{
    BreakPolicy, ConflictPolicy, ProjectionPolicy, RoosterError, RoosterResult, SlotMode,
    TimeSlot, Timetable,
};

use crate::feed::{FetchStrategy, default_strategies};

static DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";
static ENV_PREFIX: &str = "WEEKROOSTER";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_timezone() -> Tz {
    chrono_tz::Europe::Amsterdam
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("weekrooster"))
        .unwrap_or_else(|| PathBuf::from("~/.weekrooster"))
}

fn default_min_gap() -> u16 {
    DEFAULT_MIN_GAP_MINUTES
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Configuration at ~/.config/weekrooster/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Zone in which lesson times and week boundaries are read
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Where notes are stored (`~` is expanded)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub schedules: Vec<ScheduleSource>,

    /// Name of the schedule shown by default; the first one when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_schedule: Option<String>,

    #[serde(default)]
    pub slots: SlotConfig,

    #[serde(default)]
    pub projection: ProjectionConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

/// A named feed, e.g. one per child or per class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotModeName {
    Fixed,
    #[default]
    Dynamic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    #[serde(default)]
    pub mode: SlotModeName,

    #[serde(default = "default_min_gap")]
    pub min_gap_minutes: u16,

    /// Bell schedule for fixed mode; the built-in one when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixed: Vec<TimeSlot>,
}

impl Default for SlotConfig {
    fn default() -> Self {
        SlotConfig {
            mode: SlotModeName::default(),
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
            fixed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Defaults to `declared` in fixed mode and `inferred` in dynamic mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breaks: Option<BreakPolicy>,

    #[serde(default)]
    pub conflicts: ConflictPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Tried in order until one returns a calendar
    #[serde(default = "default_strategies")]
    pub strategies: Vec<FetchStrategy>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            strategies: default_strategies(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            timezone: default_timezone(),
            data_dir: default_data_dir(),
            schedules: Vec::new(),
            active_schedule: None,
            slots: SlotConfig::default(),
            projection: ProjectionConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> RoosterResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RoosterError::Config("Could not determine config directory".into()))?
            .join("weekrooster");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented file on first use.
    pub fn load() -> RoosterResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load `path` (optional) with `WEEKROOSTER_*` environment overrides.
    pub fn load_from(path: &Path) -> RoosterResult<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load_from`], reading overrides from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(path: &Path, env: Option<config::Map<String, String>>) -> RoosterResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .map_err(|e| RoosterError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RoosterError::Config(e.to_string()))
    }

    pub fn save(&self) -> RoosterResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> RoosterResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| RoosterError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RoosterError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| RoosterError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a config file with all options commented out.
    pub fn create_default_config(path: &Path) -> RoosterResult<()> {
        let contents = format!(
            "\
# weekrooster configuration

# Zone used for lesson times and week boundaries:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Where lesson notes are kept:
# data_dir = \"~/.local/share/weekrooster\"

# Feeds, added with `weekrooster schedule add <name> <url>`:
# [[schedules]]
# name = \"Sanne\"
# url = \"https://example.org/rooster.ics\"

# [slots]
# mode = \"dynamic\"          # or \"fixed\" for the built-in bell schedule
# min_gap_minutes = 5

# [projection]
# breaks = \"inferred\"       # or \"declared\"
# conflicts = \"last_wins\"   # or \"first_wins\"

# [fetch]
# timeout_secs = {DEFAULT_TIMEOUT_SECS}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RoosterError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RoosterError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned())
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_path().join("notes.json")
    }

    /// The selected schedule, falling back to the first one.
    pub fn active(&self) -> Option<&ScheduleSource> {
        self.active_schedule
            .as_ref()
            .and_then(|name| self.schedule(name))
            .or_else(|| self.schedules.first())
    }

    pub fn schedule(&self, name: &str) -> Option<&ScheduleSource> {
        self.schedules.iter().find(|s| s.name == name)
    }

    /// Add (or re-point) a schedule and make it the active one.
    pub fn add_schedule(&mut self, name: &str, url: &str) -> RoosterResult<()> {
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(RoosterError::Config("Schedule name and URL are required".into()));
        }

        match self.schedules.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.url = url.to_string(),
            None => self.schedules.push(ScheduleSource {
                name: name.to_string(),
                url: url.to_string(),
            }),
        }
        self.active_schedule = Some(name.to_string());
        Ok(())
    }

    pub fn use_schedule(&mut self, name: &str) -> RoosterResult<()> {
        if self.schedule(name).is_none() {
            return Err(RoosterError::UnknownSchedule(name.to_string()));
        }
        self.active_schedule = Some(name.to_string());
        Ok(())
    }

    /// Remove a schedule. Removing the active one activates the first left.
    pub fn remove_schedule(&mut self, name: &str) -> RoosterResult<ScheduleSource> {
        let index = self
            .schedules
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| RoosterError::UnknownSchedule(name.to_string()))?;
        let removed = self.schedules.remove(index);

        if self.active_schedule.as_deref() == Some(name) {
            self.active_schedule = self.schedules.first().map(|s| s.name.clone());
        }
        Ok(removed)
    }

    pub fn slot_mode(&self) -> RoosterResult<SlotMode> {
        Ok(match self.slots.mode {
            SlotModeName::Dynamic => SlotMode::Dynamic {
                min_gap_minutes: self.slots.min_gap_minutes,
            },
            SlotModeName::Fixed if self.slots.fixed.is_empty() => {
                SlotMode::Fixed(default_bell_schedule())
            }
            SlotModeName::Fixed => SlotMode::Fixed(validate_fixed(self.slots.fixed.clone())?),
        })
    }

    pub fn timetable(&self) -> RoosterResult<Timetable> {
        let timetable = Timetable::new(self.timezone, self.slot_mode()?);
        let policy = ProjectionPolicy {
            breaks: self.projection.breaks.unwrap_or(timetable.policy.breaks),
            conflicts: self.projection.conflicts,
        };
        Ok(timetable.with_policy(policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.timezone, chrono_tz::Europe::Amsterdam);
        assert!(config.active().is_none());
        assert_eq!(config.fetch.strategies, default_strategies());
        assert!(matches!(config.slot_mode().unwrap(), SlotMode::Dynamic { min_gap_minutes: 5 }));
        assert_eq!(config.timetable().unwrap().policy.breaks, BreakPolicy::Inferred);
    }

    #[test]
    fn default_config_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        AppConfig::create_default_config(&path).unwrap();
        let config = AppConfig::load_from(&path).unwrap();

        assert!(config.schedules.is_empty());
    }

    #[test]
    fn fixed_mode_reads_custom_bells_and_declares_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
timezone = "UTC"

[[schedules]]
name = "Sanne"
url = "https://example.org/sanne.ics"

[slots]
mode = "fixed"
fixed = [
    { time = "09:00 - 09:50" },
    { time = "08:10 - 09:00" },
    { time = "09:50 - 10:10", kind = "break", label = "Kleine pauze" },
]
"#,
        );

        let config = AppConfig::load_from(&path).unwrap();
        let timetable = config.timetable().unwrap();

        assert_eq!(timetable.zone, chrono_tz::UTC);
        assert_eq!(timetable.policy.breaks, BreakPolicy::Declared);
        let SlotMode::Fixed(slots) = timetable.slots else {
            panic!("expected fixed slots");
        };
        assert_eq!(slots[0].range_label(), "08:10 - 09:00");
        assert_eq!(slots[2].label(), Some("Kleine pauze"));
        assert_eq!(config.active().map(|s| s.name.as_str()), Some("Sanne"));
    }

    #[test]
    fn environment_overrides_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
timezone = "Europe/Amsterdam"

[slots]
mode = "dynamic"
"#,
        );
        let env = config::Map::from([
            ("WEEKROOSTER_SLOTS__MODE".to_string(), "fixed".to_string()),
            ("WEEKROOSTER_TIMEZONE".to_string(), "UTC".to_string()),
            ("OTHERAPP_TIMEZONE".to_string(), "Asia/Tokyo".to_string()),
        ]);

        let config = AppConfig::load_with_env(&path, Some(env)).unwrap();

        assert_eq!(config.slots.mode, SlotModeName::Fixed);
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert!(config.slot_mode().unwrap().is_fixed());
    }

    #[test]
    fn overlapping_bells_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[slots]
mode = "fixed"
fixed = [{ time = "09:00 - 10:00" }, { time = "09:30 - 10:30" }]
"#,
        );

        let config = AppConfig::load_from(&path).unwrap();

        assert!(matches!(config.timetable(), Err(RoosterError::InvalidTimeSlot(_))));
    }

    #[test]
    fn schedule_management() {
        let mut config = AppConfig::default();

        config.add_schedule("Sanne", "https://example.org/a.ics").unwrap();
        config.add_schedule("Daan", "https://example.org/b.ics").unwrap();
        assert_eq!(config.active().unwrap().name, "Daan");

        config.use_schedule("Sanne").unwrap();
        assert_eq!(config.active().unwrap().name, "Sanne");
        assert!(matches!(
            config.use_schedule("Nobody"),
            Err(RoosterError::UnknownSchedule(_))
        ));

        config.add_schedule("Sanne", "https://example.org/new.ics").unwrap();
        assert_eq!(config.schedules.len(), 2);
        assert_eq!(config.active().unwrap().url, "https://example.org/new.ics");

        config.remove_schedule("Sanne").unwrap();
        assert_eq!(config.active().unwrap().name, "Daan");
        assert!(config.add_schedule("  ", "https://example.org").is_err());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.add_schedule("Sanne", "https://example.org/a.ics").unwrap();
        config.projection.conflicts = ConflictPolicy::FirstWins;

        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();

        assert_eq!(loaded.schedules, config.schedules);
        assert_eq!(loaded.active_schedule.as_deref(), Some("Sanne"));
        assert_eq!(loaded.projection.conflicts, ConflictPolicy::FirstWins);
        assert_eq!(loaded.fetch.strategies, default_strategies());
    }
}
