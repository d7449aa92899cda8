use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use weekrooster::render::{Render, RenderOptions, TableView};
use weekrooster::{AppConfig, LoadOutcome, NoteStore};

pub struct ShowOptions {
    pub week: i64,
    pub json: bool,
    pub compact: bool,
    pub plain: bool,
    pub schedule: Option<String>,
}

pub async fn run(opts: ShowOptions) -> Result<()> {
    let cfg = AppConfig::load()?;
    let source = super::select_schedule(&cfg, opts.schedule.as_deref())?;
    let session = super::open_session(&cfg, source, opts.week)?;

    match session.load().await {
        LoadOutcome::NotConfigured => {
            super::print_not_configured();
            return Ok(());
        }
        LoadOutcome::Failed => {
            let message = session.state().error.unwrap_or_else(|| "Loading failed".to_string());
            anyhow::bail!("{message}");
        }
        LoadOutcome::Loaded { .. } | LoadOutcome::Skipped => {}
    }

    let state = session.state();
    let Some(grid) = &state.grid else {
        anyhow::bail!("No timetable loaded");
    };
    let now = Utc::now();
    let label = state.label(now);

    if opts.json {
        let grid = if opts.compact { grid.compact() } else { grid.clone() };
        let view = serde_json::json!({
            "schedule": &state.schedule,
            "week": label,
            "monday": state.week.monday(),
            "grid": grid,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let notes = NoteStore::load(cfg.notes_path())?;
    let zone = session.timetable().zone;

    let title = match &state.schedule {
        Some(name) => format!("{name} - {label}"),
        None => label,
    };
    if opts.plain {
        println!("{title}");
    } else {
        println!("{}", title.bold());
    }

    let options = RenderOptions {
        plain: opts.plain,
        compact: opts.compact,
        now: Some(now.with_timezone(&zone)),
    };
    println!("{}", TableView::new(grid, options).with_notes(&notes).render());

    if !grid.has_lessons() {
        println!("\nNo lessons this week.");
    }

    Ok(())
}
