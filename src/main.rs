mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::show::ShowOptions;

#[derive(Parser)]
#[command(name = "weekrooster")]
#[command(about = "Show a weekly class timetable from an iCalendar feed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the timetable for a week
    Show {
        /// Weeks from the current one (e.g. 1 for next week, -1 for last week)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        week: i64,

        /// Print the grid as JSON
        #[arg(long)]
        json: bool,

        /// Hide rows without lessons (break rows stay)
        #[arg(short, long)]
        compact: bool,

        /// No colors
        #[arg(long)]
        plain: bool,

        /// Schedule to show (defaults to the active one)
        #[arg(short, long)]
        schedule: Option<String>,
    },
    /// Manage calendar feeds
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Manage notes on lessons
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Add a feed and make it active
    Add {
        name: String,
        /// .ics, webcal:// or Google Calendar share link
        url: String,
    },
    /// List configured feeds
    List,
    /// Make a feed the active one
    Use { name: String },
    /// Remove a feed
    Remove { name: String },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Write a note on a lesson
    Set {
        /// Lesson start, e.g. 2024-03-04T08:30:00+01:00
        start: String,
        subject: String,
        text: String,
    },
    /// Show or hide a note in the table
    Toggle { start: String, subject: String },
    /// Delete a note
    Remove { start: String, subject: String },
    /// List all notes
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            week,
            json,
            compact,
            plain,
            schedule,
        } => {
            commands::show::run(ShowOptions {
                week,
                json,
                compact,
                plain,
                schedule,
            })
            .await
        }
        Commands::Schedule { action } => match action {
            ScheduleAction::Add { name, url } => commands::schedule::add(&name, &url),
            ScheduleAction::List => commands::schedule::list(),
            ScheduleAction::Use { name } => commands::schedule::use_schedule(&name),
            ScheduleAction::Remove { name } => commands::schedule::remove(&name),
        },
        Commands::Note { action } => match action {
            NoteAction::Set {
                start,
                subject,
                text,
            } => commands::note::set(&start, &subject, &text),
            NoteAction::Toggle { start, subject } => commands::note::toggle(&start, &subject),
            NoteAction::Remove { start, subject } => commands::note::remove(&start, &subject),
            NoteAction::List => commands::note::list(),
        },
    }
}
