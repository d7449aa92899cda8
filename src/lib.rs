//! weekrooster: a weekly class timetable built from an iCalendar feed.
//!
//! The projection engine lives in `weekrooster-core`; this crate adds the
//! parts that touch the outside world: configuration, feed retrieval,
//! note storage, the load/navigation session and terminal rendering.

pub mod config;
pub mod feed;
pub mod notes;
pub mod render;
pub mod session;

pub use config::{AppConfig, ScheduleSource};
pub use feed::{FeedFetcher, FetchStrategy, HttpTransport};
pub use notes::{Note, NoteStore};
pub use session::{AppState, LoadOutcome, Session};
