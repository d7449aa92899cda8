//! Error types for weekrooster.

use std::fmt;

use thiserror::Error;

/// Errors that can occur in weekrooster operations.
#[derive(Error, Debug)]
pub enum RoosterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time slot: {0}")]
    InvalidTimeSlot(String),

    #[error("Schedule not found: {0}")]
    UnknownSchedule(String),

    #[error("Could not load calendar from {url}: {cause}")]
    FeedUnavailable { url: String, cause: FeedFailureCause },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Best guess at why every retrieval strategy failed for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFailureCause {
    /// The server refused access (401/403): the calendar is not public.
    PrivateCalendar,
    /// The server answered 404: the URL is wrong or the feed was removed.
    NotFound,
    /// Something answered, but not with iCalendar data.
    NotCalendar,
    /// Transport errors or other HTTP statuses.
    Network,
}

impl fmt::Display for FeedFailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedFailureCause::PrivateCalendar => {
                write!(f, "the calendar is private, share it publicly or use the secret iCal address")
            }
            FeedFailureCause::NotFound => {
                write!(f, "the calendar was not found, check the URL")
            }
            FeedFailureCause::NotCalendar => {
                write!(f, "the URL does not point to an iCalendar (.ics) feed")
            }
            FeedFailureCause::Network => write!(f, "network error"),
        }
    }
}

/// Result type alias for weekrooster operations.
pub type RoosterResult<T> = Result<T, RoosterError>;
