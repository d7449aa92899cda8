//! Feed retrieval with proxy fallbacks.
//!
//! Many school calendar hosts block or mangle direct requests, so a fetch
//! walks an ordered list of [`FetchStrategy`]s and returns the first body
//! that looks like iCalendar data. When all fail, the collected failures
//! are condensed into a [`FeedFailureCause`] with a user-facing hint.

mod strategy;
mod transport;

pub use strategy::{ALLORIGINS_PREFIX, CORSPROXY_PREFIX, FetchStrategy, default_strategies};
pub use transport::{HttpResponse, HttpTransport, Transport};

use weekrooster_core::{FeedFailureCause, RoosterError, RoosterResult};

const CALENDAR_MARKER: &str = "BEGIN:VCALENDAR";
const GOOGLE_ICAL_BASE: &str = "https://calendar.google.com/calendar/ical";

/// Why a single attempt did not produce a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Status(u16),
    Transport(String),
    BadWrapper(String),
    NotCalendar,
}

pub struct FeedFetcher<T: Transport = HttpTransport> {
    transport: T,
    strategies: Vec<FetchStrategy>,
}

impl<T: Transport> FeedFetcher<T> {
    pub fn new(transport: T, strategies: Vec<FetchStrategy>) -> Self {
        Self {
            transport,
            strategies,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the raw text of the feed at `url`.
    pub async fn fetch(&self, url: &str) -> RoosterResult<String> {
        let url = normalize_feed_url(url);
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match self.attempt(strategy, &url).await {
                Ok(body) => {
                    tracing::info!("Fetched {} via {} ({} bytes)", url, strategy.name(), body.len());
                    return Ok(body);
                }
                Err(failure) => {
                    tracing::debug!("{} failed for {}: {:?}", strategy.name(), url, failure);
                    failures.push(failure);
                }
            }
        }

        let cause = classify(&failures);
        tracing::warn!("All {} strategies failed for {}: {}", failures.len(), url, cause);
        Err(RoosterError::FeedUnavailable { url, cause })
    }

    async fn attempt(&self, strategy: &FetchStrategy, url: &str) -> Result<String, AttemptFailure> {
        let response = self
            .transport
            .get(&strategy.request_url(url))
            .await
            .map_err(|e| AttemptFailure::Transport(format!("{e:#}")))?;

        if !response.is_success() {
            return Err(AttemptFailure::Status(response.status));
        }

        let body = strategy
            .extract(response.body)
            .map_err(AttemptFailure::BadWrapper)?;

        if !body.contains(CALENDAR_MARKER) {
            return Err(AttemptFailure::NotCalendar);
        }
        Ok(body)
    }
}

/// Most specific cause wins: refusal, then 404, then wrong content.
pub fn classify(failures: &[AttemptFailure]) -> FeedFailureCause {
    let any = |pred: fn(&AttemptFailure) -> bool| failures.iter().any(pred);

    if any(|f| matches!(f, AttemptFailure::Status(401 | 403))) {
        FeedFailureCause::PrivateCalendar
    } else if any(|f| matches!(f, AttemptFailure::Status(404))) {
        FeedFailureCause::NotFound
    } else if any(|f| matches!(f, AttemptFailure::NotCalendar)) {
        FeedFailureCause::NotCalendar
    } else {
        FeedFailureCause::Network
    }
}

/// Rewrite share links into fetchable feed URLs.
///
/// - `webcal://` becomes `https://`
/// - Google Calendar page links carrying `cid=` or `src=` become the
///   public `basic.ics` address of that calendar
pub fn normalize_feed_url(url: &str) -> String {
    let url = url.trim();

    let url = match url.strip_prefix("webcal://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    };

    if let Some(calendar_id) = google_calendar_id(&url) {
        let rewritten = format!("{GOOGLE_ICAL_BASE}/{calendar_id}/public/basic.ics");
        tracing::debug!("Rewrote Google Calendar link {} to {}", url, rewritten);
        return rewritten;
    }
    url
}

fn google_calendar_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.host_str() != Some("calendar.google.com") || parsed.path().contains("/ical/") {
        return None;
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "cid" || key == "src")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}
