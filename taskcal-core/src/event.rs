//! Remote calendar event value types.
//!
//! Events are tagged values with explicit variants for all-day vs timed
//! times, so the engines never branch on the presence of loosely-typed
//! fields.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A point on the calendar: a whole day or an exact instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl EventTime {
    /// The instant this time maps onto a task's due date. All-day events
    /// resolve to midnight UTC, matching how the view layer schedules them.
    pub fn as_due_date(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
            EventTime::DateTime(instant) => *instant,
        }
    }
}

/// Remote event lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// An item from the remote change feed.
///
/// Cancelled items arrive stripped down to an id and status, so everything
/// else is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: String,
    pub status: EventStatus,
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub attendees: Vec<String>,
    pub meet_link: Option<String>,
}

impl RemoteEvent {
    pub fn cancelled(id: impl Into<String>) -> Self {
        RemoteEvent {
            id: id.into(),
            status: EventStatus::Cancelled,
            summary: None,
            start: None,
            attendees: Vec::new(),
            meet_link: None,
        }
    }
}

/// Outbound representation of a task as a remote event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Fixed zone attached to timed events.
    pub timezone: Tz,
    pub attendees: Vec<String>,
    /// Idempotency key for meeting-link generation; fresh per call so a
    /// retried request never reuses a consumed key.
    pub conference_request_id: Option<String>,
}

/// Result of inserting or updating a remote event.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedEvent {
    pub id: String,
    pub meet_link: Option<String>,
}

/// One page-merged response from the remote change feed.
#[derive(Debug, Clone, Default)]
pub struct ChangeFeed {
    pub items: Vec<RemoteEvent>,
    /// Fresh incremental-sync cursor, when the feed supplied one.
    pub next_cursor: Option<String>,
}

/// How to list remote events: incremental delta or bounded full window.
#[derive(Debug, Clone, PartialEq)]
pub enum ListQuery {
    /// Only changes since this cursor.
    Cursor(String),
    /// Everything inside a bounded recent window.
    Window {
        since: DateTime<Utc>,
        include_cancelled: bool,
        expand_recurring: bool,
    },
}
