//! Wire types for the Google Calendar v3 REST API.
//!
//! Only the fields the sync core actually reads or writes are modeled;
//! everything else passes through untouched on Google's side.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use taskcal_core::{EventPayload, EventStatus, EventTime, RemoteEvent};

/// Start/end of an event: all-day (`date`) or timed (`dateTime` + zone).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl GoogleEventTime {
    fn from_event_time(time: &EventTime, timezone: &str) -> Self {
        match time {
            EventTime::Date(date) => GoogleEventTime {
                date: Some(*date),
                date_time: None,
                time_zone: None,
            },
            EventTime::DateTime(instant) => GoogleEventTime {
                date: None,
                date_time: Some(*instant),
                time_zone: Some(timezone.to_string()),
            },
        }
    }

    fn to_event_time(&self) -> Option<EventTime> {
        if let Some(instant) = self.date_time {
            Some(EventTime::DateTime(instant))
        } else {
            self.date.map(EventTime::Date)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleAttendee {
    pub email: String,
}

/// Request for a freshly generated conference (meeting link).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateConferenceRequest {
    pub request_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceEntryPoint {
    pub entry_point_type: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_request: Option<CreateConferenceRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<ConferenceEntryPoint>,
}

/// A Google Calendar event, outbound or inbound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleEvent {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<GoogleEventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<GoogleEventTime>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<GoogleAttendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conference_data: Option<ConferenceData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hangout_link: Option<String>,
}

impl GoogleEvent {
    /// Build the outbound body for insert/update.
    pub fn from_payload(payload: &EventPayload) -> Self {
        let timezone = payload.timezone.name();

        let conference_data =
            payload
                .conference_request_id
                .as_ref()
                .map(|request_id| ConferenceData {
                    create_request: Some(CreateConferenceRequest {
                        request_id: request_id.clone(),
                    }),
                    entry_points: Vec::new(),
                });

        GoogleEvent {
            id: String::new(),
            status: String::new(),
            summary: Some(payload.summary.clone()),
            description: Some(payload.description.clone()),
            start: Some(GoogleEventTime::from_event_time(&payload.start, timezone)),
            end: Some(GoogleEventTime::from_event_time(&payload.end, timezone)),
            attendees: payload
                .attendees
                .iter()
                .map(|email| GoogleAttendee {
                    email: email.clone(),
                })
                .collect(),
            conference_data,
            hangout_link: None,
        }
    }

    /// Meeting link, preferring the top-level hangout link over conference
    /// entry points.
    pub fn meet_link(&self) -> Option<String> {
        if let Some(link) = &self.hangout_link {
            return Some(link.clone());
        }
        self.conference_data.as_ref().and_then(|data| {
            data.entry_points
                .iter()
                .find(|ep| ep.entry_point_type == "video")
                .map(|ep| ep.uri.clone())
        })
    }

    pub fn event_status(&self) -> EventStatus {
        match self.status.as_str() {
            "cancelled" => EventStatus::Cancelled,
            "tentative" => EventStatus::Tentative,
            _ => EventStatus::Confirmed,
        }
    }

    /// Convert a change-feed item into the core's remote event type.
    pub fn into_remote(self) -> RemoteEvent {
        let status = self.event_status();
        let meet_link = self.meet_link();
        let start = self.start.as_ref().and_then(GoogleEventTime::to_event_time);

        RemoteEvent {
            id: self.id,
            status,
            summary: self.summary,
            start,
            attendees: self
                .attendees
                .into_iter()
                .map(|attendee| attendee.email)
                .collect(),
            meet_link,
        }
    }
}

/// One page of `events.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsPage {
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
}

/// Success body of the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Error body of the OAuth token endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
