//! Google Calendar implementation of the taskcal provider seam.
//!
//! Talks to the Calendar v3 REST API directly over `reqwest`. Access tokens
//! are refreshed against the OAuth token endpoint when missing or rejected;
//! any token minted mid-call is reported through the caller's
//! [`RefreshedToken`] cell so it can be persisted.

pub mod config;
pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::debug;

use taskcal_core::{
    CalendarProvider, ChangeFeed, CreatedEvent, Credentials, EventPayload, ListQuery,
    ProviderError, RefreshedToken,
};

pub use config::GoogleCredentials;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn net_err(err: reqwest::Error) -> ProviderError {
    ProviderError::Network(err.to_string())
}

async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ProviderError::Api { status, message }
}

/// Query parameters for `events.list`: incremental cursor or bounded window.
fn list_query_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    match query {
        ListQuery::Cursor(cursor) => vec![("syncToken", cursor.clone())],
        ListQuery::Window {
            since,
            include_cancelled,
            expand_recurring,
        } => vec![
            ("timeMin", since.to_rfc3339()),
            ("showDeleted", include_cancelled.to_string()),
            ("singleEvents", expand_recurring.to_string()),
        ],
    }
}

/// Google Calendar provider bound to one calendar (`primary` by default).
pub struct GoogleProvider {
    http: reqwest::Client,
    creds: GoogleCredentials,
    calendar_id: String,
}

impl GoogleProvider {
    pub fn new(creds: GoogleCredentials) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(net_err)?;

        Ok(GoogleProvider {
            http,
            creds,
            calendar_id: "primary".to_string(),
        })
    }

    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    fn events_url(&self) -> String {
        format!("{CALENDAR_API_BASE}/calendars/{}/events", self.calendar_id)
    }

    fn event_url(&self, remote_id: &str) -> String {
        format!("{}/{remote_id}", self.events_url())
    }

    /// Exchange the refresh credential for a fresh access token.
    ///
    /// `invalid_grant` from the token endpoint means the user revoked
    /// access; that maps to the distinguished `AuthRevoked` error.
    async fn refresh_access_token(
        &self,
        creds: &Credentials,
        refreshed: &RefreshedToken,
    ) -> Result<String, ProviderError> {
        let refresh_token = creds
            .refresh_token
            .as_deref()
            .ok_or(ProviderError::NotConnected)?;

        let params = [
            ("client_id", self.creds.client_id.as_str()),
            ("client_secret", self.creds.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(net_err)?;

        let status = response.status();
        if !status.is_success() {
            let body: wire::OAuthErrorBody = response.json().await.unwrap_or_default();
            if body.error == "invalid_grant" {
                return Err(ProviderError::AuthRevoked);
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body.error_description.unwrap_or(body.error),
            });
        }

        let token: wire::TokenResponse = response.json().await.map_err(net_err)?;
        debug!("refreshed access token");
        refreshed.record(&token.access_token);
        Ok(token.access_token)
    }

    async fn bearer_token(
        &self,
        creds: &Credentials,
        refreshed: &RefreshedToken,
    ) -> Result<String, ProviderError> {
        if let Some(token) = refreshed.current() {
            return Ok(token);
        }
        if let Some(token) = &creds.access_token {
            return Ok(token.clone());
        }
        self.refresh_access_token(creds, refreshed).await
    }

    /// Send an authenticated API request, refreshing the access token and
    /// retrying once when the stored token is rejected.
    async fn send(
        &self,
        creds: &Credentials,
        refreshed: &RefreshedToken,
        method: Method,
        url: &str,
        query: &[(&'static str, String)],
        body: Option<&wire::GoogleEvent>,
    ) -> Result<reqwest::Response, ProviderError> {
        let mut token = self.bearer_token(creds, refreshed).await?;
        let mut retried = false;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url)
                .query(query)
                .bearer_auth(&token);
            if let Some(event) = body {
                request = request.json(event);
            }

            let response = request.send().await.map_err(net_err)?;

            if response.status() == StatusCode::UNAUTHORIZED
                && !retried
                && creds.refresh_token.is_some()
            {
                debug!("access token rejected, refreshing and retrying");
                token = self.refresh_access_token(creds, refreshed).await?;
                retried = true;
                continue;
            }

            return Ok(response);
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleProvider {
    async fn insert_event(
        &self,
        creds: &Credentials,
        payload: &EventPayload,
        refreshed: &RefreshedToken,
    ) -> Result<CreatedEvent, ProviderError> {
        let event = wire::GoogleEvent::from_payload(payload);

        let mut query = Vec::new();
        if payload.conference_request_id.is_some() {
            query.push(("conferenceDataVersion", "1".to_string()));
        }

        let response = self
            .send(
                creds,
                refreshed,
                Method::POST,
                &self.events_url(),
                &query,
                Some(&event),
            )
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let created: wire::GoogleEvent = response.json().await.map_err(net_err)?;
        let meet_link = created.meet_link();
        Ok(CreatedEvent {
            id: created.id,
            meet_link,
        })
    }

    async fn update_event(
        &self,
        creds: &Credentials,
        remote_id: &str,
        payload: &EventPayload,
        refreshed: &RefreshedToken,
    ) -> Result<CreatedEvent, ProviderError> {
        let event = wire::GoogleEvent::from_payload(payload);

        let mut query = Vec::new();
        if payload.conference_request_id.is_some() {
            query.push(("conferenceDataVersion", "1".to_string()));
        }

        let response = self
            .send(
                creds,
                refreshed,
                Method::PUT,
                &self.event_url(remote_id),
                &query,
                Some(&event),
            )
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let updated: wire::GoogleEvent = response.json().await.map_err(net_err)?;
        let meet_link = updated.meet_link();
        let id = if updated.id.is_empty() {
            remote_id.to_string()
        } else {
            updated.id
        };
        Ok(CreatedEvent { id, meet_link })
    }

    async fn delete_event(
        &self,
        creds: &Credentials,
        remote_id: &str,
        refreshed: &RefreshedToken,
    ) -> Result<(), ProviderError> {
        let response = self
            .send(
                creds,
                refreshed,
                Method::DELETE,
                &self.event_url(remote_id),
                &[],
                None,
            )
            .await?;

        let status = response.status();
        // Deleting an event that's already gone is a success.
        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(());
        }

        Err(api_error(response).await)
    }

    async fn list_events(
        &self,
        creds: &Credentials,
        query: ListQuery,
        refreshed: &RefreshedToken,
    ) -> Result<ChangeFeed, ProviderError> {
        let base_params = list_query_params(&query);

        let mut items = Vec::new();
        let mut next_cursor = None;
        let mut page_token: Option<String> = None;

        loop {
            let mut params = base_params.clone();
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self
                .send(
                    creds,
                    refreshed,
                    Method::GET,
                    &self.events_url(),
                    &params,
                    None,
                )
                .await?;

            let status = response.status();
            if status == StatusCode::GONE {
                return Err(ProviderError::CursorExpired);
            }
            if !status.is_success() {
                return Err(api_error(response).await);
            }

            let page: wire::EventsPage = response.json().await.map_err(net_err)?;

            items.extend(
                page.items
                    .into_iter()
                    .filter(|event| !event.id.is_empty())
                    .map(wire::GoogleEvent::into_remote),
            );

            if page.next_sync_token.is_some() {
                next_cursor = page.next_sync_token;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ChangeFeed { items, next_cursor })
    }
}
