//! The seam between the sync engines and a remote calendar provider.
//!
//! Providers implement the four logical operations the engines need. They
//! own the transport and token refresh; any access token minted mid-call is
//! reported through the [`RefreshedToken`] cell so the caller can persist it.

use async_trait::async_trait;

use crate::credentials::{Credentials, RefreshedToken};
use crate::error::ProviderError;
use crate::event::{ChangeFeed, CreatedEvent, EventPayload, ListQuery};

/// A remote calendar provider.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Insert a new remote event, returning its identifier and any generated
    /// meeting link.
    async fn insert_event(
        &self,
        creds: &Credentials,
        payload: &EventPayload,
        refreshed: &RefreshedToken,
    ) -> Result<CreatedEvent, ProviderError>;

    /// Update an existing remote event.
    async fn update_event(
        &self,
        creds: &Credentials,
        remote_id: &str,
        payload: &EventPayload,
        refreshed: &RefreshedToken,
    ) -> Result<CreatedEvent, ProviderError>;

    /// Delete a remote event. Deleting an already-gone event succeeds.
    async fn delete_event(
        &self,
        creds: &Credentials,
        remote_id: &str,
        refreshed: &RefreshedToken,
    ) -> Result<(), ProviderError>;

    /// List changed events, either since a cursor or within a bounded
    /// window. Returns a fresh cursor when the feed supplies one.
    ///
    /// Distinguished failures: [`ProviderError::CursorExpired`] when the
    /// cursor is no longer valid, [`ProviderError::AuthRevoked`] when the
    /// user's authorization is gone.
    async fn list_events(
        &self,
        creds: &Credentials,
        query: ListQuery,
        refreshed: &RefreshedToken,
    ) -> Result<ChangeFeed, ProviderError>;
}
