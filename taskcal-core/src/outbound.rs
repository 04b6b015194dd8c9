//! Outbound sync: propagate one locally-edited task to the remote calendar.
//!
//! The decision table, evaluated in order:
//! 1. linked + unscheduled  -> delete the remote event, clear the link
//! 2. unscheduled, unlinked -> nothing to do, no remote call
//! 3. scheduled + linked    -> update the remote event
//! 4. scheduled, unlinked   -> insert a new remote event
//!
//! The engine itself never touches the store; [`sync_and_persist`] wraps it
//! with local-first persistence: the edit is written before the remote call,
//! so a provider failure never loses the user's change.

use chrono::{Duration, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::context::SyncContext;
use crate::credentials::{Credentials, RefreshedToken};
use crate::error::{SyncError, SyncResult};
use crate::event::{EventPayload, EventTime};
use crate::provider::CalendarProvider;
use crate::task::Task;

/// What outbound sync did for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    Deleted,
    None,
}

/// Outcome handed back to the caller, which persists the remote identifiers
/// onto the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub action: SyncAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
}

impl SyncOutcome {
    fn none() -> Self {
        SyncOutcome {
            action: SyncAction::None,
            remote_id: None,
            meet_link: None,
        }
    }

    fn deleted() -> Self {
        SyncOutcome {
            action: SyncAction::Deleted,
            remote_id: None,
            meet_link: None,
        }
    }
}

/// Build the remote event representation of a scheduled task.
///
/// A due instant at exactly midnight UTC becomes an all-day event ending the
/// next day; anything else becomes a timed event spanning the task's
/// duration (default from config).
pub(crate) fn build_event_payload(config: &SyncConfig, task: &Task, due: chrono::DateTime<chrono::Utc>) -> EventPayload {
    let (start, end) = if due.hour() == 0 && due.minute() == 0 && due.second() == 0 {
        let date = due.date_naive();
        let next = date.succ_opt().unwrap_or(date);
        (EventTime::Date(date), EventTime::Date(next))
    } else {
        let minutes = task.duration.unwrap_or(config.default_duration_min);
        (
            EventTime::DateTime(due),
            EventTime::DateTime(due + Duration::minutes(minutes)),
        )
    };

    let conference_request_id = task
        .create_meet_link
        .then(|| Uuid::new_v4().to_string());

    EventPayload {
        summary: task.text.clone(),
        description: task.notes.clone(),
        start,
        end,
        timezone: config.timezone,
        attendees: task.attendees.clone(),
        conference_request_id,
    }
}

/// Sync one task to the remote calendar.
///
/// Pure remote-side operation: the caller owns persisting the returned
/// identifiers (and clearing them after a delete).
pub async fn sync_task(
    config: &SyncConfig,
    provider: &dyn CalendarProvider,
    creds: &Credentials,
    task: &Task,
    refreshed: &RefreshedToken,
) -> SyncResult<SyncOutcome> {
    let due = match (&task.remote_event_id, task.due_date) {
        (Some(remote_id), None) => {
            debug!(task = %task.id, remote_id = %remote_id, "task unscheduled, deleting remote event");
            provider.delete_event(creds, remote_id, refreshed).await?;
            return Ok(SyncOutcome::deleted());
        }
        (None, None) => return Ok(SyncOutcome::none()),
        (_, Some(due)) => due,
    };

    let payload = build_event_payload(config, task, due);

    let (action, created) = match &task.remote_event_id {
        Some(remote_id) => {
            let created = provider
                .update_event(creds, remote_id, &payload, refreshed)
                .await?;
            (SyncAction::Updated, created)
        }
        None => {
            let created = provider.insert_event(creds, &payload, refreshed).await?;
            (SyncAction::Created, created)
        }
    };

    Ok(SyncOutcome {
        action,
        remote_id: Some(created.id),
        meet_link: created.meet_link,
    })
}

/// Persist a task edit and sync it outbound, local-first.
///
/// Under the user's store lock: the edited task is saved before the remote
/// call, any access token refreshed mid-call is persisted even on failure,
/// and on success the remote identifiers are written back onto the stored
/// task.
pub async fn sync_and_persist(
    ctx: &SyncContext,
    user_id: &str,
    task: Task,
) -> SyncResult<SyncOutcome> {
    let _guard = ctx.store.lock_user(user_id).await;

    let mut record = ctx
        .store
        .load_user(user_id)?
        .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;

    // Local edit takes effect regardless of the remote outcome.
    record.upsert_task(task.clone());
    ctx.store.save_user(user_id, &record)?;

    let creds = record.credentials();
    if !creds.usable() {
        return Err(SyncError::NotConnected);
    }

    let refreshed = RefreshedToken::new();
    let result = sync_task(&ctx.config, ctx.provider.as_ref(), &creds, &task, &refreshed).await;

    let mut dirty = false;
    if let Some(token) = refreshed.take() {
        record.access_token = Some(token);
        dirty = true;
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if dirty {
                ctx.store.save_user(user_id, &record)?;
            }
            return Err(err);
        }
    };

    if let Some(stored) = record.find_task_mut(&task.id) {
        match outcome.action {
            SyncAction::Deleted => {
                stored.clear_remote_link();
                dirty = true;
            }
            SyncAction::Created | SyncAction::Updated => {
                stored.remote_event_id = outcome.remote_id.clone();
                if outcome.meet_link.is_some() {
                    stored.meet_link = outcome.meet_link.clone();
                }
                dirty = true;
            }
            SyncAction::None => {}
        }
    }

    if dirty {
        ctx.store.save_user(user_id, &record)?;
    }

    info!(user = %user_id, task = %task.id, action = ?outcome.action, "outbound sync finished");
    Ok(outcome)
}
