//! Inbound sync: pull the remote change feed and apply it to linked tasks.
//!
//! Once a task is linked outward, the remote calendar is authoritative:
//! cancelled events clear the link, field differences overwrite the local
//! task (remote wins). Remote events with no local match are ignored; this
//! engine never imports events into the task lists.

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::context::SyncContext;
use crate::credentials::RefreshedToken;
use crate::error::{ProviderError, SyncError, SyncResult};
use crate::event::{EventStatus, ListQuery, RemoteEvent};
use crate::task::UserRecord;

/// Outcome of one periodic batch over all users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub users: usize,
    pub changed: usize,
    pub failed: usize,
}

/// Pull remote changes for one user. Returns whether anything was persisted.
///
/// Holds the user's store lock for the whole read-modify-write, so a live
/// edit can't interleave with the pull. An access token refreshed mid-call
/// is persisted even when the pull itself fails.
pub async fn pull_user(ctx: &SyncContext, user_id: &str) -> SyncResult<bool> {
    let _guard = ctx.store.lock_user(user_id).await;

    let mut record = ctx
        .store
        .load_user(user_id)?
        .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;

    if !record.connected() {
        debug!(user = %user_id, "skipping user without refresh credential");
        return Ok(false);
    }

    let refreshed = RefreshedToken::new();
    let result = pull_into(ctx, user_id, &mut record, &refreshed).await;

    let mut changed = match &result {
        Ok(changed) => *changed,
        Err(_) => false,
    };
    if let Some(token) = refreshed.take() {
        record.access_token = Some(token);
        changed = true;
    }

    match result {
        Ok(_) => {
            if changed {
                ctx.store.save_user(user_id, &record)?;
            }
            Ok(changed)
        }
        Err(err) => {
            // Keep the refreshed credential even though the pull failed.
            if changed {
                ctx.store.save_user(user_id, &record)?;
            }
            Err(err)
        }
    }
}

/// Fetch the change feed and apply it to the record in memory.
async fn pull_into(
    ctx: &SyncContext,
    user_id: &str,
    record: &mut UserRecord,
    refreshed: &RefreshedToken,
) -> SyncResult<bool> {
    let mut changed = false;

    // Bounded retry: one full-resync attempt after a cursor expires. The
    // expired cursor is dropped before retrying, so the second attempt
    // always takes the window path.
    let mut retried = false;
    let feed = loop {
        let query = match &record.sync_cursor {
            Some(cursor) => ListQuery::Cursor(cursor.clone()),
            None => ListQuery::Window {
                since: Utc::now() - Duration::days(ctx.config.lookback_days),
                include_cancelled: true,
                expand_recurring: true,
            },
        };

        let creds = record.credentials();
        match ctx.provider.list_events(&creds, query, refreshed).await {
            Ok(feed) => break feed,
            Err(ProviderError::CursorExpired) if !retried && record.sync_cursor.is_some() => {
                warn!(user = %user_id, "sync cursor expired, falling back to full resync");
                record.sync_cursor = None;
                changed = true;
                retried = true;
            }
            Err(ProviderError::AuthRevoked) => {
                warn!(user = %user_id, "authorization revoked, disconnecting user");
                record.clear_credentials();
                return Ok(true);
            }
            Err(err) => return Err(err.into()),
        }
    };

    if let Some(cursor) = feed.next_cursor {
        record.sync_cursor = Some(cursor);
        changed = true;
    }

    for item in &feed.items {
        changed |= apply_remote_item(record, item);
    }

    Ok(changed)
}

/// Apply one change-feed item to its matched task, remote-wins.
/// Returns whether any task field changed.
fn apply_remote_item(record: &mut UserRecord, item: &RemoteEvent) -> bool {
    let Some(task) = record.find_task_by_remote_id_mut(&item.id) else {
        return false;
    };

    if item.status == EventStatus::Cancelled {
        debug!(task = %task.id, remote_id = %item.id, "remote event cancelled, unlinking task");
        task.clear_remote_link();
        return true;
    }

    let mut changed = false;

    if let Some(start) = &item.start {
        let due = start.as_due_date();
        if task.due_date != Some(due) {
            task.due_date = Some(due);
            changed = true;
        }
    }

    // An empty remote title keeps the local text.
    if let Some(summary) = item.summary.as_deref().filter(|s| !s.is_empty()) {
        if task.text != summary {
            task.text = summary.to_string();
            changed = true;
        }
    }

    if task.meet_link != item.meet_link {
        task.meet_link = item.meet_link.clone();
        changed = true;
    }

    if task.attendees != item.attendees {
        task.attendees = item.attendees.clone();
        changed = true;
    }

    changed
}

/// Run inbound sync for every known user, isolating per-user failures.
pub async fn run_batch(ctx: &SyncContext) -> BatchSummary {
    let mut summary = BatchSummary::default();

    let user_ids = match ctx.store.user_ids() {
        Ok(ids) => ids,
        Err(err) => {
            error!(error = %err, "could not enumerate users for sync batch");
            return summary;
        }
    };

    for user_id in user_ids {
        summary.users += 1;
        match pull_user(ctx, &user_id).await {
            Ok(true) => summary.changed += 1,
            Ok(false) => {}
            Err(err) => {
                summary.failed += 1;
                error!(user = %user_id, error = %err, "inbound sync failed for user");
            }
        }
    }

    info!(
        users = summary.users,
        changed = summary.changed,
        failed = summary.failed,
        "inbound sync batch finished"
    );
    summary
}
