//! End-to-end engine tests against a scripted in-memory provider and a
//! temp-file store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use taskcal_core::{
    inbound, outbound, scheduler, CalendarProvider, ChangeFeed, CreatedEvent, Credentials,
    EventPayload, EventStatus, EventTime, JsonUserStore, ListQuery, ProviderError, RefreshedToken,
    RemoteEvent, SyncAction, SyncConfig, SyncContext, SyncError, Task, UserRecord,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Insert,
    Update(String),
    Delete(String),
    ListCursor(String),
    ListWindow,
}

/// Scripted provider: queued results are popped per call; an empty queue
/// falls back to a benign default.
#[derive(Default)]
struct MockProvider {
    calls: Mutex<Vec<Call>>,
    insert_results: Mutex<VecDeque<Result<CreatedEvent, ProviderError>>>,
    list_results: Mutex<VecDeque<Result<ChangeFeed, ProviderError>>>,
    delete_results: Mutex<VecDeque<Result<(), ProviderError>>>,
    /// When set, every call "refreshes" the access token to this value.
    mint_token: Mutex<Option<String>>,
}

impl MockProvider {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push_call(&self, call: Call, refreshed: &RefreshedToken) {
        self.calls.lock().unwrap().push(call);
        if let Some(token) = self.mint_token.lock().unwrap().clone() {
            refreshed.record(&token);
        }
    }

    fn queue_insert(&self, result: Result<CreatedEvent, ProviderError>) {
        self.insert_results.lock().unwrap().push_back(result);
    }

    fn queue_list(&self, result: Result<ChangeFeed, ProviderError>) {
        self.list_results.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl CalendarProvider for MockProvider {
    async fn insert_event(
        &self,
        _creds: &Credentials,
        _payload: &EventPayload,
        refreshed: &RefreshedToken,
    ) -> Result<CreatedEvent, ProviderError> {
        self.push_call(Call::Insert, refreshed);
        self.insert_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(CreatedEvent {
                id: "remote-1".to_string(),
                meet_link: None,
            }))
    }

    async fn update_event(
        &self,
        _creds: &Credentials,
        remote_id: &str,
        _payload: &EventPayload,
        refreshed: &RefreshedToken,
    ) -> Result<CreatedEvent, ProviderError> {
        self.push_call(Call::Update(remote_id.to_string()), refreshed);
        Ok(CreatedEvent {
            id: remote_id.to_string(),
            meet_link: None,
        })
    }

    async fn delete_event(
        &self,
        _creds: &Credentials,
        remote_id: &str,
        refreshed: &RefreshedToken,
    ) -> Result<(), ProviderError> {
        self.push_call(Call::Delete(remote_id.to_string()), refreshed);
        self.delete_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn list_events(
        &self,
        _creds: &Credentials,
        query: ListQuery,
        refreshed: &RefreshedToken,
    ) -> Result<ChangeFeed, ProviderError> {
        let call = match &query {
            ListQuery::Cursor(cursor) => Call::ListCursor(cursor.clone()),
            ListQuery::Window { .. } => Call::ListWindow,
        };
        self.push_call(call, refreshed);
        self.list_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChangeFeed::default()))
    }
}

fn setup() -> (tempfile::TempDir, Arc<MockProvider>, SyncContext) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonUserStore::open(dir.path().join("database.json")));
    let provider = Arc::new(MockProvider::default());
    let ctx = SyncContext::new(
        store,
        provider.clone(),
        Arc::new(SyncConfig::default()),
    );
    (dir, provider, ctx)
}

fn connect_user(ctx: &SyncContext, user_id: &str) -> UserRecord {
    let mut record = ctx.store.ensure_user(user_id).unwrap();
    record.access_token = Some(format!("access-{user_id}"));
    record.refresh_token = Some(format!("refresh-{user_id}"));
    ctx.store.save_user(user_id, &record).unwrap();
    record
}

fn standup_task() -> Task {
    let mut task = Task::new("Standup");
    task.due_date = Some(Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap());
    task.duration = Some(30);
    task
}

fn stored_task(ctx: &SyncContext, user_id: &str, task_id: &str) -> Task {
    let mut record = ctx.store.load_user(user_id).unwrap().unwrap();
    record.find_task_mut(task_id).unwrap().clone()
}

#[tokio::test]
async fn outbound_create_then_inbound_cancel_round_trip() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    let task = standup_task();
    let outcome = outbound::sync_and_persist(&ctx, "u1", task.clone())
        .await
        .unwrap();
    assert_eq!(outcome.action, SyncAction::Created);
    assert_eq!(outcome.remote_id.as_deref(), Some("remote-1"));
    assert_eq!(
        stored_task(&ctx, "u1", &task.id).remote_event_id.as_deref(),
        Some("remote-1")
    );

    provider.queue_list(Ok(ChangeFeed {
        items: vec![RemoteEvent::cancelled("remote-1")],
        next_cursor: Some("cursor-1".to_string()),
    }));

    let changed = inbound::pull_user(&ctx, "u1").await.unwrap();
    assert!(changed);

    // The link is cleared but the task itself survives.
    let stored = stored_task(&ctx, "u1", &task.id);
    assert_eq!(stored.remote_event_id, None);
    assert_eq!(stored.meet_link, None);
    assert_eq!(stored.text, "Standup");

    let record = ctx.store.load_user("u1").unwrap().unwrap();
    assert_eq!(record.sync_cursor.as_deref(), Some("cursor-1"));
}

#[tokio::test]
async fn unscheduled_unlinked_task_makes_no_remote_calls() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    let task = Task::new("Someday");
    let outcome = outbound::sync_and_persist(&ctx, "u1", task).await.unwrap();

    assert_eq!(outcome.action, SyncAction::None);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn second_sync_updates_instead_of_duplicating() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    let task = standup_task();
    outbound::sync_and_persist(&ctx, "u1", task.clone())
        .await
        .unwrap();

    // The view layer re-syncs the task as stored, which now carries the
    // remote id from the first call.
    let linked = stored_task(&ctx, "u1", &task.id);
    let outcome = outbound::sync_and_persist(&ctx, "u1", linked).await.unwrap();

    assert_eq!(outcome.action, SyncAction::Updated);
    assert_eq!(
        provider.calls(),
        vec![Call::Insert, Call::Update("remote-1".to_string())]
    );
}

#[tokio::test]
async fn clearing_due_date_deletes_remote_event_and_link() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    let task = standup_task();
    outbound::sync_and_persist(&ctx, "u1", task.clone())
        .await
        .unwrap();

    let mut unscheduled = stored_task(&ctx, "u1", &task.id);
    unscheduled.due_date = None;
    let outcome = outbound::sync_and_persist(&ctx, "u1", unscheduled)
        .await
        .unwrap();

    assert_eq!(outcome.action, SyncAction::Deleted);
    assert!(provider
        .calls()
        .contains(&Call::Delete("remote-1".to_string())));
    assert_eq!(stored_task(&ctx, "u1", &task.id).remote_event_id, None);
}

#[tokio::test]
async fn provider_failure_keeps_the_local_edit() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    provider.queue_insert(Err(ProviderError::Network("connection reset".to_string())));

    let task = standup_task();
    let result = outbound::sync_and_persist(&ctx, "u1", task.clone()).await;

    assert!(matches!(
        result,
        Err(SyncError::Provider(ProviderError::Network(_)))
    ));

    // Local-first: the edit landed in the store before the remote call.
    let stored = stored_task(&ctx, "u1", &task.id);
    assert_eq!(stored.text, "Standup");
    assert_eq!(stored.remote_event_id, None);
}

#[tokio::test]
async fn expired_cursor_falls_back_to_window_resync() {
    let (_dir, provider, ctx) = setup();
    let mut record = connect_user(&ctx, "u1");
    record.sync_cursor = Some("stale-cursor".to_string());
    ctx.store.save_user("u1", &record).unwrap();

    provider.queue_list(Err(ProviderError::CursorExpired));
    provider.queue_list(Ok(ChangeFeed {
        items: Vec::new(),
        next_cursor: Some("fresh-cursor".to_string()),
    }));

    let changed = inbound::pull_user(&ctx, "u1").await.unwrap();
    assert!(changed);

    assert_eq!(
        provider.calls(),
        vec![
            Call::ListCursor("stale-cursor".to_string()),
            Call::ListWindow
        ]
    );
    let record = ctx.store.load_user("u1").unwrap().unwrap();
    assert_eq!(record.sync_cursor.as_deref(), Some("fresh-cursor"));
}

#[tokio::test]
async fn revoked_authorization_disconnects_the_user() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    provider.queue_list(Err(ProviderError::AuthRevoked));

    let changed = inbound::pull_user(&ctx, "u1").await.unwrap();
    assert!(changed);

    let record = ctx.store.load_user("u1").unwrap().unwrap();
    assert_eq!(record.access_token, None);
    assert_eq!(record.refresh_token, None);
    assert_eq!(record.sync_cursor, None);

    // Now treated as "not connected": no further remote calls.
    let calls_before = provider.calls().len();
    let changed = inbound::pull_user(&ctx, "u1").await.unwrap();
    assert!(!changed);
    assert_eq!(provider.calls().len(), calls_before);
}

#[tokio::test]
async fn batch_isolates_per_user_failures() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "alice");
    connect_user(&ctx, "bob");
    connect_user(&ctx, "carol");

    // Users are processed in sorted order: alice, bob, carol.
    provider.queue_list(Ok(ChangeFeed {
        items: Vec::new(),
        next_cursor: Some("cursor-alice".to_string()),
    }));
    provider.queue_list(Err(ProviderError::Api {
        status: 500,
        message: "backend error".to_string(),
    }));
    provider.queue_list(Ok(ChangeFeed {
        items: Vec::new(),
        next_cursor: Some("cursor-carol".to_string()),
    }));

    let summary = inbound::run_batch(&ctx).await;

    assert_eq!(summary.users, 3);
    assert_eq!(summary.changed, 2);
    assert_eq!(summary.failed, 1);

    // Users after the failing one were still processed and persisted.
    let carol = ctx.store.load_user("carol").unwrap().unwrap();
    assert_eq!(carol.sync_cursor.as_deref(), Some("cursor-carol"));
}

#[tokio::test]
async fn refreshed_token_survives_a_failed_pull() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    *provider.mint_token.lock().unwrap() = Some("minted-token".to_string());
    provider.queue_list(Err(ProviderError::Network("timeout".to_string())));

    let result = inbound::pull_user(&ctx, "u1").await;
    assert!(result.is_err());

    let record = ctx.store.load_user("u1").unwrap().unwrap();
    assert_eq!(record.access_token.as_deref(), Some("minted-token"));
}

#[tokio::test(start_paused = true)]
async fn scheduler_runs_one_batch_per_interval() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    // Defaults: 5s startup delay, 60s interval.
    let driver = tokio::spawn(scheduler::run(Arc::new(ctx)));

    // First batch fires right after the startup delay.
    tokio::time::sleep(std::time::Duration::from_secs(6)).await;
    assert_eq!(provider.calls(), vec![Call::ListWindow]);

    // One more batch per interval, not more.
    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert_eq!(provider.calls(), vec![Call::ListWindow, Call::ListWindow]);

    driver.abort();
}

#[tokio::test]
async fn remote_edit_overwrites_local_fields_on_pull() {
    let (_dir, provider, ctx) = setup();
    connect_user(&ctx, "u1");

    let task = standup_task();
    outbound::sync_and_persist(&ctx, "u1", task.clone())
        .await
        .unwrap();

    provider.queue_list(Ok(ChangeFeed {
        items: vec![RemoteEvent {
            id: "remote-1".to_string(),
            status: EventStatus::Confirmed,
            summary: Some("Standup (moved)".to_string()),
            start: Some(EventTime::DateTime(
                Utc.with_ymd_and_hms(2024, 1, 9, 11, 0, 0).unwrap(),
            )),
            attendees: vec!["kasia@example.com".to_string()],
            meet_link: Some("https://meet.example/xyz".to_string()),
        }],
        next_cursor: None,
    }));

    let changed = inbound::pull_user(&ctx, "u1").await.unwrap();
    assert!(changed);

    let stored = stored_task(&ctx, "u1", &task.id);
    assert_eq!(stored.text, "Standup (moved)");
    assert_eq!(
        stored.due_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 9, 11, 0, 0).unwrap())
    );
    assert_eq!(stored.attendees, vec!["kasia@example.com".to_string()]);
    assert_eq!(stored.meet_link.as_deref(), Some("https://meet.example/xyz"));
}
