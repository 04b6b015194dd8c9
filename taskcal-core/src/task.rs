//! Task, list and user-record types.
//!
//! These mirror the JSON document the view layer reads and writes, so serde
//! names follow the document's camelCase convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// How a list orders its tasks. Manual order is meaningful; the other modes
/// are derived by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Manual,
    Date,
    Priority,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::Manual
    }
}

/// A single task.
///
/// `meet_link` and `remote_event_id` are owned by the sync engines: the view
/// layer never sets them directly. A non-empty `remote_event_id` means the
/// task is linked to a live remote calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Scheduled start; absent means "unscheduled".
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Duration in minutes. Absent falls back to the configured default.
    #[serde(default)]
    pub duration: Option<i64>,
    /// Attendee contact addresses propagated to the remote event.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Ask the provider to generate a meeting link on the next outbound sync.
    #[serde(default)]
    pub create_meet_link: bool,
    /// Meeting link resolved by sync.
    #[serde(default)]
    pub meet_link: Option<String>,
    /// Identifier of the linked remote calendar event.
    #[serde(default)]
    pub remote_event_id: Option<String>,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            notes: String::new(),
            completed: false,
            priority: Priority::default(),
            due_date: None,
            duration: None,
            attendees: Vec::new(),
            create_meet_link: false,
            meet_link: None,
            remote_event_id: None,
        }
    }

    /// Whether the task has a due instant.
    pub fn is_scheduled(&self) -> bool {
        self.due_date.is_some()
    }

    /// Whether the task is linked to a remote calendar event.
    pub fn is_linked(&self) -> bool {
        self.remote_event_id.is_some()
    }

    /// Drop the link to the remote event (after deletion or cancellation).
    pub fn clear_remote_link(&mut self) {
        self.remote_event_id = None;
        self.meet_link = None;
    }
}

/// A named, ordered collection of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort_mode: SortMode,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(name: impl Into<String>) -> Self {
        TaskList {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            sort_mode: SortMode::Manual,
            tasks: Vec::new(),
        }
    }
}

fn default_active_list_id() -> String {
    "today".to_string()
}

/// Everything persisted for one user: lists, the active-list selector and the
/// remote-calendar credentials plus incremental-sync cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub lists: Vec<TaskList>,
    #[serde(default = "default_active_list_id")]
    pub active_list_id: String,
    /// Short-lived access credential for the remote calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Long-lived refresh credential. Absent means "not connected".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Incremental-sync cursor. Absent forces a full resync.
    #[serde(rename = "syncToken", default, skip_serializing_if = "Option::is_none")]
    pub sync_cursor: Option<String>,
}

impl UserRecord {
    /// Record created on first sign-in: a single empty default list.
    pub fn new_default() -> Self {
        UserRecord {
            lists: vec![TaskList::new("My Tasks")],
            active_list_id: default_active_list_id(),
            access_token: None,
            refresh_token: None,
            sync_cursor: None,
        }
    }

    /// Whether periodic inbound sync should run for this user.
    pub fn connected(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Borrowed credential view for provider calls.
    pub fn credentials(&self) -> crate::credentials::Credentials {
        crate::credentials::Credentials {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Drop all credentials and the cursor (authorization revoked).
    pub fn clear_credentials(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.sync_cursor = None;
    }

    /// Find a task by its own identifier, across all lists.
    pub fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.lists
            .iter_mut()
            .flat_map(|list| list.tasks.iter_mut())
            .find(|task| task.id == task_id)
    }

    /// Find the task linked to a remote event, across all lists.
    pub fn find_task_by_remote_id_mut(&mut self, remote_id: &str) -> Option<&mut Task> {
        self.lists
            .iter_mut()
            .flat_map(|list| list.tasks.iter_mut())
            .find(|task| task.remote_event_id.as_deref() == Some(remote_id))
    }

    /// Replace an existing task (matched by id) or append it to the active
    /// list. The active list falls back to the first list; an empty record
    /// gets the default list first.
    pub fn upsert_task(&mut self, task: Task) {
        if let Some(existing) = self.find_task_mut(&task.id) {
            *existing = task;
            return;
        }

        if self.lists.is_empty() {
            self.lists.push(TaskList::new("My Tasks"));
        }

        let index = self
            .lists
            .iter()
            .position(|list| list.id == self.active_list_id)
            .unwrap_or(0);
        self.lists[index].tasks.push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_serializes_with_document_field_names() {
        let mut task = Task::new("Standup");
        task.due_date = Some(Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap());
        task.remote_event_id = Some("R1".to_string());

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["text"], "Standup");
        assert_eq!(json["dueDate"], "2024-01-08T09:00:00Z");
        assert_eq!(json["remoteEventId"], "R1");
        assert_eq!(json["priority"], "medium");
    }

    #[test]
    fn user_record_cursor_uses_sync_token_name() {
        let mut record = UserRecord::new_default();
        record.sync_cursor = Some("cursor-1".to_string());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["syncToken"], "cursor-1");
        assert_eq!(json["activeListId"], "today");
    }

    #[test]
    fn find_task_by_remote_id_searches_all_lists() {
        let mut record = UserRecord::new_default();
        record.lists.push(TaskList::new("Work"));

        let mut task = Task::new("Linked");
        task.remote_event_id = Some("R42".to_string());
        record.lists[1].tasks.push(task);

        let found = record.find_task_by_remote_id_mut("R42").unwrap();
        assert_eq!(found.text, "Linked");
        assert!(record.find_task_by_remote_id_mut("R43").is_none());
    }

    #[test]
    fn upsert_replaces_in_place_and_appends_to_active_list() {
        let mut record = UserRecord::new_default();
        record.active_list_id = record.lists[0].id.clone();

        let task = Task::new("First");
        let task_id = task.id.clone();
        record.upsert_task(task);
        assert_eq!(record.lists[0].tasks.len(), 1);

        let mut edited = record.lists[0].tasks[0].clone();
        edited.text = "First (edited)".to_string();
        record.upsert_task(edited);
        assert_eq!(record.lists[0].tasks.len(), 1);
        assert_eq!(record.lists[0].tasks[0].text, "First (edited)");
        assert_eq!(record.lists[0].tasks[0].id, task_id);
    }
}
