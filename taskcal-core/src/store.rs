//! Per-user JSON document store.
//!
//! One document on disk holds every user's record, keyed by the external
//! identity provider's subject id. Two locks are at work: a store-wide mutex
//! serializes every file-level read-modify-write (every save rewrites the
//! whole document, so unrelated users' saves must not interleave), and a
//! per-user async mutex serializes whole engine operations so a live edit
//! can't race the periodic sync for the same user. Writes go through a temp
//! file and rename, so a reader never sees a torn document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;
use crate::task::UserRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    users: HashMap<String, UserRecord>,
}

/// JSON-file-backed store of [`UserRecord`]s.
pub struct JsonUserStore {
    path: PathBuf,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    db_lock: StdMutex<()>,
}

impl JsonUserStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        JsonUserStore {
            path: path.into(),
            locks: StdMutex::new(HashMap::new()),
            db_lock: StdMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire this user's write lock. Hold the guard across the whole
    /// read-modify-write.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Load one user's record, if present.
    pub fn load_user(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let _file = self.db_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut db = self.read_db()?;
        Ok(db.users.remove(user_id))
    }

    /// Write one user's record back.
    ///
    /// Saving rewrites the whole document, so the read-modify-write is
    /// serialized store-wide: a concurrent save for a different user can't
    /// be dropped by a stale snapshot.
    pub fn save_user(&self, user_id: &str, record: &UserRecord) -> Result<(), StoreError> {
        let _file = self.db_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut db = self.read_db()?;
        db.users.insert(user_id.to_string(), record.clone());
        self.write_db(&db)
    }

    /// Load a user's record, creating and persisting the default record on
    /// first access.
    pub fn ensure_user(&self, user_id: &str) -> Result<UserRecord, StoreError> {
        let _file = self.db_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut db = self.read_db()?;
        if let Some(record) = db.users.get(user_id) {
            return Ok(record.clone());
        }

        let record = UserRecord::new_default();
        db.users.insert(user_id.to_string(), record.clone());
        self.write_db(&db)?;
        Ok(record)
    }

    /// All known user ids, sorted for deterministic batch order.
    pub fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        let _file = self.db_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let db = self.read_db()?;
        let mut ids: Vec<String> = db.users.into_keys().collect();
        ids.sort();
        Ok(ids)
    }

    // A missing file is an empty store; any other read failure surfaces.
    fn read_db(&self) -> Result<Database, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Database::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    // Write to a sibling temp file and rename it into place, so a concurrent
    // reader never observes a truncated document. Callers hold `db_lock`.
    fn write_db(&self, db: &Database) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(db)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn temp_store() -> (tempfile::TempDir, JsonUserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonUserStore::open(dir.path().join("database.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_empty_store() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load_user("u1").unwrap(), None);
        assert!(store.user_ids().unwrap().is_empty());
    }

    #[test]
    fn ensure_user_creates_and_persists_default_record() {
        let (_dir, store) = temp_store();
        let record = store.ensure_user("u1").unwrap();
        assert_eq!(record.lists.len(), 1);
        assert_eq!(record.active_list_id, "today");

        // A second ensure returns the stored record, not a fresh default.
        let again = store.ensure_user("u1").unwrap();
        assert_eq!(again, record);
        assert_eq!(store.user_ids().unwrap(), vec!["u1".to_string()]);
    }

    #[test]
    fn save_and_reload_round_trips_tasks() {
        let (_dir, store) = temp_store();
        let mut record = store.ensure_user("u1").unwrap();
        record.lists[0].tasks.push(Task::new("Write report"));
        store.save_user("u1", &record).unwrap();

        let loaded = store.load_user("u1").unwrap().unwrap();
        assert_eq!(loaded.lists[0].tasks[0].text, "Write report");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_users_neither_corrupt_nor_drop_each_other() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);

        const ROUNDS: usize = 200;
        let writers: Vec<_> = ["ala", "bartek"]
            .into_iter()
            .map(|user| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.ensure_user(user).unwrap();
                    for round in 0..ROUNDS {
                        let _guard = store.lock_user(user).await;
                        let mut record = store.load_user(user).unwrap().unwrap();
                        record.lists[0].tasks.push(Task::new(format!("{user}-{round}")));
                        store.save_user(user, &record).unwrap();
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.await.unwrap();
        }

        // Every write survived: nothing torn, nothing lost to a stale
        // whole-file snapshot from the other user's writer.
        for user in ["ala", "bartek"] {
            let record = store.load_user(user).unwrap().unwrap();
            assert_eq!(record.lists[0].tasks.len(), ROUNDS);
        }
    }

    #[tokio::test]
    async fn user_lock_serializes_writers() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);
        store.ensure_user("u1").unwrap();

        let guard = store.lock_user("u1").await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.lock_user("u1").await;
            })
        };

        // The contender can't finish while we hold the guard.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }
}
