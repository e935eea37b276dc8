//! Shared task store wrapper used by the task service and the sync engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlTaskRepository, TaskRepository};
use crate::models::{Task, TaskId};
use crate::Result;

/// Thread-safe handle to the local task table.
///
/// Every method takes the lock for exactly one repository operation, so
/// concurrent callers are serialized per operation and nobody holds the
/// store across a whole sync pass.
#[derive(Clone)]
pub struct TaskStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl TaskStore {
    /// Open a store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening task store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, when the store is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Live tasks newest-first.
    pub async fn get_all(&self) -> Result<Vec<Task>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection()).list().await
    }

    /// Fetch a live task by id.
    pub async fn get_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection()).get(id).await
    }

    /// Tasks not yet confirmed by the remote authority.
    pub async fn get_unsynced(&self) -> Result<Vec<Task>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .list_unsynced()
            .await
    }

    /// Tasks awaiting remote delete confirmation.
    pub async fn get_pending_deletes(&self) -> Result<Vec<Task>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .list_pending_deletes()
            .await
    }

    pub async fn insert(&self, task: &Task) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .insert(task)
            .await
    }

    pub async fn update(&self, task: &Task) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .update(task)
            .await
    }

    /// Apply a newer revision; see [`TaskRepository::replace_if_older`].
    pub async fn replace_if_older(&self, task: &Task) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .replace_if_older(task)
            .await
    }

    /// Mark `id` synced at `revision`; see [`TaskRepository::mark_synced`].
    pub async fn mark_synced(&self, id: &TaskId, revision: i64) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .mark_synced(id, revision)
            .await
    }

    pub async fn mark_pending_delete(&self, id: &TaskId, now_ms: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .mark_pending_delete(id, now_ms)
            .await
    }

    pub async fn delete_permanently(&self, id: &TaskId) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .delete_permanently(id)
            .await
    }

    pub async fn clear_all(&self) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection()).clear_all().await
    }

    /// Live task ids matching a prefix, used for short-id lookups.
    pub async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        LibSqlTaskRepository::new(db.connection())
            .list_ids_by_prefix(prefix, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_insert_and_list_roundtrip() {
        let store = TaskStore::open_in_memory().await.unwrap();

        let task = Task::new("hello core", "");
        store.insert(&task).await.unwrap();

        let tasks = store.get_all().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "hello core");
        assert!(store.path().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("dir").join("tasks.db");

        let store = TaskStore::open_path(&path).await.unwrap();
        assert!(path.parent().unwrap().exists());
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clones_share_the_same_table() {
        let store = TaskStore::open_in_memory().await.unwrap();
        let other = store.clone();

        other.insert(&Task::new("shared", "")).await.unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
