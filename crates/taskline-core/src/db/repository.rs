//! Task repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::{Task, TaskId, TaskStatus};
use libsql::{params, Connection, Row, Rows};

const TASK_COLUMNS: &str =
    "id, title, description, status, last_updated, is_synced, pending_delete";

/// Trait for task storage operations (async)
#[allow(async_fn_in_trait)]
pub trait TaskRepository {
    /// Live tasks (not pending delete), newest first
    async fn list(&self) -> Result<Vec<Task>>;

    /// Get a live task by ID
    async fn get(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Tasks whose latest revision has not been confirmed remotely
    async fn list_unsynced(&self) -> Result<Vec<Task>>;

    /// Tasks awaiting remote confirmation of their deletion
    async fn list_pending_deletes(&self) -> Result<Vec<Task>>;

    /// Insert a task row as-is
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Overwrite content, timestamp and sync flag of an existing row
    async fn update(&self, task: &Task) -> Result<()>;

    /// Overwrite a live row with `task` only if the stored revision is older.
    ///
    /// Returns `false` when the row is missing, pending delete, or already at
    /// the same or a newer revision.
    async fn replace_if_older(&self, task: &Task) -> Result<bool>;

    /// Mark a task synced if it is still at `revision`.
    ///
    /// Returns `false` when the row changed (or vanished) since the revision
    /// was pushed, in which case it stays dirty.
    async fn mark_synced(&self, id: &TaskId, revision: i64) -> Result<bool>;

    /// Flag a live task for deletion and mark it dirty
    async fn mark_pending_delete(&self, id: &TaskId, now_ms: i64) -> Result<()>;

    /// Physically remove a row, returning whether it existed
    async fn delete_permanently(&self, id: &TaskId) -> Result<bool>;

    /// Remove every row, returning how many were removed
    async fn clear_all(&self) -> Result<u64>;

    /// Live task IDs starting with `prefix`, newest first
    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

/// libSQL implementation of `TaskRepository`
pub struct LibSqlTaskRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlTaskRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a task from a database row
    fn parse_task(row: &Row) -> Result<Task> {
        let id: String = row.get(0)?;
        let status: String = row.get(3)?;
        let status = status
            .parse::<TaskStatus>()
            .map_err(|error| Error::Database(format!("task {id}: {error}")))?;

        Ok(Task {
            id: TaskId::from(id.as_str()),
            title: row.get(1)?,
            description: row.get(2)?,
            status,
            last_updated: row.get(4)?,
            is_synced: row.get::<i64>(5)? != 0,
            pending_delete: row.get::<i64>(6)? != 0,
        })
    }

    async fn collect(mut rows: Rows) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(Self::parse_task(&row)?);
        }
        Ok(tasks)
    }

    async fn query_tasks(&self, filter: &str) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {filter}");
        let rows = self.conn.query(&sql, ()).await?;
        Self::collect(rows).await
    }
}

impl TaskRepository for LibSqlTaskRepository<'_> {
    async fn list(&self) -> Result<Vec<Task>> {
        self.query_tasks("pending_delete = 0 ORDER BY last_updated DESC")
            .await
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND pending_delete = 0");
        let mut rows = self.conn.query(&sql, params![id.as_str()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_task(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_unsynced(&self) -> Result<Vec<Task>> {
        self.query_tasks("is_synced = 0").await
    }

    async fn list_pending_deletes(&self) -> Result<Vec<Task>> {
        self.query_tasks("pending_delete = 1").await
    }

    async fn insert(&self, task: &Task) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO tasks (id, title, description, status, last_updated, is_synced, pending_delete)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    task.id.as_str(),
                    task.title.as_str(),
                    task.description.as_str(),
                    task.status.as_str(),
                    task.last_updated,
                    i64::from(task.is_synced),
                    i64::from(task.pending_delete)
                ],
            )
            .await?;
        Ok(())
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE tasks
                 SET title = ?, description = ?, status = ?, last_updated = ?, is_synced = ?
                 WHERE id = ?",
                params![
                    task.title.as_str(),
                    task.description.as_str(),
                    task.status.as_str(),
                    task.last_updated,
                    i64::from(task.is_synced),
                    task.id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(task.id.to_string()));
        }
        Ok(())
    }

    async fn replace_if_older(&self, task: &Task) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE tasks
                 SET title = ?, description = ?, status = ?, last_updated = ?, is_synced = ?
                 WHERE id = ? AND pending_delete = 0 AND last_updated < ?",
                params![
                    task.title.as_str(),
                    task.description.as_str(),
                    task.status.as_str(),
                    task.last_updated,
                    i64::from(task.is_synced),
                    task.id.as_str(),
                    task.last_updated
                ],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn mark_synced(&self, id: &TaskId, revision: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE tasks SET is_synced = 1 WHERE id = ? AND last_updated = ?",
                params![id.as_str(), revision],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn mark_pending_delete(&self, id: &TaskId, now_ms: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE tasks
                 SET pending_delete = 1, is_synced = 0, last_updated = MAX(?, last_updated + 1)
                 WHERE id = ? AND pending_delete = 0",
                params![now_ms, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_permanently(&self, id: &TaskId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?", params![id.as_str()])
            .await?;
        Ok(rows > 0)
    }

    async fn clear_all(&self) -> Result<u64> {
        Ok(self.conn.execute("DELETE FROM tasks", ()).await?)
    }

    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM tasks
                 WHERE pending_delete = 0 AND id LIKE ?
                 ORDER BY last_updated DESC
                 LIMIT ?",
                params![format!("{prefix}%"), limit as i64],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }
}
