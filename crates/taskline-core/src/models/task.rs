//! Task model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::now_millis;

/// A unique identifier for a task.
///
/// Locally created tasks get a UUID v7 (time-sortable). Tasks discovered on
/// the remote authority keep whatever id the remote assigned, so the id is
/// stored as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new unique task ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("task id cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Completion status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    /// Stored/wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
        }
    }

    /// The opposite status
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A task record in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable after creation
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Timestamp of the latest mutation (Unix ms), used for last-write-wins
    pub last_updated: i64,
    /// Whether the remote copy is known to match this exact revision
    pub is_synced: bool,
    /// Deletion requested locally but not yet confirmed remotely
    pub pending_delete: bool,
}

impl Task {
    /// Create a new unsynced task stamped with the current time
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            last_updated: now_millis(),
            is_synced: false,
            pending_delete: false,
        }
    }

    /// Mark the task dirty after a local mutation.
    ///
    /// `last_updated` never moves backwards and always advances, even when two
    /// edits land within the same millisecond or the wall clock steps back.
    pub fn touch(&mut self, now_ms: i64) {
        self.last_updated = now_ms.max(self.last_updated.saturating_add(1));
        self.is_synced = false;
    }

    /// Apply a partial edit; fields absent from the patch are kept
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Partial update of a task's user-editable fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Whether the patch changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_unique() {
        let id1 = TaskId::new();
        let id2 = TaskId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_task_id_parse_rejects_blank() {
        assert!("   ".parse::<TaskId>().is_err());
        let parsed: TaskId = " initial-task-1 ".parse().unwrap();
        assert_eq!(parsed.as_str(), "initial-task-1");
    }

    #[test]
    fn test_task_new_is_dirty() {
        let task = Task::new("Buy milk", "");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_synced);
        assert!(!task.pending_delete);
        assert!(task.last_updated > 0);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut task = Task::new("Title", "");
        task.last_updated = 1_000;
        task.is_synced = true;

        task.touch(900);
        assert_eq!(task.last_updated, 1_001);
        assert!(!task.is_synced);

        task.touch(5_000);
        assert_eq!(task.last_updated, 5_000);
    }

    #[test]
    fn test_status_toggle_and_parse() {
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
        assert_eq!("completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert_eq!("Pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_apply_patch_keeps_absent_fields() {
        let mut task = Task::new("Title", "Body");
        task.apply(TaskPatch {
            description: Some("New body".to_string()),
            ..TaskPatch::default()
        });
        assert_eq!(task.title, "Title");
        assert_eq!(task.description, "New body");
        assert!(TaskPatch::default().is_empty());
    }
}
