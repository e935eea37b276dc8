//! Local task mutations.
//!
//! Every operation here touches only the local store: it never waits on the
//! network, stamps a fresh `last_updated` and leaves the task unsynced for
//! the sync engine to pick up.

use crate::error::{Error, Result};
use crate::models::{Task, TaskId, TaskPatch};
use crate::services::TaskStore;
use crate::util::now_millis;

/// CRUD façade used by front ends.
#[derive(Clone)]
pub struct TaskService {
    store: TaskStore,
}

impl TaskService {
    pub const fn new(store: TaskStore) -> Self {
        Self { store }
    }

    /// Underlying store handle
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Create a new pending task.
    pub async fn create(&self, title: &str, description: &str) -> Result<Task> {
        let title = normalize_title(title)?;
        let task = Task::new(title, description.trim());
        self.store.insert(&task).await?;
        tracing::debug!("Created task {}", task.id);
        Ok(task)
    }

    /// Apply a partial edit to a live task.
    pub async fn update(&self, id: &TaskId, mut patch: TaskPatch) -> Result<Task> {
        if let Some(title) = patch.title.take() {
            patch.title = Some(normalize_title(&title)?);
        }
        if let Some(description) = patch.description.take() {
            patch.description = Some(description.trim().to_string());
        }

        let mut task = self.require(id).await?;
        task.apply(patch);
        task.touch(now_millis());
        self.store.update(&task).await?;
        Ok(task)
    }

    /// Flip a task between pending and completed.
    pub async fn toggle_status(&self, id: &TaskId) -> Result<Task> {
        let mut task = self.require(id).await?;
        task.status = task.status.toggled();
        task.touch(now_millis());
        self.store.update(&task).await?;
        Ok(task)
    }

    /// Soft-delete a task; the row stays until the remote confirms.
    pub async fn request_delete(&self, id: &TaskId) -> Result<()> {
        self.store.mark_pending_delete(id, now_millis()).await?;
        tracing::debug!("Task {id} marked for deletion");
        Ok(())
    }

    /// Live tasks newest-first.
    pub async fn list(&self) -> Result<Vec<Task>> {
        self.store.get_all().await
    }

    pub async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        self.store.get_by_id(id).await
    }

    /// Resolve a full id or a unique id prefix to a live task.
    pub async fn resolve(&self, query: &str) -> Result<Task> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("task id cannot be empty".into()));
        }

        if let Some(task) = self.store.get_by_id(&TaskId::from(query)).await? {
            return Ok(task);
        }

        let matches = self.store.list_ids_by_prefix(query, 3).await?;
        match matches.as_slice() {
            [] => Err(Error::NotFound(query.to_string())),
            [only] => self.require(&TaskId::from(only.as_str())).await,
            _ => {
                let options = matches
                    .iter()
                    .map(|id| id.chars().take(13).collect::<String>())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(Error::InvalidInput(format!(
                    "ID prefix '{query}' is ambiguous; matches: {options}"
                )))
            }
        }
    }

    async fn require(&self, id: &TaskId) -> Result<Task> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

fn normalize_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("task title cannot be empty".into()));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use pretty_assertions::assert_eq;

    async fn setup() -> TaskService {
        TaskService::new(TaskStore::open_in_memory().await.unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_trims_and_marks_dirty() {
        let service = setup().await;

        let task = service.create("  Write report ", " draft ").await.unwrap();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "draft");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_synced);

        let unsynced = service.store().get_unsynced().await.unwrap();
        assert_eq!(unsynced, vec![task]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_rejects_blank_title() {
        let service = setup().await;
        let err = service.create("   ", "body").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_applies_patch_and_advances_timestamp() {
        let service = setup().await;
        let task = service.create("Title", "Body").await.unwrap();
        service
            .store()
            .mark_synced(&task.id, task.last_updated)
            .await
            .unwrap();

        let updated = service
            .update(
                &task.id,
                TaskPatch {
                    title: Some("New title".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.description, "Body");
        assert!(updated.last_updated > task.last_updated);
        assert!(!updated.is_synced);

        let stored = service.get(&task.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn toggle_flips_status() {
        let service = setup().await;
        let task = service.create("Title", "").await.unwrap();

        let toggled = service.toggle_status(&task.id).await.unwrap();
        assert_eq!(toggled.status, TaskStatus::Completed);
        let toggled = service.toggle_status(&task.id).await.unwrap();
        assert_eq!(toggled.status, TaskStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mutations_on_missing_task_are_not_found() {
        let service = setup().await;
        let ghost = TaskId::from("ghost");

        assert!(matches!(
            service.update(&ghost, TaskPatch::default()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.toggle_status(&ghost).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.request_delete(&ghost).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_delete_hides_task_but_keeps_row() {
        let service = setup().await;
        let task = service.create("Title", "").await.unwrap();

        service.request_delete(&task.id).await.unwrap();

        assert!(service.get(&task.id).await.unwrap().is_none());
        assert!(service.list().await.unwrap().is_empty());
        let pending = service.store().get_pending_deletes().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].is_synced);

        // Deleting twice targets a task that is no longer live
        assert!(matches!(
            service.request_delete(&task.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.toggle_status(&task.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_accepts_unique_prefix() {
        let service = setup().await;
        let task = service.create("Title", "").await.unwrap();

        let prefix = &task.id.as_str()[..8];
        let resolved = service.resolve(prefix).await.unwrap();
        assert_eq!(resolved.id, task.id);

        assert!(matches!(
            service.resolve("zzzz").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(service.resolve(" ").await, Err(Error::InvalidInput(_))));
    }
}
