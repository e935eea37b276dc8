//! Remote task authority contract.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Task, TaskId, TaskStatus};

/// A task as held by the remote authority.
///
/// Mirrors [`Task`] minus the local-only flags: deletion on the remote side
/// is absence from the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub last_updated: i64,
}

impl RemoteTask {
    /// Local record for this remote revision, already confirmed synced
    #[must_use]
    pub fn into_synced_task(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            last_updated: self.last_updated,
            is_synced: true,
            pending_delete: false,
        }
    }
}

impl From<&Task> for RemoteTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            last_updated: task.last_updated,
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Minimal REST-like contract of the remote task authority.
///
/// Calls are independent; the sync engine assumes nothing about ordering
/// across them and simply retries failed ones on a later pass.
pub trait RemoteAuthority: Send + Sync {
    fn create(&self, task: &RemoteTask) -> impl Future<Output = RemoteResult<()>> + Send;

    fn update(&self, task: &RemoteTask) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Deleting an id the remote does not hold succeeds.
    fn delete(&self, id: &TaskId) -> impl Future<Output = RemoteResult<()>> + Send;

    fn list_all(&self) -> impl Future<Output = RemoteResult<Vec<RemoteTask>>> + Send;
}
