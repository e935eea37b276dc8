//! In-memory remote authority for tests and demos.
//!
//! Holds the remote task set in a map and can inject latency and failures.
//! Failures are deterministic (by operation, by task id, or every Nth call)
//! so tests can reproduce flaky-network behaviour exactly.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::models::TaskId;

use super::remote::{RemoteAuthority, RemoteError, RemoteResult, RemoteTask};

/// Kind of call made against the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Create,
    Update,
    Delete,
    ListAll,
}

impl RemoteOp {
    /// Whether the call changes remote state
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::ListAll)
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ListAll => "list_all",
        };
        f.write_str(name)
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub op: RemoteOp,
    pub id: Option<TaskId>,
}

#[derive(Default)]
struct FailurePlan {
    ops: HashSet<RemoteOp>,
    ids: HashSet<TaskId>,
    every_nth: Option<u32>,
}

#[derive(Default)]
struct RemoteState {
    tasks: BTreeMap<TaskId, RemoteTask>,
    calls: Vec<RemoteCall>,
    failures: FailurePlan,
    latency: Duration,
}

impl RemoteState {
    /// Log the call, then decide whether it fails
    fn begin(&mut self, op: RemoteOp, id: Option<&TaskId>) -> RemoteResult<()> {
        self.calls.push(RemoteCall {
            op,
            id: id.cloned(),
        });

        let by_op = self.failures.ops.contains(&op);
        let by_id = id.is_some_and(|id| self.failures.ids.contains(id));
        let by_count = self.failures.every_nth.is_some_and(|n| {
            let count = u32::try_from(self.calls.len()).unwrap_or(u32::MAX);
            n > 0 && count % n == 0
        });

        if by_op || by_id || by_count {
            Err(RemoteError::Unavailable(format!("simulated network error on {op}")))
        } else {
            Ok(())
        }
    }
}

/// Shared handle to a simulated remote; clones observe the same state.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before it takes effect
    pub async fn set_latency(&self, latency: Duration) {
        self.state.lock().await.latency = latency;
    }

    /// Put tasks into the remote set without recording calls
    pub async fn seed(&self, tasks: impl IntoIterator<Item = RemoteTask>) {
        let mut state = self.state.lock().await;
        for task in tasks {
            state.tasks.insert(task.id.clone(), task);
        }
    }

    /// Simulate an edit made by another client
    pub async fn put_external(&self, task: RemoteTask) {
        self.seed([task]).await;
    }

    pub async fn get(&self, id: &TaskId) -> Option<RemoteTask> {
        self.state.lock().await.tasks.get(id).cloned()
    }

    /// Remote set ordered by id
    pub async fn snapshot(&self) -> Vec<RemoteTask> {
        self.state.lock().await.tasks.values().cloned().collect()
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls that change remote state
    pub async fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.op.is_mutation())
            .count()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Make every call of `op` fail
    pub async fn fail_operation(&self, op: RemoteOp) {
        self.state.lock().await.failures.ops.insert(op);
    }

    /// Make every per-task call on `id` fail
    pub async fn fail_task(&self, id: &TaskId) {
        self.state.lock().await.failures.ids.insert(id.clone());
    }

    /// Make every `n`th call (counted over the whole log) fail
    pub async fn fail_every_nth(&self, n: u32) {
        self.state.lock().await.failures.every_nth = Some(n);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures = FailurePlan::default();
    }

    /// Drop every remote task
    pub async fn clear(&self) {
        self.state.lock().await.tasks.clear();
    }

    async fn pause(&self) {
        let latency = self.state.lock().await.latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    async fn upsert(&self, op: RemoteOp, task: &RemoteTask) -> RemoteResult<()> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.begin(op, Some(&task.id))?;
        state.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }
}

impl RemoteAuthority for InMemoryRemote {
    async fn create(&self, task: &RemoteTask) -> RemoteResult<()> {
        self.upsert(RemoteOp::Create, task).await
    }

    async fn update(&self, task: &RemoteTask) -> RemoteResult<()> {
        self.upsert(RemoteOp::Update, task).await
    }

    async fn delete(&self, id: &TaskId) -> RemoteResult<()> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.begin(RemoteOp::Delete, Some(id))?;
        state.tasks.remove(id);
        Ok(())
    }

    async fn list_all(&self) -> RemoteResult<Vec<RemoteTask>> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.begin(RemoteOp::ListAll, None)?;
        Ok(state.tasks.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn remote_task(id: &str, last_updated: i64) -> RemoteTask {
        RemoteTask {
            id: TaskId::from(id),
            title: id.to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            last_updated,
        }
    }

    #[tokio::test]
    async fn records_calls_and_applies_mutations() {
        let remote = InMemoryRemote::new();

        remote.create(&remote_task("a", 1)).await.unwrap();
        remote.update(&remote_task("a", 2)).await.unwrap();
        remote.delete(&TaskId::from("missing")).await.unwrap();
        let listed = remote.list_all().await.unwrap();

        assert_eq!(listed, vec![remote_task("a", 2)]);
        assert_eq!(remote.mutation_count().await, 3);
        let ops = remote
            .calls()
            .await
            .into_iter()
            .map(|call| call.op)
            .collect::<Vec<_>>();
        assert_eq!(
            ops,
            vec![
                RemoteOp::Create,
                RemoteOp::Update,
                RemoteOp::Delete,
                RemoteOp::ListAll
            ]
        );
    }

    #[tokio::test]
    async fn injected_failures_leave_state_untouched() {
        let remote = InMemoryRemote::new();
        remote.seed([remote_task("a", 1)]).await;
        remote.fail_task(&TaskId::from("a")).await;

        assert!(remote.delete(&TaskId::from("a")).await.is_err());
        assert!(remote.get(&TaskId::from("a")).await.is_some());

        remote.fail_operation(RemoteOp::ListAll).await;
        assert!(remote.list_all().await.is_err());

        remote.clear_failures().await;
        assert!(remote.delete(&TaskId::from("a")).await.is_ok());
        assert!(remote.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn every_nth_call_fails() {
        let remote = InMemoryRemote::new();
        remote.fail_every_nth(2).await;

        assert!(remote.create(&remote_task("a", 1)).await.is_ok());
        assert!(remote.create(&remote_task("b", 1)).await.is_err());
        assert!(remote.create(&remote_task("c", 1)).await.is_ok());
        assert_eq!(remote.snapshot().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_calls() {
        let remote = InMemoryRemote::new();
        remote.set_latency(Duration::from_millis(100)).await;

        let started = tokio::time::Instant::now();
        remote.list_all().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
