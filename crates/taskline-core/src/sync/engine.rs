//! Offline sync engine.
//!
//! A reconciliation pass runs three phases in order, each finishing before
//! the next starts:
//!
//! 1. push pending deletes to the remote and drop confirmed rows locally,
//! 2. push dirty local records (create, or update when local is newer),
//! 3. pull the remote set and insert or overwrite older local copies.
//!
//! Per-record remote failures are logged and recorded in the [`SyncReport`];
//! the record keeps its pre-call state and is retried on the next pass. Only
//! a failure to fetch the remote set in phase 3 aborts the pass.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::models::{Task, TaskId};
use crate::services::TaskStore;
use crate::state::SyncState;

use super::connectivity::ConnectivityMonitor;
use super::merge::{plan_pull, plan_push, PullAction, PushAction, Winner};
use super::remote::{RemoteAuthority, RemoteError, RemoteTask};

/// Phase of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Delete,
    Push,
    Pull,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Delete => "delete",
            Self::Push => "push",
            Self::Pull => "pull",
        };
        f.write_str(name)
    }
}

/// A per-record remote failure that was skipped over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub task_id: TaskId,
    pub phase: SyncPhase,
    pub message: String,
}

/// What one completed pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Remote deletes confirmed and rows removed locally
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
    /// Dirty records left alone because the remote copy was newer or equal
    pub deferred: usize,
    pub pulled_inserted: usize,
    pub pulled_updated: usize,
    pub failures: Vec<RecordFailure>,
}

impl SyncReport {
    /// Number of remote writes that succeeded
    pub const fn remote_writes(&self) -> usize {
        self.deleted + self.created + self.updated
    }

    /// Number of local rows changed by the pull phase
    pub const fn local_writes(&self) -> usize {
        self.pulled_inserted + self.pulled_updated
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, task_id: &TaskId, phase: SyncPhase, error: &RemoteError) {
        tracing::warn!("Failed to {phase} task {task_id}: {error}");
        self.failures.push(RecordFailure {
            task_id: task_id.clone(),
            phase,
            message: error.to_string(),
        });
    }
}

/// Why a `sync_tasks` call did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySyncing,
    Offline,
}

/// Result of a `sync_tasks` call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Skipped(SkipReason),
}

impl SyncOutcome {
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
enum LastPass {
    Never,
    Completed(SyncReport),
    Failed(String),
}

/// Clears the syncing flag on every exit path
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Reconciles the local [`TaskStore`] with a [`RemoteAuthority`].
pub struct SyncEngine<R> {
    store: TaskStore,
    remote: R,
    is_syncing: AtomicBool,
    is_online: AtomicBool,
    last_pass: Mutex<LastPass>,
}

impl<R: RemoteAuthority> SyncEngine<R> {
    /// New engine that assumes it starts online.
    pub fn new(store: TaskStore, remote: R) -> Self {
        Self {
            store,
            remote,
            is_syncing: AtomicBool::new(false),
            is_online: AtomicBool::new(true),
            last_pass: Mutex::new(LastPass::Never),
        }
    }

    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::Acquire)
    }

    pub fn is_online(&self) -> bool {
        self.is_online.load(Ordering::Acquire)
    }

    /// Update the cached connectivity flag.
    ///
    /// Returns `true` only for an offline to online transition.
    pub fn set_online(&self, online: bool) -> bool {
        let was_online = self.is_online.swap(online, Ordering::AcqRel);
        !was_online && online
    }

    /// Report of the most recent completed pass
    pub fn last_report(&self) -> Option<SyncReport> {
        match &*self.last_pass.lock().unwrap_or_else(PoisonError::into_inner) {
            LastPass::Completed(report) => Some(report.clone()),
            LastPass::Never | LastPass::Failed(_) => None,
        }
    }

    /// Message of the most recent pass, if that pass failed
    pub fn last_error(&self) -> Option<String> {
        match &*self.last_pass.lock().unwrap_or_else(PoisonError::into_inner) {
            LastPass::Failed(message) => Some(message.clone()),
            LastPass::Never | LastPass::Completed(_) => None,
        }
    }

    pub fn sync_state(&self) -> SyncState {
        if self.is_syncing() {
            return SyncState::Syncing;
        }
        if !self.is_online() {
            return SyncState::Offline;
        }
        match &*self.last_pass.lock().unwrap_or_else(PoisonError::into_inner) {
            LastPass::Never => SyncState::Idle,
            LastPass::Completed(_) => SyncState::Synced,
            LastPass::Failed(_) => SyncState::Error,
        }
    }

    fn remember(&self, pass: LastPass) {
        *self.last_pass.lock().unwrap_or_else(PoisonError::into_inner) = pass;
    }

    /// Run one reconciliation pass.
    ///
    /// A call made while another pass is running, or while offline, returns
    /// [`SyncOutcome::Skipped`] without touching the remote.
    pub async fn sync_tasks(&self) -> Result<SyncOutcome> {
        let Some(_guard) = SyncGuard::acquire(&self.is_syncing) else {
            tracing::debug!("Sync already in progress, skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::AlreadySyncing));
        };

        if !self.is_online() {
            tracing::info!("Offline - sync deferred");
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }

        tracing::info!("Starting sync pass");
        let mut report = SyncReport::default();
        match self.run_pass(&mut report).await {
            Ok(()) => {
                tracing::info!(
                    deleted = report.deleted,
                    created = report.created,
                    updated = report.updated,
                    deferred = report.deferred,
                    pulled_inserted = report.pulled_inserted,
                    pulled_updated = report.pulled_updated,
                    failures = report.failures.len(),
                    "Sync completed"
                );
                self.remember(LastPass::Completed(report.clone()));
                Ok(SyncOutcome::Completed(report))
            }
            Err(error) => {
                tracing::error!("Sync error: {error}");
                self.remember(LastPass::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    async fn run_pass(&self, report: &mut SyncReport) -> Result<()> {
        self.propagate_deletes(report).await?;
        self.push_local_changes(report).await?;
        self.pull_remote_changes(report).await
    }

    async fn propagate_deletes(&self, report: &mut SyncReport) -> Result<()> {
        let pending = self.store.get_pending_deletes().await?;

        for task in pending {
            match self.remote.delete(&task.id).await {
                Ok(()) => {
                    self.store.delete_permanently(&task.id).await?;
                    report.deleted += 1;
                }
                Err(error) => report.record_failure(&task.id, SyncPhase::Delete, &error),
            }
        }
        Ok(())
    }

    async fn push_local_changes(&self, report: &mut SyncReport) -> Result<()> {
        let dirty = self
            .store
            .get_unsynced()
            .await?
            .into_iter()
            .filter(|task| !task.pending_delete)
            .collect::<Vec<_>>();
        if dirty.is_empty() {
            return Ok(());
        }

        // One snapshot answers "does the remote hold this id" for every record
        let remote_index = match self.remote.list_all().await {
            Ok(tasks) => tasks
                .into_iter()
                .map(|task| (task.id.clone(), task))
                .collect::<HashMap<_, _>>(),
            Err(error) => {
                for task in &dirty {
                    report.record_failure(&task.id, SyncPhase::Push, &error);
                }
                return Ok(());
            }
        };

        for task in dirty {
            self.push_one(&task, remote_index.get(&task.id), report)
                .await?;
        }
        Ok(())
    }

    async fn push_one(
        &self,
        task: &Task,
        remote: Option<&RemoteTask>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let payload = RemoteTask::from(task);
        let pushed = match plan_push(task, remote) {
            PushAction::Create => self.remote.create(&payload).await,
            PushAction::Update => self.remote.update(&payload).await,
            PushAction::Defer(winner) => {
                if winner == Winner::Remote {
                    tracing::debug!("Remote copy of {} is newer; pull will apply it", task.id);
                } else {
                    tracing::debug!("Task {} has equal timestamps on both sides", task.id);
                }
                report.deferred += 1;
                return Ok(());
            }
        };

        if let Err(error) = pushed {
            report.record_failure(&task.id, SyncPhase::Push, &error);
            return Ok(());
        }

        if remote.is_some() {
            report.updated += 1;
        } else {
            report.created += 1;
        }

        if !self.store.mark_synced(&task.id, task.last_updated).await? {
            tracing::debug!("Task {} changed during push; leaving it dirty", task.id);
        }
        Ok(())
    }

    async fn pull_remote_changes(&self, report: &mut SyncReport) -> Result<()> {
        let remote_tasks = self
            .remote
            .list_all()
            .await
            .map_err(|error| Error::Sync(format!("failed to fetch remote tasks: {error}")))?;
        if remote_tasks.is_empty() {
            return Ok(());
        }

        let local = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect::<HashMap<_, _>>();
        let pending_deletes = self
            .store
            .get_pending_deletes()
            .await?
            .into_iter()
            .map(|task| task.id)
            .collect::<HashSet<_>>();

        for remote in remote_tasks {
            let action = plan_pull(
                local.get(&remote.id),
                pending_deletes.contains(&remote.id),
                &remote,
            );
            match action {
                PullAction::Insert => {
                    tracing::info!("Adding missing task from remote: {}", remote.id);
                    self.store.insert(&remote.into_synced_task()).await?;
                    report.pulled_inserted += 1;
                }
                PullAction::Overwrite => {
                    tracing::info!("Updating local task with newer remote version: {}", remote.id);
                    if self.store.replace_if_older(&remote.into_synced_task()).await? {
                        report.pulled_updated += 1;
                    }
                }
                PullAction::Keep => {}
            }
        }
        Ok(())
    }
}

impl<R: RemoteAuthority + 'static> SyncEngine<R> {
    /// Follow `monitor` and sync once on every offline to online transition.
    ///
    /// Each reconnect spawns a single pass; overlapping reconnects are
    /// absorbed by the re-entrancy guard.
    pub fn watch_connectivity(self: &Arc<Self>, monitor: &ConnectivityMonitor) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut rx = monitor.subscribe();
        engine.set_online(*rx.borrow_and_update());

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if !engine.set_online(online) {
                    continue;
                }

                tracing::info!("Network restored - triggering sync");
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    if let Err(error) = engine.sync_tasks().await {
                        tracing::error!("Auto-sync failed: {error}");
                    }
                });
            }
        })
    }
}
