use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use taskline_core::models::TaskPatch;
use taskline_core::services::{TaskService, TaskStore};
use taskline_core::sync::{
    ConnectivityMonitor, InMemoryRemote, RemoteCall, RemoteOp, RemoteTask, SkipReason, SyncEngine,
    SyncOutcome, SyncPhase, SyncReport,
};
use taskline_core::{Error, Task, TaskId, TaskStatus};

struct Harness {
    service: TaskService,
    remote: InMemoryRemote,
    engine: Arc<SyncEngine<InMemoryRemote>>,
}

async fn harness() -> Harness {
    let store = TaskStore::open_in_memory().await.unwrap();
    let remote = InMemoryRemote::new();
    let engine = Arc::new(SyncEngine::new(store.clone(), remote.clone()));
    Harness {
        service: TaskService::new(store),
        remote,
        engine,
    }
}

fn remote_task(id: &str, title: &str, last_updated: i64) -> RemoteTask {
    RemoteTask {
        id: TaskId::from(id),
        title: title.to_string(),
        description: String::new(),
        status: TaskStatus::Pending,
        last_updated,
    }
}

fn local_task(id: &str, title: &str, last_updated: i64, is_synced: bool) -> Task {
    Task {
        id: TaskId::from(id),
        title: title.to_string(),
        description: String::new(),
        status: TaskStatus::Pending,
        last_updated,
        is_synced,
        pending_delete: false,
    }
}

async fn completed(engine: &SyncEngine<InMemoryRemote>) -> SyncReport {
    match engine.sync_tasks().await.unwrap() {
        SyncOutcome::Completed(report) => report,
        SyncOutcome::Skipped(reason) => panic!("pass skipped: {reason:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_edits_reach_remote_after_reconnect() {
    let h = harness().await;
    h.engine.set_online(false);

    let task = h.service.create("Buy milk", "2 litres").await.unwrap();
    let outcome = h.engine.sync_tasks().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::Offline));
    assert!(h.remote.calls().await.is_empty());

    assert!(h.engine.set_online(true));
    let report = completed(&h.engine).await;
    assert_eq!(report.created, 1);

    let remote = h.remote.get(&task.id).await.unwrap();
    assert_eq!(remote.title, "Buy milk");
    assert_eq!(remote.last_updated, task.last_updated);
    assert!(h.service.get(&task.id).await.unwrap().unwrap().is_synced);
}

#[tokio::test(flavor = "multi_thread")]
async fn newer_local_edit_updates_remote() {
    let h = harness().await;
    let id = "00000000-0000-7000-8000-00000000000b";
    h.remote.seed([remote_task(id, "old", 150)]).await;
    h.service
        .store()
        .insert(&local_task(id, "new", 200, false))
        .await
        .unwrap();

    let report = completed(&h.engine).await;
    assert_eq!(report.updated, 1);
    assert_eq!(report.pulled_updated, 0);

    let remote = h.remote.get(&TaskId::from(id)).await.unwrap();
    assert_eq!(remote.title, "new");
    assert_eq!(remote.last_updated, 200);
    let local = h.service.get(&TaskId::from(id)).await.unwrap().unwrap();
    assert!(local.is_synced);
}

#[tokio::test(flavor = "multi_thread")]
async fn newer_remote_edit_overwrites_synced_local() {
    let h = harness().await;
    let id = "00000000-0000-7000-8000-00000000000c";
    h.service
        .store()
        .insert(&local_task(id, "mine", 100, true))
        .await
        .unwrap();
    h.remote.seed([remote_task(id, "theirs", 300)]).await;

    let report = completed(&h.engine).await;
    assert_eq!(report.pulled_updated, 1);
    assert_eq!(h.remote.mutation_count().await, 0);

    let local = h.service.get(&TaskId::from(id)).await.unwrap().unwrap();
    assert_eq!(local.title, "theirs");
    assert_eq!(local.last_updated, 300);
    assert!(local.is_synced);
}

#[tokio::test(flavor = "multi_thread")]
async fn newer_remote_wins_over_older_dirty_local() {
    let h = harness().await;
    let id = "00000000-0000-7000-8000-0000000000cd";
    h.service
        .store()
        .insert(&local_task(id, "stale edit", 100, false))
        .await
        .unwrap();
    h.remote.seed([remote_task(id, "fresh", 300)]).await;

    let report = completed(&h.engine).await;
    assert_eq!(report.deferred, 1);
    assert_eq!(report.pulled_updated, 1);

    let local = h.service.get(&TaskId::from(id)).await.unwrap().unwrap();
    assert_eq!(local.title, "fresh");
    assert!(local.is_synced);
}

#[tokio::test(flavor = "multi_thread")]
async fn equal_timestamps_leave_both_sides_alone() {
    let h = harness().await;
    let id = "00000000-0000-7000-8000-00000000000d";
    h.service
        .store()
        .insert(&local_task(id, "local", 500, false))
        .await
        .unwrap();
    h.remote.seed([remote_task(id, "remote", 500)]).await;

    let report = completed(&h.engine).await;
    assert_eq!(report.deferred, 1);
    assert_eq!(report.local_writes(), 0);
    assert_eq!(h.remote.mutation_count().await, 0);

    let local = h.service.get(&TaskId::from(id)).await.unwrap().unwrap();
    assert_eq!(local.title, "local");
    assert!(!local.is_synced);
    assert_eq!(h.remote.get(&TaskId::from(id)).await.unwrap().title, "remote");
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_only_tasks_are_inserted_as_synced() {
    let h = harness().await;
    h.remote
        .seed([
            remote_task("00000000-0000-7000-8000-000000000001", "one", 10),
            remote_task("00000000-0000-7000-8000-000000000002", "two", 20),
        ])
        .await;

    let report = completed(&h.engine).await;
    assert_eq!(report.pulled_inserted, 2);

    let tasks = h.service.list().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "two");
    assert!(tasks.iter().all(|task| task.is_synced));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_delete_is_kept_hidden_and_retried() {
    let h = harness().await;
    let id = TaskId::from("00000000-0000-7000-8000-00000000000e");
    h.service
        .store()
        .insert(&local_task(id.as_str(), "doomed", 100, true))
        .await
        .unwrap();
    h.remote.seed([remote_task(id.as_str(), "doomed", 100)]).await;

    h.service.request_delete(&id).await.unwrap();
    h.remote.fail_operation(RemoteOp::Delete).await;

    let report = completed(&h.engine).await;
    assert_eq!(report.deleted, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].phase, SyncPhase::Delete);
    assert_eq!(report.failures[0].task_id, id);

    // still pending locally and not resurrected by the pull
    assert!(h.service.get(&id).await.unwrap().is_none());
    assert_eq!(h.engine.store().get_pending_deletes().await.unwrap().len(), 1);

    h.remote.clear_failures().await;
    let report = completed(&h.engine).await;
    assert_eq!(report.deleted, 1);
    assert!(h.remote.get(&id).await.is_none());
    assert!(h.engine.store().get_pending_deletes().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn per_record_push_failure_does_not_abort_the_pass() {
    let h = harness().await;
    let broken = h.service.create("broken", "").await.unwrap();
    let fine = h.service.create("fine", "").await.unwrap();
    h.remote.fail_task(&broken.id).await;

    let report = completed(&h.engine).await;
    assert_eq!(report.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].phase, SyncPhase::Push);

    assert!(!h.service.get(&broken.id).await.unwrap().unwrap().is_synced);
    assert!(h.service.get(&fine.id).await.unwrap().unwrap().is_synced);

    h.remote.clear_failures().await;
    let report = completed(&h.engine).await;
    assert_eq!(report.created, 1);
    assert!(report.is_clean());
}

#[tokio::test(flavor = "multi_thread")]
async fn second_pass_without_changes_makes_no_remote_writes() {
    let h = harness().await;
    let task = h.service.create("once", "").await.unwrap();
    h.service.toggle_status(&task.id).await.unwrap();
    completed(&h.engine).await;

    h.remote.clear_calls().await;
    let report = completed(&h.engine).await;

    assert_eq!(report, SyncReport::default());
    assert_eq!(h.remote.mutation_count().await, 0);
    let remote = h.remote.get(&task.id).await.unwrap();
    assert_eq!(remote.status, TaskStatus::Completed);
}

type Fields = (TaskId, String, TaskStatus, i64);

fn local_fields(tasks: Vec<Task>) -> Vec<Fields> {
    let mut fields: Vec<Fields> = tasks
        .into_iter()
        .map(|task| (task.id, task.title, task.status, task.last_updated))
        .collect();
    fields.sort_by(|left, right| left.0.cmp(&right.0));
    fields
}

fn remote_fields(tasks: Vec<RemoteTask>) -> Vec<Fields> {
    let mut fields: Vec<Fields> = tasks
        .into_iter()
        .map(|task| (task.id, task.title, task.status, task.last_updated))
        .collect();
    fields.sort_by(|left, right| left.0.cmp(&right.0));
    fields
}

#[tokio::test(flavor = "multi_thread")]
async fn mixed_local_mutations_converge_in_one_pass() {
    let h = harness().await;
    let edited = h.service.create("draft", "").await.unwrap();
    let toggled = h.service.create("chore", "").await.unwrap();
    let removed = h.service.create("obsolete", "").await.unwrap();
    completed(&h.engine).await;

    let external = remote_task("00000000-0000-7000-8000-0000000000ee", "from elsewhere", 100);
    h.remote.seed([external.clone()]).await;

    let fresh = h.service.create("fresh", "").await.unwrap();
    h.service
        .update(
            &edited.id,
            TaskPatch {
                title: Some("final".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    h.service.toggle_status(&toggled.id).await.unwrap();
    h.service.request_delete(&removed.id).await.unwrap();

    let report = completed(&h.engine).await;
    assert!(report.is_clean());
    assert_eq!(report.deleted, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 2);
    assert_eq!(report.pulled_inserted, 1);

    let store = h.engine.store();
    assert!(store.get_unsynced().await.unwrap().is_empty());
    assert!(store.get_pending_deletes().await.unwrap().is_empty());

    let local = local_fields(h.service.list().await.unwrap());
    assert_eq!(local, remote_fields(h.remote.snapshot().await));
    assert_eq!(local.len(), 4);
    assert!(local.iter().any(|(id, ..)| *id == fresh.id));
    assert!(local.iter().any(|(id, ..)| *id == external.id));
    assert!(!local.iter().any(|(id, ..)| *id == removed.id));

    h.remote.clear_calls().await;
    let report = completed(&h.engine).await;
    assert_eq!(report, SyncReport::default());
    assert_eq!(h.remote.mutation_count().await, 0);
    assert_eq!(
        h.remote.calls().await,
        vec![RemoteCall {
            op: RemoteOp::ListAll,
            id: None,
        }]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_calls_run_a_single_pass() {
    let h = harness().await;
    h.service.create("slow", "").await.unwrap();
    h.remote.set_latency(Duration::from_millis(50)).await;

    let (first, second) = tokio::join!(h.engine.sync_tasks(), h.engine.sync_tasks());
    let outcomes = [first.unwrap(), second.unwrap()];

    let skipped = outcomes
        .iter()
        .filter(|outcome| **outcome == SyncOutcome::Skipped(SkipReason::AlreadySyncing))
        .count();
    assert_eq!(skipped, 1);
    assert_eq!(h.remote.mutation_count().await, 1);
    assert!(!h.engine.is_syncing());
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_failure_surfaces_and_releases_the_guard() {
    let h = harness().await;
    h.remote.fail_operation(RemoteOp::ListAll).await;

    let error = h.engine.sync_tasks().await.unwrap_err();
    assert!(matches!(error, Error::Sync(_)));
    assert!(!h.engine.is_syncing());

    h.remote.clear_failures().await;
    assert!(matches!(
        h.engine.sync_tasks().await.unwrap(),
        SyncOutcome::Completed(_)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn edit_during_push_stays_dirty() {
    let h = harness().await;
    let task = h.service.create("v1", "").await.unwrap();
    h.remote.set_latency(Duration::from_millis(200)).await;

    let engine = Arc::clone(&h.engine);
    let pass = tokio::spawn(async move { engine.sync_tasks().await });

    // list_all takes ~200ms, the create call runs from ~200ms to ~400ms
    tokio::time::sleep(Duration::from_millis(300)).await;
    let edited = h
        .service
        .update(
            &task.id,
            TaskPatch {
                title: Some("v2".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    pass.await.unwrap().unwrap();

    let local = h.service.get(&task.id).await.unwrap().unwrap();
    assert_eq!(local.title, "v2");
    assert!(!local.is_synced);
    assert_eq!(h.remote.get(&task.id).await.unwrap().title, "v1");

    h.remote.set_latency(Duration::ZERO).await;
    let report = completed(&h.engine).await;
    assert_eq!(report.updated, 1);
    let remote = h.remote.get(&task.id).await.unwrap();
    assert_eq!(remote.title, "v2");
    assert_eq!(remote.last_updated, edited.last_updated);
}

#[tokio::test(flavor = "multi_thread")]
async fn reconnect_triggers_one_automatic_pass() {
    let h = harness().await;
    let monitor = ConnectivityMonitor::new(false);
    let watcher = h.engine.watch_connectivity(&monitor);
    assert!(!h.engine.is_online());

    let task = h.service.create("queued offline", "").await.unwrap();
    monitor.set_online(true);

    let mut synced = false;
    for _ in 0..100 {
        if h.remote.get(&task.id).await.is_some() && !h.engine.is_syncing() {
            synced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(synced, "auto-sync did not run after reconnect");
    assert!(h.engine.is_online());
    assert_eq!(h.remote.mutation_count().await, 1);

    // staying online does not trigger further passes
    h.remote.clear_calls().await;
    monitor.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.remote.calls().await.is_empty());

    watcher.abort();
}
