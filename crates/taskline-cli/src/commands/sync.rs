use std::path::Path;

use serde::Serialize;
use taskline_core::config::SyncSettings;
use taskline_core::sync::{RemoteAuthority, SkipReason, SyncEngine, SyncOutcome, SyncReport};

use crate::commands::common::open_engine;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncReportItem {
    pub status: &'static str,
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
    pub deferred: usize,
    pub pulled_inserted: usize,
    pub pulled_updated: usize,
    pub failures: Vec<SyncFailureItem>,
}

#[derive(Debug, Serialize)]
pub struct SyncFailureItem {
    pub task_id: String,
    pub phase: String,
    pub message: String,
}

pub async fn run_sync(
    force_offline: bool,
    as_json: bool,
    settings: &SyncSettings,
    db_path: &Path,
) -> Result<(), CliError> {
    let engine = open_engine(db_path, settings).await?;
    let online = !force_offline && engine.remote().probe().await;
    engine.set_online(online);

    let outcome = sync_once(&engine).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome_to_item(&outcome))?);
    } else {
        for line in format_outcome_lines(&outcome) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn sync_once<R: RemoteAuthority>(engine: &SyncEngine<R>) -> Result<SyncOutcome, CliError> {
    Ok(engine.sync_tasks().await?)
}

pub fn outcome_to_item(outcome: &SyncOutcome) -> SyncReportItem {
    let (status, report) = match outcome {
        SyncOutcome::Completed(report) => ("completed", report.clone()),
        SyncOutcome::Skipped(SkipReason::Offline) => ("offline", SyncReport::default()),
        SyncOutcome::Skipped(SkipReason::AlreadySyncing) => {
            ("already_syncing", SyncReport::default())
        }
    };

    SyncReportItem {
        status,
        deleted: report.deleted,
        created: report.created,
        updated: report.updated,
        deferred: report.deferred,
        pulled_inserted: report.pulled_inserted,
        pulled_updated: report.pulled_updated,
        failures: report
            .failures
            .iter()
            .map(|failure| SyncFailureItem {
                task_id: failure.task_id.to_string(),
                phase: failure.phase.to_string(),
                message: failure.message.clone(),
            })
            .collect(),
    }
}

pub fn format_outcome_lines(outcome: &SyncOutcome) -> Vec<String> {
    let report = match outcome {
        SyncOutcome::Skipped(SkipReason::Offline) => {
            return vec!["Offline - sync deferred; local changes are kept.".to_string()];
        }
        SyncOutcome::Skipped(SkipReason::AlreadySyncing) => {
            return vec!["A sync pass is already running.".to_string()];
        }
        SyncOutcome::Completed(report) => report,
    };

    let mut lines = vec![format!(
        "Sync completed: {} deleted, {} created, {} updated, {} pulled, {} refreshed",
        report.deleted, report.created, report.updated, report.pulled_inserted, report.pulled_updated
    )];
    if report.deferred > 0 {
        lines.push(format!(
            "{} local change(s) kept back; the remote copy is newer or equal",
            report.deferred
        ));
    }
    for failure in &report.failures {
        lines.push(format!(
            "  failed {:<6} {}: {}",
            failure.phase, failure.task_id, failure.message
        ));
    }
    lines
}
