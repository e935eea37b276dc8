use std::path::Path;
use std::sync::Arc;

use taskline_core::config::SyncSettings;
use taskline_core::sync::{poll_reachability, ConnectivityMonitor};

use crate::commands::common::open_engine;
use crate::commands::sync::format_outcome_lines;
use crate::error::CliError;

/// Probe the remote until Ctrl-C, syncing on every reconnect.
pub async fn run_watch(settings: &SyncSettings, db_path: &Path) -> Result<(), CliError> {
    let engine = Arc::new(open_engine(db_path, settings).await?);
    let remote = engine.remote().clone();

    let monitor = ConnectivityMonitor::new(remote.probe().await);
    let watcher = engine.watch_connectivity(&monitor);
    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        remote.base_url(),
        settings.probe_interval().as_secs()
    );

    if monitor.is_online() {
        match engine.sync_tasks().await {
            Ok(outcome) => {
                for line in format_outcome_lines(&outcome) {
                    println!("{line}");
                }
            }
            Err(error) => eprintln!("Sync failed: {error}"),
        }
    } else {
        println!("Remote unreachable; waiting for connectivity");
    }

    let poller = poll_reachability(&monitor, settings.probe_interval(), || {
        let remote = remote.clone();
        async move { remote.probe().await }
    });

    tokio::select! {
        () = poller => {}
        signal = tokio::signal::ctrl_c() => signal?,
    }

    watcher.abort();
    println!("Stopped ({})", engine.sync_state().label());
    if let Some(report) = engine.last_report() {
        println!(
            "Last pass: {} remote write(s), {} local write(s), {} failure(s)",
            report.remote_writes(),
            report.local_writes(),
            report.failures.len()
        );
    }
    Ok(())
}
