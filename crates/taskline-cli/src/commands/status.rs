use std::path::Path;

use taskline_core::config::SyncSettings;
use taskline_core::services::TaskStore;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub live: usize,
    pub unsynced: usize,
    pub pending_deletes: usize,
}

impl StatusCounts {
    pub const fn is_up_to_date(&self) -> bool {
        self.unsynced == 0
    }
}

pub async fn collect_status(store: &TaskStore) -> Result<StatusCounts, CliError> {
    let live = store.get_all().await?.len();
    let pending_deletes = store.get_pending_deletes().await?.len();
    // get_unsynced includes pending deletes
    let unsynced = store.get_unsynced().await?.len();

    Ok(StatusCounts {
        live,
        unsynced,
        pending_deletes,
    })
}

pub async fn run_status(settings: &SyncSettings, db_path: &Path) -> Result<(), CliError> {
    let store = TaskStore::open_path(db_path).await?;
    let counts = collect_status(&store).await?;

    println!("Database:        {}", db_path.display());
    println!(
        "Remote:          {}",
        settings.remote_url().unwrap_or("(not configured)")
    );
    println!("Tasks:           {}", counts.live);
    println!("Unsynced:        {}", counts.unsynced);
    println!("Pending deletes: {}", counts.pending_deletes);
    if counts.is_up_to_date() {
        println!("State:           up to date");
    } else {
        println!("State:           {} change(s) waiting to sync", counts.unsynced);
    }
    Ok(())
}
