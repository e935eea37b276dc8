use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] taskline_core::Error),
    #[error(transparent)]
    Remote(#[from] taskline_core::sync::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No task title provided")]
    EmptyTitle,
    #[error("Nothing to change; pass --title, --description or --status")]
    EmptyEdit,
    #[error(
        "Sync is not configured. Run `taskline config set-remote <url>` or set TASKLINE_REMOTE_URL."
    )]
    SyncNotConfigured,
}
