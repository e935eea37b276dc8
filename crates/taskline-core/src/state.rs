//! Shared cross-client state types.

/// Coarse sync state reported to front ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// No pass has run yet
    Idle,
    Offline,
    Syncing,
    Synced,
    /// The last pass was aborted by a systemic failure
    Error,
}

impl SyncState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}
