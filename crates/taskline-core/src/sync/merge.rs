//! Last-write-wins decisions for the push and pull phases.
//!
//! Whole records are compared by `last_updated` only. Equal timestamps are a
//! tie: neither side overwrites the other.

use crate::models::Task;

use super::remote::RemoteTask;

/// Which revision of a record should survive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Local,
    Remote,
    Tie,
}

pub const fn last_write_wins(local_updated: i64, remote_updated: i64) -> Winner {
    if local_updated > remote_updated {
        Winner::Local
    } else if local_updated < remote_updated {
        Winner::Remote
    } else {
        Winner::Tie
    }
}

/// What the push phase does with one dirty local record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    /// Remote has no such id
    Create,
    /// Local is strictly newer
    Update,
    /// Remote is newer or equal; leave the record dirty
    Defer(Winner),
}

pub fn plan_push(local: &Task, remote: Option<&RemoteTask>) -> PushAction {
    let Some(remote) = remote else {
        return PushAction::Create;
    };
    match last_write_wins(local.last_updated, remote.last_updated) {
        Winner::Local => PushAction::Update,
        winner => PushAction::Defer(winner),
    }
}

/// What the pull phase does with one remote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullAction {
    /// New to this client
    Insert,
    /// Remote is strictly newer than the live local copy
    Overwrite,
    Keep,
}

/// `local` is the live local copy, if any; `pending_delete` says the id is
/// still awaiting remote delete confirmation locally.
pub fn plan_pull(local: Option<&Task>, pending_delete: bool, remote: &RemoteTask) -> PullAction {
    if pending_delete {
        return PullAction::Keep;
    }
    match local {
        None => PullAction::Insert,
        Some(local) => match last_write_wins(local.last_updated, remote.last_updated) {
            Winner::Remote => PullAction::Overwrite,
            Winner::Local | Winner::Tie => PullAction::Keep,
        },
    }
}
