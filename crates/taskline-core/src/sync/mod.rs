//! Offline-first synchronization with a remote task authority.

mod connectivity;
mod engine;
mod http;
mod memory;
mod merge;
mod remote;

pub use connectivity::{poll_reachability, ConnectivityMonitor};
pub use engine::{RecordFailure, SkipReason, SyncEngine, SyncOutcome, SyncPhase, SyncReport};
pub use http::HttpRemoteAuthority;
pub use memory::{InMemoryRemote, RemoteCall, RemoteOp};
pub use merge::{last_write_wins, plan_pull, plan_push, PullAction, PushAction, Winner};
pub use remote::{RemoteAuthority, RemoteError, RemoteResult, RemoteTask};
