//! taskline-core - Core library for Taskline
//!
//! This crate contains the task model, the local libSQL store, the task
//! service used by front ends, and the offline sync engine that reconciles
//! local edits with a remote task authority.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Task, TaskId, TaskStatus};
