//! Data models for Taskline

mod task;

pub use task::{Task, TaskId, TaskPatch, TaskStatus};
