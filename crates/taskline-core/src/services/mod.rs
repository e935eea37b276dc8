//! Shared service handles used by front ends and the sync engine.

mod task_service;
mod task_store;

pub use task_service::TaskService;
pub use task_store::TaskStore;
