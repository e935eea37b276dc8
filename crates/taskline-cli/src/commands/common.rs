use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use serde::Serialize;
use taskline_core::config::{self, SyncSettings};
use taskline_core::services::{TaskService, TaskStore};
use taskline_core::sync::{HttpRemoteAuthority, SyncEngine};
use taskline_core::{Task, TaskStatus};

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub last_updated: i64,
    pub relative_time: String,
    pub is_synced: bool,
}

pub async fn open_service(db_path: &Path) -> Result<TaskService, CliError> {
    let store = TaskStore::open_path(db_path).await?;
    Ok(TaskService::new(store))
}

/// Build a sync engine against the configured remote.
pub async fn open_engine(
    db_path: &Path,
    settings: &SyncSettings,
) -> Result<SyncEngine<HttpRemoteAuthority>, CliError> {
    let remote = remote_from_settings(settings)?;
    let store = TaskStore::open_path(db_path).await?;
    Ok(SyncEngine::new(store, remote))
}

pub fn remote_from_settings(settings: &SyncSettings) -> Result<HttpRemoteAuthority, CliError> {
    let url = settings.remote_url().ok_or(CliError::SyncNotConfigured)?;
    Ok(HttpRemoteAuthority::with_timeout(
        url,
        settings.request_timeout(),
    )?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    Ok(config::resolve_db_path(cli_db_path)?)
}

pub fn resolve_title(parts: &[String]) -> Result<String, CliError> {
    normalize_content(&parts.join(" ")).ok_or(CliError::EmptyTitle)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn short_id(task: &Task) -> String {
    task.id.as_str().chars().take(13).collect()
}

const fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::Completed => "[x]",
    }
}

const fn sync_marker(task: &Task) -> &'static str {
    if task.is_synced {
        ""
    } else {
        "*"
    }
}

pub fn format_task_lines(tasks: &[Task]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    tasks
        .iter()
        .map(|task| {
            let preview = title_preview(&task.title, 40);
            let relative_time = format_relative_time(task.last_updated, now_ms);
            format!(
                "{:<13}  {} {preview:<40}  {relative_time}{}",
                short_id(task),
                status_marker(task.status),
                sync_marker(task)
            )
        })
        .collect()
}

pub fn format_task_details(task: &Task) -> Vec<String> {
    let mut lines = vec![
        format!("ID:          {}", task.id),
        format!("Title:       {}", task.title),
        format!("Status:      {}", task.status),
        format!("Updated:     {}", format_timestamp(task.last_updated)),
        format!(
            "Sync:        {}",
            if task.is_synced { "synced" } else { "pending" }
        ),
    ];
    if !task.description.is_empty() {
        lines.push(String::new());
        lines.extend(task.description.lines().map(str::to_string));
    }
    lines
}

pub fn task_to_list_item(task: &Task) -> TaskListItem {
    let now_ms = Utc::now().timestamp_millis();
    TaskListItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        status: task.status,
        last_updated: task.last_updated,
        relative_time: format_relative_time(task.last_updated, now_ms),
        is_synced: task.is_synced,
    }
}

pub fn title_preview(title: &str, max_chars: usize) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map_or_else(|| timestamp_ms.to_string(), |time| time.to_rfc3339())
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
